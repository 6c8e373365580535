//! Weighted card draws and the between-wave card screen

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{PowerUp, PowerUpTier};
use crate::sim::weapons::{WeaponKind, WeaponSlot};
use crate::tuning::TierWeights;

/// Draw one power-up, favouring common tiers.
///
/// Each tier contributes `ceil(len * weight * 100)` random members to a
/// lottery list; the pick is uniform over that list. If every tier weighs
/// zero the pick is uniform over the whole pool.
pub fn weighted_pick<'a, R: Rng>(pool: &'a [PowerUp], weights: &TierWeights, rng: &mut R) -> Option<&'a PowerUp> {
    if pool.is_empty() {
        return None;
    }

    let mut lottery: Vec<&PowerUp> = Vec::new();
    for tier in PowerUpTier::ALL {
        let members: Vec<&PowerUp> = pool.iter().filter(|p| p.tier == tier).collect();
        if members.is_empty() {
            continue;
        }
        let tickets = (members.len() as f32 * weights.weight(tier) * 100.0).ceil().max(0.0) as usize;
        for _ in 0..tickets {
            lottery.push(members[rng.random_range(0..members.len())]);
        }
    }

    if lottery.is_empty() {
        return Some(&pool[rng.random_range(0..pool.len())]);
    }
    Some(lottery[rng.random_range(0..lottery.len())])
}

/// Draw up to `count` cards (duplicates allowed)
pub fn draw_cards<R: Rng>(pool: &[PowerUp], count: usize, weights: &TierWeights, rng: &mut R) -> Vec<PowerUp> {
    let count = count.min(pool.len());
    let cards: Vec<PowerUp> = (0..count)
        .filter_map(|_| weighted_pick(pool, weights, rng).cloned())
        .collect();
    for card in &cards {
        log::debug!("Selected power-up: {} (Tier: {})", card.name, card.tier.as_str());
    }
    cards
}

/// What the card screen is showing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CardScreenMode {
    /// Power-up cards to choose from
    Cards(Vec<PowerUp>),
    /// One card per held weapon; picking one overwrites that slot
    ReplaceWeapon {
        incoming: WeaponSlot,
        held: Vec<WeaponKind>,
    },
}

/// A resolved pick
#[derive(Debug, Clone, PartialEq)]
pub enum CardChoice {
    PowerUp(PowerUp),
    ReplaceSlot { index: usize, slot: WeaponSlot },
}

/// Modal card screen shown between waves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardScreen {
    pub mode: CardScreenMode,
    /// Unscaled time before which picks are ignored
    pub input_blocked_until: f32,
}

impl CardScreen {
    pub fn cards(cards: Vec<PowerUp>, now: f32, input_block: f32) -> Self {
        Self {
            mode: CardScreenMode::Cards(cards),
            input_blocked_until: now + input_block,
        }
    }

    pub fn replace_weapon(incoming: WeaponSlot, held: Vec<WeaponKind>, now: f32, input_block: f32) -> Self {
        log::debug!("Weapon replace dialog for {}", incoming.kind.as_str());
        Self {
            mode: CardScreenMode::ReplaceWeapon { incoming, held },
            input_blocked_until: now + input_block,
        }
    }

    pub fn can_select(&self, now: f32) -> bool {
        now >= self.input_blocked_until
    }

    pub fn len(&self) -> usize {
        match &self.mode {
            CardScreenMode::Cards(cards) => cards.len(),
            CardScreenMode::ReplaceWeapon { held, .. } => held.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (title, description) for each card, in order
    pub fn card_texts(&self) -> Vec<(String, String)> {
        match &self.mode {
            CardScreenMode::Cards(cards) => cards
                .iter()
                .map(|c| (c.name.clone(), c.description.clone()))
                .collect(),
            CardScreenMode::ReplaceWeapon { incoming, held } => held
                .iter()
                .map(|kind| {
                    (
                        kind.as_str().to_string(),
                        format!("Replace with {}", incoming.kind.as_str()),
                    )
                })
                .collect(),
        }
    }

    /// Resolve a pick. Ignored while input is blocked or out of range.
    pub fn choose(&self, index: usize, now: f32) -> Option<CardChoice> {
        if !self.can_select(now) {
            log::debug!("Card pick ignored: input blocked");
            return None;
        }
        match &self.mode {
            CardScreenMode::Cards(cards) => cards.get(index).cloned().map(CardChoice::PowerUp),
            CardScreenMode::ReplaceWeapon { incoming, held } => (index < held.len()).then(|| CardChoice::ReplaceSlot {
                index,
                slot: incoming.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerups::PowerUpEffect;
    use crate::sim::weapons::WeaponStats;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn card(name: &str, tier: PowerUpTier) -> PowerUp {
        PowerUp::new(name, "", tier, PowerUpEffect::Damage { increase: 1 })
    }

    #[test]
    fn test_empty_pool_draws_nothing() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(weighted_pick(&[], &TierWeights::default(), &mut rng).is_none());
        assert!(draw_cards(&[], 3, &TierWeights::default(), &mut rng).is_empty());
    }

    #[test]
    fn test_draw_count_capped_by_pool() {
        let mut rng = Pcg32::seed_from_u64(1);
        let pool = [card("a", PowerUpTier::Minor), card("b", PowerUpTier::Major)];
        assert_eq!(draw_cards(&pool, 3, &TierWeights::default(), &mut rng).len(), 2);
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let mut rng = Pcg32::seed_from_u64(1);
        let weights = TierWeights { minor: 0.0, major: 0.0, ultimate: 0.0 };
        let pool = [card("a", PowerUpTier::Minor), card("b", PowerUpTier::Ultimate)];
        let mut seen = [false; 2];
        for _ in 0..100 {
            let p = weighted_pick(&pool, &weights, &mut rng).unwrap();
            seen[usize::from(p.name == "b")] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_minor_dominates() {
        let mut rng = Pcg32::seed_from_u64(42);
        let pool = [card("minor", PowerUpTier::Minor), card("ultimate", PowerUpTier::Ultimate)];
        let minors = (0..2000)
            .filter(|_| weighted_pick(&pool, &TierWeights::default(), &mut rng).unwrap().tier == PowerUpTier::Minor)
            .count();
        // 70 tickets vs 5 tickets
        assert!(minors > 1700, "minors = {}", minors);
    }

    #[test]
    fn test_input_block() {
        let screen = CardScreen::cards(vec![card("a", PowerUpTier::Minor)], 10.0, 1.0);
        assert!(screen.choose(0, 10.5).is_none());
        assert!(matches!(screen.choose(0, 11.0), Some(CardChoice::PowerUp(_))));
        assert!(screen.choose(3, 11.0).is_none());
    }

    #[test]
    fn test_replace_dialog_choices() {
        let incoming = WeaponSlot::full(WeaponKind::Laser, Some(WeaponStats::laser()), 100, 300);
        let screen = CardScreen::replace_weapon(incoming, vec![WeaponKind::Pistol, WeaponKind::Shotgun], 0.0, 1.0);
        assert_eq!(screen.len(), 2);
        assert_eq!(screen.card_texts()[1], ("Shotgun".to_string(), "Replace with Laser".to_string()));
        match screen.choose(1, 2.0) {
            Some(CardChoice::ReplaceSlot { index, slot }) => {
                assert_eq!(index, 1);
                assert_eq!(slot.kind, WeaponKind::Laser);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(screen.choose(2, 2.0).is_none());
    }
}
