//! Overlap and ray queries for circular bodies
//!
//! Every body in the arena is a circle: the player, enemies, bullets,
//! grenades, obstacles, smoke clouds and attack areas. Fast movers are swept
//! as segments so they cannot tunnel through thin targets in one step.

use glam::Vec2;

use crate::tuning::Obstacle;

/// Result of a ray query against a circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray to the entry point (0 if the origin is inside)
    pub distance: f32,
    /// Entry point
    pub point: Vec2,
}

/// True if two circles touch or overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Cast a ray against a circle
///
/// `dir` must be normalized. Returns the entry distance if it lies within
/// `max_dist`. A ray starting inside the circle hits at distance 0.
pub fn ray_circle(origin: Vec2, dir: Vec2, max_dist: f32, center: Vec2, radius: f32) -> Option<RayHit> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;

    // Origin outside and pointing away
    if c > 0.0 && b > 0.0 {
        return None;
    }

    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }

    let distance = (-b - disc.sqrt()).max(0.0);
    if distance > max_dist {
        return None;
    }

    Some(RayHit {
        distance,
        point: origin + dir * distance,
    })
}

/// Sweep a circle of `radius` from `start` to `end` against a circle target.
///
/// Returns the fraction of the sweep (0..=1) at first contact.
pub fn sweep_circle(start: Vec2, end: Vec2, radius: f32, center: Vec2, target_radius: f32) -> Option<f32> {
    let delta = end - start;
    let len = delta.length();
    let combined = radius + target_radius;

    if len <= f32::EPSILON {
        return circles_overlap(start, radius, center, target_radius).then_some(0.0);
    }

    ray_circle(start, delta / len, len, center, combined).map(|hit| hit.distance / len)
}

/// Keep a circle inside the axis-aligned arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, radius: f32, half_extents: Vec2) -> Vec2 {
    let limit = (half_extents - Vec2::splat(radius)).max(Vec2::ZERO);
    pos.clamp(-limit, limit)
}

/// True if a circle at `pos` is pressed against an arena wall
pub fn touches_arena_wall(pos: Vec2, radius: f32, half_extents: Vec2) -> bool {
    let limit = half_extents - Vec2::splat(radius);
    pos.x.abs() >= limit.x || pos.y.abs() >= limit.y
}

/// Push a circle out of an obstacle it overlaps
pub fn push_out_of_obstacle(pos: Vec2, radius: f32, obstacle: &Obstacle) -> Vec2 {
    let offset = pos - obstacle.pos;
    let min_dist = radius + obstacle.radius;
    let dist_sq = offset.length_squared();

    if dist_sq >= min_dist * min_dist {
        return pos;
    }

    let dir = if dist_sq > f32::EPSILON {
        offset / dist_sq.sqrt()
    } else {
        Vec2::Y
    };
    obstacle.pos + dir * min_dist
}

/// Sum of unit vectors pointing from each neighbour toward `pos`
///
/// Neighbours exactly on top of `pos` contribute nothing.
pub fn repulsion<I>(pos: Vec2, neighbours: I) -> Vec2
where
    I: IntoIterator<Item = Vec2>,
{
    neighbours
        .into_iter()
        .filter_map(|other| {
            let away = pos - other;
            let dist = away.length();
            (dist > 0.0).then(|| away / dist)
        })
        .sum()
}
