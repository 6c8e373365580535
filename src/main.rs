//! Wave Survival entry point
//!
//! Headless runner: plays the game with the autopilot at the fixed timestep
//! and prints the defeat screen, or authors tiered power-up assets.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use wave_survival::consts::{MAX_SUBSTEPS, SIM_DT};
use wave_survival::powerups::{Catalog, PowerUpKind, TierValues, write_tiered_assets};
use wave_survival::records::RunRecord;
use wave_survival::sim::{GameEvent, GameState, TickInput, tick};
use wave_survival::stats::LoseScreen;
use wave_survival::{Records, Result, Tuning};

/// Frame length of the simulated display loop
const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_TICK_LIMIT: u64 = 50 * 60 * 30;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless wave survival runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// RNG seed; defaults to the current time
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many simulation ticks
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    ticks: Option<u64>,
    /// Tuning JSON file
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    /// Power-up catalog JSON file
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,
    /// Best-runs file to update
    #[arg(long, value_name = "FILE")]
    records: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct PowerUpArgs {
    /// Damage, IncreaseHealth or MaxHealthBoost
    kind: PowerUpKind,
    /// Directory the tier assets are written to
    out_dir: PathBuf,
    /// Minor, major and ultimate values
    #[arg(num_args = 3, value_names = ["MINOR", "MAJOR", "ULTIMATE"])]
    values: Option<Vec<i32>>,
    /// Directory holding tier icons
    #[arg(long, value_name = "DIR")]
    icons: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a run with the autopilot and print the defeat screen
    Run(RunArgs),
    /// Write minor, major and ultimate assets for one power-up kind
    #[command(name = "powerups")]
    PowerUps(PowerUpArgs),
}

impl PowerUpArgs {
    fn tier_values(&self) -> TierValues {
        match self.values.as_deref() {
            Some(&[minor, major, ultimate]) => TierValues { minor, major, ultimate },
            _ => TierValues::default(),
        }
    }
}

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn run(args: RunArgs) -> Result<()> {
    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::standard(),
    };
    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default_set(),
    };
    let seed = args.seed.unwrap_or_else(time_seed);
    let limit = args.ticks.unwrap_or(DEFAULT_TICK_LIMIT);

    log::info!("Starting run with seed {}", seed);
    let mut state = GameState::new(seed, tuning, catalog);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    // Fixed-step loop driven by simulated display frames
    let mut accumulator = 0.0;
    let mut ticks = 0u64;
    'frames: while !state.is_game_over() && ticks < limit {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut state, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
            ticks += 1;

            for event in &state.events {
                match event {
                    GameEvent::WaveStarted { wave, enemies } => {
                        log::info!("Wave {} started with {} enemies", wave, enemies);
                    }
                    GameEvent::WaveCleared { wave } => log::info!("Wave {} cleared", wave),
                    GameEvent::PowerUpApplied { name } => log::info!("Picked {}", name),
                    _ => {}
                }
            }
            if state.is_game_over() || ticks >= limit {
                break 'frames;
            }
        }
    }

    let summary = match state.summary {
        Some(summary) => summary,
        None => {
            log::info!("Tick limit reached after {} ticks", ticks);
            state.stats.end(state.elapsed)
        }
    };

    for line in LoseScreen::from_summary(&summary).lines() {
        println!("{}", line);
    }

    if let Some(path) = &args.records {
        let mut records = Records::load(path)?;
        match records.add(RunRecord::from_summary(&summary, seed)) {
            Some(rank) => {
                println!("New record! Rank #{}", rank);
                records.save(path)?;
            }
            None => log::info!("Run did not make the records"),
        }
    }
    Ok(())
}

fn author_power_ups(args: PowerUpArgs) -> Result<()> {
    let written = write_tiered_assets(&args.out_dir, args.kind, args.tier_values(), args.icons.as_ref())?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.cmd {
        Command::Run(args) => run(args),
        Command::PowerUps(args) => author_power_ups(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> std::result::Result<Command, clap::Error> {
        let argv = std::iter::once("wave-survival").chain(line.split_whitespace());
        Cli::try_parse_from(argv).map(|cli| cli.cmd)
    }

    #[test]
    fn test_parse_run_flags() {
        let Ok(Command::Run(run)) = parse("run --seed 42 --ticks 100 --records r.json") else {
            panic!("run should parse");
        };
        assert_eq!(run.seed, Some(42));
        assert_eq!(run.ticks, Some(100));
        assert_eq!(run.records, Some(PathBuf::from("r.json")));
        assert!(run.tuning.is_none());
    }

    #[test]
    fn test_parse_powerups() {
        let Ok(Command::PowerUps(p)) = parse("powerups DamagePowerUp out 2 4 8 --icons art") else {
            panic!("powerups should parse");
        };
        assert_eq!(p.kind, PowerUpKind::Damage);
        assert_eq!(p.tier_values(), TierValues { minor: 2, major: 4, ultimate: 8 });
        assert_eq!(p.icons, Some(PathBuf::from("art")));
    }

    #[test]
    fn test_powerups_default_values() {
        let Ok(Command::PowerUps(p)) = parse("powerups MaxHealthBoost out") else {
            panic!("powerups should parse");
        };
        assert_eq!(p.tier_values(), TierValues::default());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("run --seed x").is_err());
        assert!(parse("run --ticks 0").is_err());
        assert!(parse("powerups Speed out").is_err());
        assert!(parse("powerups Damage out 1 2").is_err());
        assert!(parse("fly").is_err());
    }
}
