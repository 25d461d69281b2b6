//! Legionfall headless runner
//!
//! Drives a session with scripted input and reports scheduler scaling. The
//! windowed client feeds the same `Session` with real input and draws
//! `engine().instances()`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use legionfall::sim::InputState;
use legionfall::{ConfigError, Session, Settings};

#[derive(Debug, Parser)]
#[command(name = "legionfall", about = "Headless swarm simulation benchmark")]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enemy count (overrides settings)
    #[arg(long)]
    enemies: Option<usize>,

    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Fixed frame delta (seconds)
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// RNG seed (overrides settings)
    #[arg(long)]
    seed: Option<u64>,

    /// Worker thread count (overrides settings)
    #[arg(long)]
    workers: Option<usize>,

    /// Start with the parallel path disabled
    #[arg(long)]
    sequential: bool,

    /// Start with the synthetic workload enabled
    #[arg(long)]
    heavy: bool,

    /// Start in peaceful mode
    #[arg(long)]
    peaceful: bool,

    /// Run parallel and sequential back to back and compare timings
    #[arg(long)]
    compare: bool,
}

fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(enemies) = args.enemies {
        settings.initial_enemies = enemies;
        settings.max_enemies = settings.max_enemies.max(enemies);
        settings.min_enemies = settings.min_enemies.min(enemies);
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.workers.is_some() {
        settings.workers = args.workers;
    }
    settings.parallel &= !args.sequential;
    settings.heavy_work |= args.heavy;
    settings.combat &= !args.peaceful;
    settings.validate()?;
    Ok(settings)
}

/// Hero walks a square loop and attacks periodically
fn scripted_input(frame: u32) -> InputState {
    let leg = (frame / 90) % 4;
    InputState {
        move_right: leg == 0,
        move_up: leg == 1,
        move_left: leg == 2,
        move_down: leg == 3,
        attack: frame % 45 == 0,
        ..Default::default()
    }
}

struct RunSummary {
    mean_update_ms: f64,
    parallel_frames: u32,
}

fn run(settings: Settings, frames: u32, dt: f32) -> (Session, RunSummary) {
    let mut session = Session::new(settings);
    let report_every = (1.0 / dt).round().max(1.0) as u32;

    let mut total_ms = 0.0;
    let mut parallel_frames = 0;
    for frame in 0..frames {
        session.frame(dt, &scripted_input(frame));

        let stats = session.stats();
        total_ms += stats.update_time_ms;
        if stats.parallel_used {
            parallel_frames += 1;
        }
        if frame % report_every == 0 {
            log::info!(
                "frame {:>5} | update {:.3} ms | alive {}/{} | kills {} | wave {} | hp {:.1} | parallel {}",
                frame,
                stats.update_time_ms,
                stats.alive_count,
                stats.enemy_count,
                stats.kills,
                stats.wave,
                stats.hero_health,
                stats.parallel_used,
            );
        }
    }

    let summary = RunSummary {
        mean_update_ms: total_ms / f64::from(frames.max(1)),
        parallel_frames,
    };
    (session, summary)
}

fn comparison_report(parallel: &RunSummary, sequential: &RunSummary) -> String {
    format!(
        "parallel {:.3} ms/frame ({} frames on pool) | sequential {:.3} ms/frame | speedup {:.2}x",
        parallel.mean_update_ms,
        parallel.parallel_frames,
        sequential.mean_update_ms,
        sequential.mean_update_ms / parallel.mean_update_ms.max(f64::EPSILON),
    )
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Legionfall starting: {} enemies, {} frames at dt {:.4}",
        settings.initial_enemies,
        args.frames,
        args.dt
    );

    if args.compare {
        let parallel = Settings {
            parallel: true,
            ..settings.clone()
        };
        let sequential = Settings {
            parallel: false,
            ..settings
        };
        let (_, par) = run(parallel, args.frames, args.dt);
        let (_, seq) = run(sequential, args.frames, args.dt);
        println!("{}", comparison_report(&par, &seq));
        return ExitCode::SUCCESS;
    }

    let (session, summary) = run(settings, args.frames, args.dt);
    log::info!(
        "Mean enemy update {:.3} ms ({} of {} frames on pool)",
        summary.mean_update_ms,
        summary.parallel_frames,
        args.frames
    );
    match serde_json::to_string_pretty(session.stats()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Failed to serialize stats: {err}"),
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_report_lists_both_runs() {
        let parallel = RunSummary {
            mean_update_ms: 0.5,
            parallel_frames: 30,
        };
        let sequential = RunSummary {
            mean_update_ms: 1.5,
            parallel_frames: 0,
        };
        let report = comparison_report(&parallel, &sequential);
        assert!(report.contains("parallel 0.500 ms/frame (30 frames on pool)"));
        assert!(report.contains("sequential 1.500 ms/frame"));
        assert!(report.ends_with("speedup 3.00x"));
    }

    #[test]
    fn test_compare_run_produces_timings() {
        let settings = Settings {
            initial_enemies: 200,
            min_enemies: 100,
            ..Settings::default()
        };
        let (session, summary) = run(settings, 5, 1.0 / 60.0);
        assert_eq!(session.stats().frame, 5);
        assert!(summary.mean_update_ms >= 0.0);
        assert!(!comparison_report(&summary, &summary).is_empty());
    }
}
