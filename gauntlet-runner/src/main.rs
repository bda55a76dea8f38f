//! Dry run driver for the evaluation arena. It feeds a fake training
//! history of ever stronger checkpoints through the real control channels
//! and records which of them the arena promotes. Useful to exercise the
//! whole promotion pipeline without a GPU anywhere near it.

#[macro_use]
extern crate log;

mod config;
mod dry_run;

use std::fs::File;
use std::io::Write;
use std::time::Duration;

use gauntlet::{ArenaConfig, ArenaController};
use tokio::sync::mpsc;

use crate::dry_run::{CoinFlipGameplay, DryRunModel};

fn init_logger(log_file: &str) {
    use simplelog::*;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file).unwrap(),
        ),
    ])
    .unwrap();

    debug!("Logger successfully initialized");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config();
    init_logger(&config.log_file);

    let (to_arena, inbound) = mpsc::channel(8);
    let (outbound, mut promotions) = mpsc::channel(8);
    let (report_sink, mut reports) = mpsc::channel(8);

    let arena_config = ArenaConfig {
        num_games_per_round: config.num_games_per_round,
        num_workers: config.num_workers,
        promotion_threshold: config.promotion_threshold,
        match_timeout: Duration::from_secs(config.match_timeout_secs),
    };
    let controller = ArenaController::new(
        arena_config,
        DryRunModel::initial(),
        DryRunModel::initial(),
        CoinFlipGameplay { tie_chance: 0.1 },
        inbound,
        outbound,
    )?
    .with_report_sink(report_sink);

    let arena = tokio::spawn(controller.run());

    // Pretend the optimizer finishes a checkpoint every round, each one a
    // little stronger than the last.
    let feeder = tokio::spawn({
        let checkpoint_dir = config.checkpoint_dir.clone();
        let num_rounds = config.num_rounds;
        async move {
            for round in 1..=num_rounds {
                let checkpoint = format!("{}/ckpt-{}", checkpoint_dir, round * 100);
                if to_arena.send(checkpoint).await.is_err() {
                    break;
                }
            }
        }
    });

    let promotion_log = tokio::spawn(async move {
        while let Some(promoted) = promotions.recv().await {
            info!("Self play should now switch to {promoted}.");
        }
    });

    // The report channel closes once the arena is done with every round.
    let mut report_file = File::create(&config.report_file)?;
    while let Some(report) = reports.recv().await {
        let line = serde_json::to_string(&report)?;
        writeln!(report_file, "{line}")?;
    }

    feeder.await?;
    arena.await??;
    promotion_log.await?;

    info!("Dry run finished, reports are in {}.", config.report_file);
    Ok(())
}
