//! The arena controller. It owns both model handles, listens for challenger
//! checkpoints from the training loop and runs one evaluation round per
//! checkpoint: reload the challenger, dispatch the scheduled matches
//! through the admission pool, wait on the completion barrier, decide and
//! possibly promote. Rounds are strictly sequential, only the matches
//! inside a round run concurrently.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;

use crate::{
    admission::AdmissionController,
    backends::Gameplay,
    round::{RoundContext, RoundCounters},
    schedule::challenger_colors,
    shared_model::{ModelName, SharedModel},
    types::{GameOutcome, MatchOutcome, PlayerColor},
    ArenaError,
};

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Matches played per evaluation round.
    pub num_games_per_round: u32,
    /// Upper bound on concurrently running matches.
    pub num_workers: usize,
    /// Share of decisive games the challenger must strictly exceed.
    pub promotion_threshold: f64,
    /// A match running longer than this is aborted so a stuck game cannot
    /// hold up the round forever.
    pub match_timeout: Duration,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            num_games_per_round: 40,
            num_workers: 4,
            promotion_threshold: 0.55,
            match_timeout: Duration::from_secs(600),
        }
    }
}

/// Summary of one finished evaluation round, mostly for logging and
/// monitoring. The training loop itself only ever sees the promotion
/// channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub checkpoint: String,
    pub counters: RoundCounters,
    pub win_rate: f64,
    pub promote: bool,
}

pub struct ArenaController<G: Gameplay> {
    config: ArenaConfig,
    challenger: SharedModel<G::Model>,
    best: SharedModel<G::Model>,
    game: Arc<G>,
    admission: AdmissionController,
    inbound: Receiver<String>,
    outbound: Sender<String>,
    reports: Option<Sender<RoundReport>>,
    shutdown: CancellationToken,
}

impl<G> ArenaController<G>
where
    G: Gameplay + 'static,
    G::Model: 'static,
{
    /// Wires up an arena. The two model backends and the gameplay are the
    /// injected collaborators; `inbound` delivers challenger checkpoint ids
    /// from the training loop, `outbound` carries promoted checkpoint ids
    /// to whoever wants them (usually the self play workers).
    pub fn new(
        config: ArenaConfig,
        challenger: G::Model,
        best: G::Model,
        game: G,
        inbound: Receiver<String>,
        outbound: Sender<String>,
    ) -> Result<Self, ArenaError> {
        if config.num_workers == 0 {
            return Err(ArenaError::Config(
                "num_workers must be at least 1".to_owned(),
            ));
        }
        Ok(ArenaController {
            admission: AdmissionController::new(config.num_workers),
            challenger: SharedModel::new(ModelName::Challenger, challenger),
            best: SharedModel::new(ModelName::Best, best),
            game: Arc::new(game),
            config,
            inbound,
            outbound,
            reports: None,
            shutdown: CancellationToken::new(),
        })
    }

    /// Additionally describe every finished round on this channel, promoted
    /// or not.
    pub fn with_report_sink(mut self, reports: Sender<RoundReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Cancelling this token tears the arena down: outstanding matches
    /// abort, their slots and read locks are released by their drop guards,
    /// and [`ArenaController::run`] returns.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs evaluation rounds until the inbound channel closes or the
    /// shutdown token fires.
    pub async fn run(mut self) -> Result<(), ArenaError> {
        info!(
            "The arena is waiting for challenger checkpoints ({} games per round, {} workers).",
            self.config.num_games_per_round, self.config.num_workers
        );

        loop {
            let checkpoint = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                msg = self.inbound.recv() => match msg {
                    Some(checkpoint) => checkpoint,
                    None => break,
                },
            };

            // Loading. A bad checkpoint only costs this one round, the
            // previous challenger weights stay valid.
            if let Err(e) = self.challenger.reload(&checkpoint).await {
                warn!("Dropping this evaluation round: {e}");
                continue;
            }

            let counters = match self.play_round().await {
                Ok(counters) => counters,
                Err(ArenaError::ShutDown) => break,
                Err(e) => return Err(e),
            };

            // Deciding.
            let promote = counters.promotes_at(self.config.promotion_threshold);
            info!(
                "Challenger {} won {} of {} decisive games ({} played): win rate {:.3}, {}.",
                checkpoint,
                counters.wins,
                counters.decisive,
                counters.finished,
                counters.win_rate(),
                if promote { "promoted" } else { "rejected" }
            );

            if let Some(reports) = &self.reports {
                let report = RoundReport {
                    checkpoint: checkpoint.clone(),
                    counters,
                    win_rate: counters.win_rate(),
                    promote,
                };
                // A slow or closed report consumer must not stall evaluation.
                if let Err(e) = reports.try_send(report) {
                    warn!("A round report was not delivered: {e}");
                }
            }

            // Promoting. The training loop reads silence as rejection.
            if promote && self.outbound.send(checkpoint).await.is_err() {
                return Err(ArenaError::PromotionChannelClosed);
            }
        }

        info!("The arena shut down.");
        Ok(())
    }

    /// Dispatches all matches of one round and waits for the barrier.
    async fn play_round(&self) -> Result<RoundCounters, ArenaError> {
        let round = Arc::new(RoundContext::new(
            self.config.num_games_per_round,
            self.shutdown.child_token(),
        ));

        for challenger_color in challenger_colors(self.config.num_games_per_round) {
            let slot = self.admission.admit().await?;
            let match_task = MatchTask {
                challenger: self.challenger.clone(),
                best: self.best.clone(),
                game: Arc::clone(&self.game),
                round: Arc::clone(&round),
                challenger_color,
                timeout: self.config.match_timeout,
            };
            tokio::spawn(async move {
                // The slot travels into the task so it is returned whenever
                // and however the match ends.
                let _slot = slot;
                match_task.play().await;
            });
        }

        tokio::select! {
            _ = round.completed() => Ok(round.counters()),
            _ = self.shutdown.cancelled() => Err(ArenaError::ShutDown),
        }
    }
}

/// One scheduled match with everything it owns.
struct MatchTask<G: Gameplay> {
    challenger: SharedModel<G::Model>,
    best: SharedModel<G::Model>,
    game: Arc<G>,
    round: Arc<RoundContext>,
    challenger_color: PlayerColor,
    timeout: Duration,
}

impl<G: Gameplay> MatchTask<G> {
    async fn play(self) {
        let outcome = self.single_game().await;
        self.round.report(outcome);
    }

    /// Runs one game while holding shared read access on both models. The
    /// guards are dropped on every way out of this function, so a reload
    /// never waits on a match that is already gone.
    async fn single_game(&self) -> MatchOutcome {
        let challenger_model = self.challenger.acquire_read().await;
        let best_model = self.best.acquire_read().await;

        let (black, white) = match self.challenger_color {
            PlayerColor::Black => (&*challenger_model, &*best_model),
            PlayerColor::White => (&*best_model, &*challenger_model),
        };

        let game = self.game.start(black, white);
        let outcome = tokio::select! {
            _ = self.round.aborted() => GameOutcome::Aborted,
            finished = tokio::time::timeout(self.timeout, game) => match finished {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "A match with the challenger as {:?} ran into the {:?} timeout.",
                        self.challenger_color, self.timeout
                    );
                    GameOutcome::Aborted
                }
            },
        };

        MatchOutcome::from_game(outcome, self.challenger_color)
    }
}
