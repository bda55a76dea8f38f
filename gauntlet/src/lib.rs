//! Tournament arena that decides whether a freshly trained challenger model
//! should replace the current best model. One inbound checkpoint id triggers
//! one evaluation round: the challenger weights are hot-reloaded, a batch of
//! games against the best model is played concurrently (bounded by the
//! worker count), and the aggregated win rate among decisive games decides
//! the promotion. Promoted checkpoint ids are forwarded on the outbound
//! channel; rejection is silence.
//!
//! The neural network itself and the game rules are not part of this crate.
//! They are injected through the [`backends::ModelEvaluator`] and
//! [`backends::Gameplay`] traits.

pub mod admission;
pub mod backends;
pub mod controller;
pub mod round;
pub mod schedule;
pub mod shared_model;
pub mod types;

pub use controller::{ArenaConfig, ArenaController, RoundReport};
pub use round::RoundCounters;
pub use shared_model::{ModelName, SharedModel};
pub use types::{GameOutcome, MatchOutcome, PlayerColor};

/// This enum holds all errors that the arena can surface to its caller.
/// Most match-level problems never show up here: a failing game only turns
/// into an aborted outcome of that one match.
#[derive(thiserror::Error, Debug)]
pub enum ArenaError {
    #[error("The {model} model rejected checkpoint '{checkpoint}': {cause}")]
    CheckpointRejected {
        model: ModelName,
        checkpoint: String,
        cause: anyhow::Error,
    },
    #[error("The admission pool is closed, no further matches can start.")]
    AdmissionClosed,
    #[error("Nobody listens for promotions anymore.")]
    PromotionChannelClosed,
    #[error("The arena was shut down while a round was still running.")]
    ShutDown,
    #[error("Invalid arena configuration: {0}")]
    Config(String),
}
