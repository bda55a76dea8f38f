//! The two external collaborators of the arena. Both are handed to the
//! [`crate::ArenaController`] at construction, the arena never looks
//! anything up through globals.

use async_trait::async_trait;

use crate::types::GameOutcome;

/// A loaded neural network (or whatever else plays the game).
///
/// The arena only needs to swap weights in and out. Inference and training
/// stay the evaluator's own business: a [`Gameplay`] implementation sees the
/// concrete model type through its associated `Model` and calls whatever
/// prediction API that type offers.
#[async_trait]
pub trait ModelEvaluator: Send + Sync {
    /// Replace the current weights with the given checkpoint.
    ///
    /// This is never called concurrently on one instance, the arena
    /// serializes all loads through the exclusive half of the model lock.
    /// When loading fails, the evaluator must keep answering with its
    /// previous weights.
    async fn load(&mut self, checkpoint: &str) -> anyhow::Result<()>;
}

/// Plays one full game between two models.
#[async_trait]
pub trait Gameplay: Send + Sync {
    type Model: ModelEvaluator;

    /// Play a game to its end and say who won.
    ///
    /// Anything that goes wrong inside the game must come back as
    /// [`GameOutcome::Aborted`], not as a panic. An aborted game still
    /// counts as finished for the round, it just carries no information
    /// about model strength.
    async fn start(&self, black: &Self::Model, white: &Self::Model) -> GameOutcome;
}
