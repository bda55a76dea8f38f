//! Stub collaborators for pipeline dry runs. The model "weights" are just a
//! strength number parsed from the checkpoint id and gameplay is a
//! strength-weighted coin flip. That keeps the whole arena path exercised
//! without pulling real inference into this binary.

use anyhow::bail;
use async_trait::async_trait;
use gauntlet::backends::{Gameplay, ModelEvaluator};
use gauntlet::{GameOutcome, PlayerColor};
use rand::Rng;

pub struct DryRunModel {
    checkpoint: String,
    strength: f64,
}

impl DryRunModel {
    /// The untrained starting point both arena slots begin with.
    pub fn initial() -> Self {
        DryRunModel {
            checkpoint: "initial".to_owned(),
            strength: 0.0,
        }
    }
}

#[async_trait]
impl ModelEvaluator for DryRunModel {
    async fn load(&mut self, checkpoint: &str) -> anyhow::Result<()> {
        // Checkpoint paths end in "ckpt-<version>", the version doubles as
        // playing strength so later checkpoints actually get promoted.
        let Some(version) = checkpoint
            .rsplit("ckpt-")
            .next()
            .and_then(|v| v.parse::<f64>().ok())
        else {
            bail!("checkpoint id '{checkpoint}' carries no version number");
        };
        debug!(
            "Dry run model switches from {} to {}.",
            self.checkpoint, checkpoint
        );
        self.checkpoint = checkpoint.to_owned();
        self.strength = version;
        Ok(())
    }
}

/// Decides games with an Elo-style logistic curve over the strength
/// difference, plus a fixed tie chance.
pub struct CoinFlipGameplay {
    pub tie_chance: f64,
}

#[async_trait]
impl Gameplay for CoinFlipGameplay {
    type Model = DryRunModel;

    async fn start(&self, black: &DryRunModel, white: &DryRunModel) -> GameOutcome {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.tie_chance) {
            return GameOutcome::Tie;
        }

        let black_win_chance =
            1.0 / (1.0 + 10f64.powf((white.strength - black.strength) / 400.0));
        if rng.gen_bool(black_win_chance) {
            GameOutcome::Win(PlayerColor::Black)
        } else {
            GameOutcome::Win(PlayerColor::White)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn versioned_checkpoints_load_and_garbage_does_not() {
        let mut model = DryRunModel::initial();
        model.load("./checkpoints/ckpt-300").await.unwrap();
        assert_eq!(model.strength, 300.0);

        assert!(model.load("./checkpoints/weights.bin").await.is_err());
        // The failed load left the previous checkpoint in place.
        assert_eq!(model.strength, 300.0);
    }

    #[tokio::test]
    async fn a_much_stronger_model_nearly_always_wins() {
        let game = CoinFlipGameplay { tie_chance: 0.0 };
        let mut strong = DryRunModel::initial();
        strong.load("ckpt-2000").await.unwrap();
        let weak = DryRunModel::initial();

        let mut strong_wins = 0;
        for _ in 0..100 {
            if game.start(&strong, &weak).await == GameOutcome::Win(PlayerColor::Black) {
                strong_wins += 1;
            }
        }
        // 2000 Elo points ahead, losing even once in a hundred games would
        // be a one in a million fluke.
        assert!(strong_wins > 95, "strong model only won {strong_wins}");
    }
}
