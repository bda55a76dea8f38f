//! Shared vocabulary types: player colors, raw game outcomes and their
//! challenger-relative interpretation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Black,
    White,
}

/// What a gameplay backend reports for one game, in board terms.
///
/// `Aborted` covers everything that kept the game from reaching a regular
/// end, like an engine crash or a timeout. `Tie` is a regular end without a
/// winner. The two must not be collapsed, only ties are real game results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Aborted,
    Tie,
    Win(PlayerColor),
}

/// A [`GameOutcome`] translated to the question the arena actually asks:
/// did the challenger win this match?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Aborted,
    Tie,
    ChallengerWins,
    OpponentWins,
}

impl MatchOutcome {
    /// Reads a game outcome through the color the challenger played in this
    /// match. The color assignment comes from the round schedule.
    pub fn from_game(outcome: GameOutcome, challenger_color: PlayerColor) -> Self {
        match outcome {
            GameOutcome::Aborted => MatchOutcome::Aborted,
            GameOutcome::Tie => MatchOutcome::Tie,
            GameOutcome::Win(color) if color == challenger_color => MatchOutcome::ChallengerWins,
            GameOutcome::Win(_) => MatchOutcome::OpponentWins,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn game_outcomes_follow_the_challenger_color() {
        let black_wins = GameOutcome::Win(PlayerColor::Black);
        assert_eq!(
            MatchOutcome::from_game(black_wins, PlayerColor::Black),
            MatchOutcome::ChallengerWins
        );
        assert_eq!(
            MatchOutcome::from_game(black_wins, PlayerColor::White),
            MatchOutcome::OpponentWins
        );
    }

    #[test]
    fn ties_and_aborts_are_color_independent() {
        for color in [PlayerColor::Black, PlayerColor::White] {
            assert_eq!(
                MatchOutcome::from_game(GameOutcome::Tie, color),
                MatchOutcome::Tie
            );
            assert_eq!(
                MatchOutcome::from_game(GameOutcome::Aborted, color),
                MatchOutcome::Aborted
            );
        }
    }
}
