//! Color assignment for the matches of one evaluation round.

use crate::types::PlayerColor;

/// The color the challenger plays in each match of a round.
///
/// Colors alternate Black, White, Black, ... starting with Black; with an
/// odd number of games the extra game is Black again. This keeps the color
/// exposure balanced so the first-move advantage cancels out of the win
/// rate. The schedule is fully determined by `num_games`, there is no
/// randomness involved.
pub fn challenger_colors(num_games: u32) -> impl Iterator<Item = PlayerColor> {
    (0..num_games).map(|i| {
        if i % 2 == 0 {
            PlayerColor::Black
        } else {
            PlayerColor::White
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;
    use PlayerColor::*;

    #[test]
    fn five_games_alternate_starting_black() {
        let colors: Vec<PlayerColor> = challenger_colors(5).collect();
        assert_eq!(colors, vec![Black, White, Black, White, Black]);
    }

    #[test]
    fn zero_games_schedule_nothing() {
        assert_eq!(challenger_colors(0).count(), 0);
    }

    #[quickcheck]
    fn color_exposure_is_balanced(num_games: u8) -> bool {
        let colors: Vec<PlayerColor> = challenger_colors(num_games as u32).collect();
        let black = colors.iter().filter(|c| **c == Black).count();
        let white = colors.len() - black;

        colors.len() == num_games as usize && black == white + colors.len() % 2
    }

    #[quickcheck]
    fn schedule_is_deterministic(num_games: u8) -> bool {
        challenger_colors(num_games as u32).eq(challenger_colors(num_games as u32))
    }
}
