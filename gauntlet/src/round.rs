//! State of one evaluation round: the result counters, the completion
//! barrier and the context value every match of the round gets to see.

use std::sync::Mutex;

use log::error;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::types::MatchOutcome;

/// The three counters a round accumulates. Ties and aborts count as
/// finished but not as decisive, the promotion decision only looks at games
/// with a real winner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCounters {
    pub wins: u32,
    pub decisive: u32,
    pub finished: u32,
}

impl RoundCounters {
    /// Challenger win rate among decisive games. All-tie rounds have no
    /// decisive games and get a rate of zero instead of a division by zero.
    pub fn win_rate(&self) -> f64 {
        if self.decisive == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.decisive)
        }
    }

    /// The promotion rule: strictly more wins than the threshold share of
    /// decisive games. With `decisive == 0` this is always false, a round
    /// of ties promotes nobody.
    pub fn promotes_at(&self, threshold: f64) -> bool {
        f64::from(self.wins) > threshold * f64::from(self.decisive)
    }
}

/// Collects match outcomes from concurrently finishing matches.
///
/// All counter updates of one match happen under a single lock, so every
/// observer sees them as a unit and no update can be lost. The aggregation
/// is commutative, the completion order of the matches does not matter.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    counters: Mutex<RoundCounters>,
}

impl ResultAggregator {
    /// Record one finished match and return the counters right after it.
    pub fn report(&self, outcome: MatchOutcome) -> RoundCounters {
        let mut counters = self.counters.lock().unwrap();
        match outcome {
            MatchOutcome::ChallengerWins => {
                counters.wins += 1;
                counters.decisive += 1;
            }
            MatchOutcome::OpponentWins => {
                counters.decisive += 1;
            }
            MatchOutcome::Tie | MatchOutcome::Aborted => {}
        }
        counters.finished += 1;
        *counters
    }

    pub fn snapshot(&self) -> RoundCounters {
        *self.counters.lock().unwrap()
    }
}

/// One-shot gate that opens when all matches of a round have finished.
///
/// Matches may finish in any order; the gate opens exactly once. A target
/// of zero matches means the gate starts out open.
pub struct CompletionBarrier {
    released: watch::Sender<bool>,
}

impl CompletionBarrier {
    pub fn new(target: u32) -> Self {
        let (released, _) = watch::channel(target == 0);
        CompletionBarrier { released }
    }

    /// Opens the gate. Calling this twice is a bug in the caller and gets
    /// logged, the waiters are only ever woken once.
    pub fn release(&self) {
        let was_released = self.released.send_replace(true);
        if was_released {
            error!("The completion barrier was released twice.");
        }
    }

    pub async fn wait(&self) {
        let mut released = self.released.subscribe();
        released
            .wait_for(|released| *released)
            .await
            .expect("The barrier cannot outlive its own sender.");
    }
}

/// Everything a running match needs to know about its round. One context is
/// created per round and shared by all of its matches, there is no other
/// cross-match state.
pub struct RoundContext {
    target: u32,
    aggregator: ResultAggregator,
    barrier: CompletionBarrier,
    cancel: CancellationToken,
}

impl RoundContext {
    pub fn new(target: u32, cancel: CancellationToken) -> Self {
        RoundContext {
            target,
            aggregator: ResultAggregator::default(),
            barrier: CompletionBarrier::new(target),
            cancel,
        }
    }

    /// Record one finished match. The match that completes the round opens
    /// the barrier; more reports than scheduled matches are an invariant
    /// violation that is surfaced instead of silently tolerated.
    pub fn report(&self, outcome: MatchOutcome) {
        let counters = self.aggregator.report(outcome);
        if counters.finished == self.target {
            self.barrier.release();
        } else if counters.finished > self.target {
            error!(
                "Round received {} reports for {} scheduled matches.",
                counters.finished, self.target
            );
            debug_assert!(false, "more reports than scheduled matches");
        }
    }

    /// Resolves once all matches of the round have reported.
    pub async fn completed(&self) {
        self.barrier.wait().await
    }

    /// Resolves when the round is torn down and its matches should stop.
    pub async fn aborted(&self) {
        self.cancel.cancelled().await
    }

    pub fn counters(&self) -> RoundCounters {
        self.aggregator.snapshot()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use MatchOutcome::*;

    #[test]
    fn each_outcome_updates_its_counters() {
        let aggregator = ResultAggregator::default();
        assert_eq!(
            aggregator.report(ChallengerWins),
            RoundCounters {
                wins: 1,
                decisive: 1,
                finished: 1
            }
        );
        assert_eq!(
            aggregator.report(OpponentWins),
            RoundCounters {
                wins: 1,
                decisive: 2,
                finished: 2
            }
        );
        assert_eq!(
            aggregator.report(Tie),
            RoundCounters {
                wins: 1,
                decisive: 2,
                finished: 3
            }
        );
        assert_eq!(
            aggregator.report(Aborted),
            RoundCounters {
                wins: 1,
                decisive: 2,
                finished: 4
            }
        );
    }

    /// Reporting from many threads at once must match the sequential sums,
    /// lost updates would bias the win rate.
    #[test]
    fn concurrent_reports_lose_no_updates() {
        let aggregator = Arc::new(ResultAggregator::default());

        let mut threads = Vec::new();
        for _ in 0..8 {
            let aggregator = Arc::clone(&aggregator);
            threads.push(std::thread::spawn(move || {
                for _ in 0..25 {
                    aggregator.report(ChallengerWins);
                    aggregator.report(OpponentWins);
                    aggregator.report(Tie);
                    aggregator.report(Aborted);
                }
            }));
        }
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(
            aggregator.snapshot(),
            RoundCounters {
                wins: 200,
                decisive: 400,
                finished: 800
            }
        );
    }

    #[test]
    fn promotion_threshold_is_strict() {
        let narrowly_above = RoundCounters {
            wins: 56,
            decisive: 100,
            finished: 100,
        };
        assert!(narrowly_above.promotes_at(0.55));

        let exactly_at = RoundCounters {
            wins: 55,
            decisive: 100,
            finished: 100,
        };
        assert!(!exactly_at.promotes_at(0.55));
    }

    #[test]
    fn a_round_of_ties_never_promotes() {
        let all_ties = RoundCounters {
            wins: 0,
            decisive: 0,
            finished: 10,
        };
        assert!(!all_ties.promotes_at(0.55));
        assert_eq!(all_ties.win_rate(), 0.0);
    }

    #[tokio::test]
    async fn barrier_opens_exactly_at_target() {
        let round = RoundContext::new(3, CancellationToken::new());
        round.report(ChallengerWins);
        round.report(Tie);

        // Two of three reports are in, the barrier must still be shut.
        let early = tokio::time::timeout(Duration::from_millis(20), round.completed()).await;
        assert!(early.is_err());

        round.report(OpponentWins);
        round.completed().await;
        assert_eq!(
            round.counters(),
            RoundCounters {
                wins: 1,
                decisive: 2,
                finished: 3
            }
        );
    }

    #[tokio::test]
    async fn empty_round_completes_immediately() {
        let round = RoundContext::new(0, CancellationToken::new());
        tokio::time::timeout(Duration::from_millis(20), round.completed())
            .await
            .expect("an empty round must not block");
    }

    #[tokio::test]
    async fn late_waiters_see_an_open_barrier() {
        let barrier = CompletionBarrier::new(1);
        barrier.release();
        tokio::time::timeout(Duration::from_millis(20), barrier.wait())
            .await
            .expect("an open barrier must not block");
    }
}
