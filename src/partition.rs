use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::RoundExhausted;
use crate::history::History;

/// How a single attempt reacts to a rejected chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Skip the chunk and keep scanning the rest of the permutation.
    #[default]
    BestEffort,
    /// Give up on the permutation at the first rejected chunk.
    FailFast,
}

/// When accepted groups are written into the shared history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// Only once the whole round has been accepted.
    #[default]
    Transactional,
    /// As soon as each group is accepted, even if the attempt later fails.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSpec {
    pub groups_per_round: usize,
    pub group_size: usize,
    pub max_attempts: usize,
    pub scan: ScanMode,
    pub commit: CommitPolicy,
}

/// Try up to `spec.max_attempts` random permutations of `0..roster_len` until one
/// splits into `spec.groups_per_round` groups the history accepts.
///
/// Returned groups hold roster indices, sorted within each group, in the order they
/// were accepted.
pub fn attempt_round<H, R>(
    roster_len: usize,
    history: &mut H,
    spec: &RoundSpec,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>, RoundExhausted>
where
    H: History,
    R: Rng + ?Sized,
{
    let mut order: Vec<usize> = (0..roster_len).collect();

    for attempt in 1..=spec.max_attempts {
        order.shuffle(rng);
        let groups = scan_permutation(&order, history, spec);

        if groups.len() == spec.groups_per_round {
            // Chunks of one permutation are disjoint, so checking each against the
            // committed history alone is enough before recording them all.
            if spec.commit == CommitPolicy::Transactional {
                for group in &groups {
                    history.record(group);
                }
            }
            debug!(attempt, groups = groups.len(), "round accepted");
            return Ok(groups);
        }
        trace!(attempt, accepted = groups.len(), "attempt rejected");
    }

    Err(RoundExhausted {
        attempts: spec.max_attempts,
    })
}

fn scan_permutation<H: History>(
    order: &[usize],
    history: &mut H,
    spec: &RoundSpec,
) -> Vec<Vec<usize>> {
    let mut accepted = Vec::with_capacity(spec.groups_per_round);
    if spec.group_size == 0 {
        return accepted;
    }

    for chunk in order.chunks_exact(spec.group_size) {
        if accepted.len() == spec.groups_per_round {
            break;
        }

        let mut group = chunk.to_vec();
        group.sort_unstable();

        if history.is_acceptable(&group) {
            if spec.commit == CommitPolicy::Incremental {
                history.record(&group);
            }
            accepted.push(group);
        } else if spec.scan == ScanMode::FailFast {
            break;
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{GroupHistory, PairHistory};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spec(groups_per_round: usize, group_size: usize, max_attempts: usize) -> RoundSpec {
        RoundSpec {
            groups_per_round,
            group_size,
            max_attempts,
            scan: ScanMode::BestEffort,
            commit: CommitPolicy::Transactional,
        }
    }

    fn assert_partition(groups: &[Vec<usize>], roster_len: usize, group_size: usize) {
        let mut seen = vec![false; roster_len];
        for group in groups {
            assert_eq!(group.len(), group_size);
            for &member in group {
                assert!(!seen[member], "member {} appears twice", member);
                seen[member] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "every member must be placed");
    }

    #[test]
    fn test_first_round_always_succeeds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut history = PairHistory::new();

        let groups = attempt_round(8, &mut history, &spec(2, 4, 1), &mut rng).unwrap();

        assert_eq!(groups.len(), 2);
        assert_partition(&groups, 8, 4);
        // Two groups of 4 -> 2 * 6 pairs recorded
        assert_eq!(history.len(), 12);
    }

    #[test]
    fn test_groups_are_sorted_internally() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut history = PairHistory::new();

        let groups = attempt_round(12, &mut history, &spec(4, 3, 1), &mut rng).unwrap();
        for group in &groups {
            assert!(group.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_exhaustion_when_every_pair_is_taken() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut history = PairHistory::new();
        history.record(&[0, 1, 2, 3]);

        let result = attempt_round(4, &mut history, &spec(1, 4, 50), &mut rng);

        assert_eq!(result, Err(RoundExhausted { attempts: 50 }));
        // Failed round leaves the history untouched
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn test_zero_attempts_fails_immediately() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut history = PairHistory::new();
        let result = attempt_round(4, &mut history, &spec(1, 4, 0), &mut rng);
        assert_eq!(result, Err(RoundExhausted { attempts: 0 }));
        assert!(history.is_empty());
    }

    #[test]
    fn test_transactional_commit_discards_failed_attempts() {
        // Asking for 3 groups out of 8 members can never succeed, but every chunk is
        // acceptable on its own.
        let mut rng = StdRng::seed_from_u64(3);
        let mut history = PairHistory::new();

        let result = attempt_round(8, &mut history, &spec(3, 4, 5), &mut rng);

        assert!(result.is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn test_incremental_commit_keeps_groups_from_failed_attempts() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut history = PairHistory::new();
        let spec = RoundSpec {
            commit: CommitPolicy::Incremental,
            ..spec(3, 4, 1)
        };

        let result = attempt_round(8, &mut history, &spec, &mut rng);

        assert!(result.is_err());
        // Both chunks of the single attempt were recorded
        assert_eq!(history.len(), 12);
    }

    #[test]
    fn test_fail_fast_and_best_effort_both_respect_history() {
        for scan in [ScanMode::BestEffort, ScanMode::FailFast] {
            let mut rng = StdRng::seed_from_u64(11);
            let mut history = PairHistory::new();
            let spec = RoundSpec {
                scan,
                ..spec(3, 3, 20_000)
            };

            let first = attempt_round(9, &mut history, &spec, &mut rng).unwrap();
            let second = attempt_round(9, &mut history, &spec, &mut rng).unwrap();

            assert_partition(&second, 9, 3);
            for group in &second {
                for old in &first {
                    let shared = group.iter().filter(|m| old.contains(m)).count();
                    assert!(shared <= 1, "{:?} repeats a pair from {:?}", group, old);
                }
            }
        }
    }

    #[test]
    fn test_fail_fast_stops_recording_at_first_rejected_chunk() {
        // Pairs out of 8 members with (0, 1) already used. A single incremental attempt
        // records exactly the chunks the scan accepted.
        for seed in 0..200 {
            // Same permutation attempt_round will draw from a fresh rng with this seed
            let mut order: Vec<usize> = (0..8).collect();
            order.shuffle(&mut StdRng::seed_from_u64(seed));
            let pos = order.iter().position(|&m| m == 0).unwrap() / 2;
            let blocked = order[pos * 2..pos * 2 + 2].contains(&1);

            for scan in [ScanMode::FailFast, ScanMode::BestEffort] {
                let mut history = PairHistory::new();
                history.record(&[0, 1]);
                let spec = RoundSpec {
                    scan,
                    commit: CommitPolicy::Incremental,
                    ..spec(4, 2, 1)
                };

                let result =
                    attempt_round(8, &mut history, &spec, &mut StdRng::seed_from_u64(seed));

                let expected = match (blocked, scan) {
                    (false, _) => 1 + 4,
                    (true, ScanMode::FailFast) => 1 + pos,
                    (true, ScanMode::BestEffort) => 1 + 3,
                };
                assert_eq!(result.is_ok(), !blocked, "seed {}", seed);
                assert_eq!(history.len(), expected, "seed {} {:?}", seed, scan);
            }
        }
    }

    #[test]
    fn test_group_history_allows_overlapping_groups() {
        // Four members in pairs: two of the three possible pairings are still unused
        // after the first round.
        let mut rng = StdRng::seed_from_u64(5);
        let mut history = GroupHistory::new();
        let spec = spec(2, 2, 1_000);

        let first = attempt_round(4, &mut history, &spec, &mut rng).unwrap();
        let second = attempt_round(4, &mut history, &spec, &mut rng).unwrap();

        for group in &second {
            assert!(!first.contains(group));
        }
    }
}
