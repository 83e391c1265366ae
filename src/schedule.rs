use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::history::{GroupHistory, History, PairHistory, Strategy};
use crate::partition::{attempt_round, CommitPolicy, RoundSpec, ScanMode};
use crate::ParticipantId;

pub const DEFAULT_GROUP_SIZE: usize = 4;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3000;

/// Knobs for one schedule build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Members per group.
    pub group_size: usize,
    /// Random permutations tried per round before giving up.
    pub max_attempts: usize,
    pub strategy: Strategy,
    pub scan: ScanMode,
    pub commit: CommitPolicy,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            strategy: Strategy::Pairwise,
            scan: ScanMode::BestEffort,
            commit: CommitPolicy::Transactional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group {
    pub members: Vec<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round {
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    pub rounds: Vec<Round>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// True when every round places each roster member in exactly one group.
    pub fn validate_partition(&self, roster: &[ParticipantId]) -> bool {
        let expected: HashSet<&str> = roster.iter().map(String::as_str).collect();
        self.rounds.iter().all(|round| {
            let mut placed = HashSet::with_capacity(roster.len());
            let no_duplicates = round
                .groups
                .iter()
                .flat_map(|g| &g.members)
                .all(|m| placed.insert(m.as_str()));
            no_duplicates && placed == expected
        })
    }

    /// Pairs that shared a group in more than one round, sorted.
    pub fn repeated_pairs(&self) -> Vec<(ParticipantId, ParticipantId)> {
        let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
        for group in self.rounds.iter().flat_map(|r| &r.groups) {
            for (i, a) in group.members.iter().enumerate() {
                for b in &group.members[i + 1..] {
                    let key = if a <= b {
                        (a.as_str(), b.as_str())
                    } else {
                        (b.as_str(), a.as_str())
                    };
                    *counts.entry(key).or_insert(0) += 1;
                }
            }
        }

        let mut repeated: Vec<_> = counts
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|((a, b), _)| (a.to_string(), b.to_string()))
            .collect();
        repeated.sort();
        repeated
    }

    /// Exact groups formed in more than one round, sorted.
    pub fn repeated_groups(&self) -> Vec<Vec<ParticipantId>> {
        let mut counts: HashMap<Vec<&str>, usize> = HashMap::new();
        for group in self.rounds.iter().flat_map(|r| &r.groups) {
            let mut key: Vec<&str> = group.members.iter().map(String::as_str).collect();
            key.sort_unstable();
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut repeated: Vec<Vec<ParticipantId>> = counts
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|(key, _)| key.into_iter().map(str::to_string).collect())
            .collect();
        repeated.sort();
        repeated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// `round` (1-based) ran out of attempts; the rounds before it are valid.
    PartialFailure { round: usize, max_attempts: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub requested_rounds: usize,
    pub schedule: Schedule,
    pub outcome: Outcome,
}

impl ScheduleReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Success => write!(
                f,
                "Successfully generated schedule for all {} rounds.",
                self.requested_rounds
            ),
            Outcome::PartialFailure {
                round,
                max_attempts,
            } => {
                writeln!(
                    f,
                    "Could not generate a valid unique grouping for round {} after {} attempts.",
                    round, max_attempts
                )?;
                writeln!(
                    f,
                    "{} of {} rounds were generated and can be used as-is.",
                    self.schedule.len(),
                    self.requested_rounds
                )?;
                writeln!(f, "Suggestions:")?;
                writeln!(f, "- Try generating again.")?;
                writeln!(f, "- Reduce the number of rounds or raise the attempt budget.")?;
                write!(f, "- Check that the roster is correct.")
            }
        }
    }
}

/// A self-contained generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub roster: Vec<ParticipantId>,
    pub rounds: usize,
    #[serde(default)]
    pub config: ScheduleConfig,
}

impl ScheduleRequest {
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ScheduleReport, ScheduleError> {
        build(&self.roster, self.rounds, &self.config, rng)
    }
}

/// Build up to `num_rounds` rounds, stopping at the first round that exhausts its
/// attempt budget.
pub fn build<R: Rng + ?Sized>(
    roster: &[ParticipantId],
    num_rounds: usize,
    config: &ScheduleConfig,
    rng: &mut R,
) -> Result<ScheduleReport, ScheduleError> {
    check_preconditions(roster, config.group_size)?;

    info!(
        participants = roster.len(),
        rounds = num_rounds,
        group_size = config.group_size,
        strategy = ?config.strategy,
        "building schedule"
    );

    match config.strategy {
        Strategy::Pairwise => Ok(run_rounds(roster, num_rounds, config, PairHistory::new(), rng)),
        Strategy::GroupComposition => Ok(run_rounds(
            roster,
            num_rounds,
            config,
            GroupHistory::new(),
            rng,
        )),
    }
}

fn check_preconditions(roster: &[ParticipantId], group_size: usize) -> Result<(), ScheduleError> {
    if roster.is_empty() {
        return Err(ScheduleError::EmptyRoster);
    }
    if group_size == 0 {
        return Err(ScheduleError::InvalidGroupSize(group_size));
    }
    if roster.len() % group_size != 0 {
        return Err(ScheduleError::IndivisibleRoster {
            roster_size: roster.len(),
            group_size,
        });
    }
    Ok(())
}

fn run_rounds<H: History, R: Rng + ?Sized>(
    roster: &[ParticipantId],
    num_rounds: usize,
    config: &ScheduleConfig,
    mut history: H,
    rng: &mut R,
) -> ScheduleReport {
    let spec = RoundSpec {
        groups_per_round: roster.len() / config.group_size,
        group_size: config.group_size,
        max_attempts: config.max_attempts,
        scan: config.scan,
        commit: config.commit,
    };
    let mut schedule = Schedule::default();

    for round_number in 1..=num_rounds {
        match attempt_round(roster.len(), &mut history, &spec, rng) {
            Ok(groups) => {
                debug!(round = round_number, "round scheduled");
                schedule.rounds.push(materialize(roster, groups));
            }
            Err(exhausted) => {
                warn!(
                    round = round_number,
                    attempts = exhausted.attempts,
                    completed = schedule.len(),
                    "stopping early: {}",
                    exhausted
                );
                return ScheduleReport {
                    requested_rounds: num_rounds,
                    schedule,
                    outcome: Outcome::PartialFailure {
                        round: round_number,
                        max_attempts: exhausted.attempts,
                    },
                };
            }
        }
    }

    ScheduleReport {
        requested_rounds: num_rounds,
        schedule,
        outcome: Outcome::Success,
    }
}

fn materialize(roster: &[ParticipantId], groups: Vec<Vec<usize>>) -> Round {
    let groups = groups
        .into_iter()
        .map(|indices| {
            let mut members: Vec<ParticipantId> =
                indices.into_iter().map(|i| roster[i].clone()).collect();
            members.sort();
            Group { members }
        })
        .collect();
    Round { groups }
}
