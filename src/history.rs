use std::collections::{HashMap, HashSet};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which kind of repetition a schedule forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// No two participants may share a group more than once.
    #[default]
    Pairwise,
    /// The same exact group may not be formed twice.
    GroupComposition,
}

/// What has been grouped together so far during one build.
///
/// Groups are slices of roster indices. Order within a slice does not matter.
pub trait History {
    fn is_acceptable(&self, group: &[usize]) -> bool;
    fn record(&mut self, group: &[usize]);
}

/// Every unordered pair that has already shared a group.
#[derive(Debug, Clone, Default)]
pub struct PairHistory {
    seen: HashSet<(usize, usize)>,
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PairHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.seen.contains(&pair_key(a, b))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl History for PairHistory {
    fn is_acceptable(&self, group: &[usize]) -> bool {
        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                if self.contains(a, b) {
                    return false;
                }
            }
        }
        true
    }

    fn record(&mut self, group: &[usize]) {
        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                self.seen.insert(pair_key(a, b));
            }
        }
    }
}

/// For each participant, the exact groups it has been part of.
#[derive(Debug, Clone, Default)]
pub struct GroupHistory {
    seen: HashMap<usize, HashSet<Vec<usize>>>,
}

fn group_key(group: &[usize]) -> Vec<usize> {
    let mut key = group.to_vec();
    key.sort_unstable();
    key.dedup();
    key
}

impl GroupHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct groups recorded for `member`.
    pub fn groups_of(&self, member: usize) -> usize {
        self.seen.get(&member).map_or(0, HashSet::len)
    }
}

impl History for GroupHistory {
    fn is_acceptable(&self, group: &[usize]) -> bool {
        let key = group_key(group);
        !key.iter().any(|member| {
            self.seen
                .get(member)
                .is_some_and(|groups| groups.contains(&key))
        })
    }

    fn record(&mut self, group: &[usize]) {
        let key = group_key(group);
        for &member in &key {
            self.seen.entry(member).or_default().insert(key.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_history_rejects_any_seen_pair() {
        let mut history = PairHistory::new();
        assert!(history.is_acceptable(&[0, 1, 2, 3]));

        history.record(&[0, 1, 2, 3]);
        // 4 members -> 6 pairs
        assert_eq!(history.len(), 6);

        // Shares the pair (2, 3) only
        assert!(!history.is_acceptable(&[3, 4, 5, 2]));
        // No pair in common
        assert!(history.is_acceptable(&[0, 4, 5, 6]));
    }

    #[test]
    fn test_pair_history_is_order_insensitive() {
        let mut history = PairHistory::new();
        history.record(&[5, 1]);
        assert!(history.contains(1, 5));
        assert!(history.contains(5, 1));
        assert!(!history.is_acceptable(&[1, 9, 5]));
    }

    #[test]
    fn test_group_history_only_rejects_exact_composition() {
        let mut history = GroupHistory::new();
        history.record(&[0, 1, 2]);

        assert!(!history.is_acceptable(&[2, 0, 1]));
        // Overlaps by two members but is a different group
        assert!(history.is_acceptable(&[0, 1, 3]));
        assert_eq!(history.groups_of(0), 1);
        assert_eq!(history.groups_of(3), 0);
    }

    #[test]
    fn test_group_history_records_for_every_member() {
        let mut history = GroupHistory::new();
        history.record(&[3, 4]);
        history.record(&[3, 5]);
        assert_eq!(history.groups_of(3), 2);
        assert_eq!(history.groups_of(4), 1);
        assert_eq!(history.groups_of(5), 1);
    }

    #[test]
    fn test_single_member_groups_never_conflict_pairwise() {
        let mut history = PairHistory::new();
        history.record(&[0]);
        assert!(history.is_empty());
        assert!(history.is_acceptable(&[0]));
    }
}
