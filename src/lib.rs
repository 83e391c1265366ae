//! Rotating group assignment.
//!
//! Splits a roster into equal-sized groups for several consecutive rounds,
//! retrying random partitions until no pairing (or no exact group) repeats
//! what earlier rounds already produced.

pub mod error;
pub mod history;
pub mod input;
pub mod partition;
pub mod render;
pub mod roster;
pub mod schedule;
pub mod spreadsheet;
pub mod table;

pub type ParticipantId = String;

pub use error::{ExportError, RosterError, RoundExhausted, ScheduleError};
pub use history::{GroupHistory, History, PairHistory, Strategy};
pub use partition::{attempt_round, CommitPolicy, RoundSpec, ScanMode};
pub use roster::{Roster, RosterCommand};
pub use schedule::{
    build, Group, Outcome, Round, Schedule, ScheduleConfig, ScheduleReport, ScheduleRequest,
};
pub use table::{to_table, TableRow};
