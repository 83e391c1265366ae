use std::path::PathBuf;

/// Precondition failures detected before any round is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("the roster is empty; at least one participant is required")]
    EmptyRoster,
    #[error(
        "number of participants ({roster_size}) must be divisible by group size ({group_size})"
    )]
    IndivisibleRoster {
        roster_size: usize,
        group_size: usize,
    },
    #[error("group size must be at least 1 (got {0})")]
    InvalidGroupSize(usize),
}

/// A round spent its whole attempt budget without finding an acceptable partition.
///
/// This is an expected outcome of the randomized search, not a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no acceptable grouping found after {attempts} attempts")]
pub struct RoundExhausted {
    pub attempts: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open spreadsheet {}: {source}", .path.display())]
    Spreadsheet {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("spreadsheet {} contains no worksheets", .0.display())]
    NoSheets(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create worksheet: {0}")]
    Sheet(String),
    #[error("failed to write {}: {source}", .path.display())]
    Xlsx {
        path: PathBuf,
        source: umya_spreadsheet::XlsxError,
    },
}
