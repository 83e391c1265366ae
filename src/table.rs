use std::io::{self, Write};

use crate::schedule::Schedule;

/// One group of one round, flattened for display or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub round_number: usize,
    pub group_number: usize,
    pub members: Vec<String>,
}

/// Flatten `schedule` into rows ordered by round, then group.
///
/// Groups with fewer than `group_size` members are padded with empty strings.
pub fn to_table(schedule: &Schedule, group_size: usize) -> Vec<TableRow> {
    let mut rows = Vec::new();
    for (round_idx, round) in schedule.rounds.iter().enumerate() {
        for (group_idx, group) in round.groups.iter().enumerate() {
            let mut members = group.members.clone();
            if members.len() < group_size {
                members.resize(group_size, String::new());
            }
            rows.push(TableRow {
                round_number: round_idx + 1,
                group_number: group_idx + 1,
                members,
            });
        }
    }
    rows
}

/// Column names: `Round, Group, Member 1 .. Member n`.
pub fn header(member_columns: usize) -> Vec<String> {
    let mut columns = vec!["Round".to_string(), "Group".to_string()];
    columns.extend((1..=member_columns).map(|i| format!("Member {}", i)));
    columns
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `rows` as CSV. The member column count is at least `group_size`, widened if
/// any row carries more members.
pub fn write_csv<W: Write>(out: &mut W, rows: &[TableRow], group_size: usize) -> io::Result<()> {
    let width = rows
        .iter()
        .map(|r| r.members.len())
        .max()
        .unwrap_or(0)
        .max(group_size);

    writeln!(out, "{}", header(width).join(","))?;
    for row in rows {
        let mut fields = vec![row.round_number.to_string(), row.group_number.to_string()];
        fields.extend(row.members.iter().map(|m| csv_field(m)));
        fields.resize(width + 2, String::new());
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}
