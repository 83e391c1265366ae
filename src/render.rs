use std::io::{self, Write};

use clap::ValueEnum;

use crate::schedule::{Schedule, ScheduleReport};
use crate::table::{to_table, write_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
    /// Spreadsheet file; needs a path rather than a stream.
    Xlsx,
}

// Convert a group index (0-based) to a letter (A, B, ..., Z, AA, AB, ...)
pub fn group_index_to_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

pub fn render_text(schedule: &Schedule) -> String {
    let mut out = String::new();
    for (i, round) in schedule.rounds.iter().enumerate() {
        out.push_str(&format!("=== ラウンド {} ===\n", i + 1));
        for (g, group) in round.groups.iter().enumerate() {
            out.push_str(&format!(
                "グループ {}: {}\n",
                group_index_to_letter(g),
                group.members.join(", ")
            ));
        }
        out.push('\n');
    }
    out.push_str(&format!("合計: {} ラウンド\n", schedule.len()));
    out
}

/// Write the schedule part of `report` in `format`. JSON includes the outcome too.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &ScheduleReport,
    format: OutputFormat,
    group_size: usize,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => out.write_all(render_text(&report.schedule).as_bytes()),
        OutputFormat::Csv => write_csv(out, &to_table(&report.schedule, group_size), group_size),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)
        }
        OutputFormat::Xlsx => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "xlsx output is written to a file, not a stream",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Group, Outcome, Round};

    fn report() -> ScheduleReport {
        let group = |m: &[&str]| Group {
            members: m.iter().map(|s| s.to_string()).collect(),
        };
        ScheduleReport {
            requested_rounds: 2,
            schedule: Schedule {
                rounds: vec![Round {
                    groups: vec![group(&["a", "b"]), group(&["c", "d"])],
                }],
            },
            outcome: Outcome::PartialFailure {
                round: 2,
                max_attempts: 10,
            },
        }
    }

    #[test]
    fn test_group_index_to_letter() {
        assert_eq!(group_index_to_letter(0), "A");
        assert_eq!(group_index_to_letter(25), "Z");
        assert_eq!(group_index_to_letter(26), "AA");
        assert_eq!(group_index_to_letter(27), "AB");
        assert_eq!(group_index_to_letter(51), "AZ");
        assert_eq!(group_index_to_letter(52), "BA");
        assert_eq!(group_index_to_letter(701), "ZZ");
        assert_eq!(group_index_to_letter(702), "AAA");
    }

    #[test]
    fn test_render_text_letters_groups() {
        let text = render_text(&report().schedule);
        assert!(text.contains("=== ラウンド 1 ==="));
        assert!(text.contains("グループ A: a, b"));
        assert!(text.contains("グループ B: c, d"));
    }

    #[test]
    fn test_write_report_csv() {
        let mut out = Vec::new();
        write_report(&mut out, &report(), OutputFormat::Csv, 2).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Round,Group,Member 1,Member 2\n1,1,a,b\n1,2,c,d\n"
        );
    }

    #[test]
    fn test_write_report_refuses_xlsx_stream() {
        let mut out = Vec::new();
        let err = write_report(&mut out, &report(), OutputFormat::Xlsx, 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_report_json_includes_outcome() {
        let mut out = Vec::new();
        write_report(&mut out, &report(), OutputFormat::Json, 2).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["outcome"]["status"], "partial_failure");
        assert_eq!(value["outcome"]["round"], 2);
        assert_eq!(value["schedule"][0][1][0], "c");
    }
}
