use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{ExportError, RosterError};
use crate::schedule::Schedule;
use crate::table::{header, to_table};

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Render a cell as a participant name. Whole floats drop their `.0`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => d.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}

/// Names from the first column of the first worksheet, skipping empty cells.
pub fn read_first_column(path: &Path) -> Result<Vec<String>, RosterError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| RosterError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| RosterError::NoSheets(path.to_path_buf()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|source| RosterError::Spreadsheet {
            path: path.to_path_buf(),
            source,
        })?;

    let names: Vec<String> = range
        .rows()
        .filter_map(|row| row.first())
        .map(cell_to_string)
        .filter(|name| !name.is_empty())
        .collect();

    debug!(sheet = %sheet, names = names.len(), "read roster spreadsheet");
    Ok(names)
}

/// Write the schedule as a single `Schedule` worksheet with the same columns as the
/// CSV output. Round and group numbers are stored as numbers.
pub fn write_schedule_xlsx(
    path: &Path,
    schedule: &Schedule,
    group_size: usize,
) -> Result<(), ExportError> {
    let rows = to_table(schedule, group_size);
    let width = rows
        .iter()
        .map(|r| r.members.len())
        .max()
        .unwrap_or(0)
        .max(group_size);

    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet("Schedule")
        .map_err(|e| ExportError::Sheet(e.to_string()))?;

    for (col, title) in header(width).into_iter().enumerate() {
        sheet.get_cell_mut((col as u32 + 1, 1)).set_value(title);
    }
    for (i, row) in rows.iter().enumerate() {
        let line = i as u32 + 2;
        sheet
            .get_cell_mut((1, line))
            .set_value_number(row.round_number as f64);
        sheet
            .get_cell_mut((2, line))
            .set_value_number(row.group_number as f64);
        for (m, member) in row.members.iter().enumerate() {
            sheet
                .get_cell_mut((m as u32 + 3, line))
                .set_value(member.as_str());
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|source| ExportError::Xlsx {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), "wrote schedule spreadsheet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::String("  Alice ".to_string())), "Alice");
        assert_eq!(cell_to_string(&Data::Float(1042.0)), "1042");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_is_spreadsheet() {
        assert!(is_spreadsheet(Path::new("players.xlsx")));
        assert!(is_spreadsheet(Path::new("PLAYERS.XLS")));
        assert!(!is_spreadsheet(Path::new("players.txt")));
        assert!(!is_spreadsheet(Path::new("players")));
    }

    #[test]
    fn test_written_schedule_reads_back() {
        use crate::schedule::{Group, Round};

        let group = |m: &[&str]| Group {
            members: m.iter().map(|s| s.to_string()).collect(),
        };
        let schedule = Schedule {
            rounds: vec![
                Round {
                    groups: vec![group(&["a", "b"]), group(&["c", "d"])],
                },
                Round {
                    groups: vec![group(&["a", "c"]), group(&["b", "d"])],
                },
            ],
        };
        let path = std::env::temp_dir().join(format!(
            "group-rotation-schedule-{}.xlsx",
            std::process::id()
        ));

        write_schedule_xlsx(&path, &schedule, 2).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Schedule".to_string()]);
        let range = workbook.worksheet_range("Schedule").unwrap();
        let cells: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cells[0], ["Round", "Group", "Member 1", "Member 2"]);
        assert_eq!(cells[1], ["1", "1", "a", "b"]);
        assert_eq!(cells[4], ["2", "2", "b", "d"]);
        assert_eq!(cells.len(), 5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = read_first_column(Path::new("does-not-exist.xlsx"));
        assert!(matches!(result, Err(RosterError::Spreadsheet { .. })));
    }
}
