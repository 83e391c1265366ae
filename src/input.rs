use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::RosterError;
use crate::roster::{CommandOutcome, Roster, RosterCommand};
use crate::spreadsheet;

/// Whether stdin is an interactive terminal.
#[cfg(unix)]
pub fn stdin_is_tty() -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::isatty(io::stdin().as_raw_fd()) == 1 }
}

#[cfg(windows)]
pub fn stdin_is_tty() -> bool {
    use std::os::windows::io::AsRawHandle;

    #[link(name = "kernel32")]
    extern "system" {
        fn GetConsoleMode(console: *mut std::ffi::c_void, mode: *mut u32) -> i32;
    }

    let handle = io::stdin().as_raw_handle();
    let mut mode: u32 = 0;
    // GetConsoleMode returns 0 if the handle is not a console
    unsafe { GetConsoleMode(handle as *mut std::ffi::c_void, &mut mode) != 0 }
}

#[cfg(not(any(unix, windows)))]
pub fn stdin_is_tty() -> bool {
    false
}

fn print_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "参加者の名前を入力してください (1行に1人):")?;
    writeln!(out, "  - Ctrl+D (Unix/Mac) または Ctrl+Z+Enter (Windows): 入力を終了")?;
    writeln!(out, "  - Ctrl+C: 入力を中断 (それまでの入力は保持されます)")?;
    writeln!(out, "  - 'delete:名前' で削除、'exclude:名前' で除外、'include:名前' で再追加")?;
    writeln!(out)
}

fn report<W: Write>(out: &mut W, command: &RosterCommand, outcome: CommandOutcome) -> io::Result<()> {
    match (command, outcome) {
        (RosterCommand::Add(name), CommandOutcome::Added) => writeln!(out, "  追加: {}", name),
        (RosterCommand::Add(name), CommandOutcome::Duplicate) => {
            writeln!(out, "  ✗ {} はすでに登録されています", name)
        }
        (RosterCommand::Delete(name), CommandOutcome::Deleted) => {
            writeln!(out, "  ✓ 削除しました: {}", name)
        }
        (RosterCommand::Exclude(name), CommandOutcome::Moved) => {
            writeln!(out, "  ✓ 除外しました: {}", name)
        }
        (RosterCommand::Include(name), CommandOutcome::Moved) => {
            writeln!(out, "  ✓ 再追加しました: {}", name)
        }
        (
            RosterCommand::Delete(name) | RosterCommand::Exclude(name) | RosterCommand::Include(name),
            CommandOutcome::NotFound,
        ) => writeln!(out, "  ✗ エラー: {} は見つかりませんでした", name),
        _ => Ok(()),
    }
}

/// What a Ctrl+C should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Stop reading input and keep what was entered.
    StopInput,
    /// Input is already over; terminate the process.
    Exit,
}

/// Decide how to react to Ctrl+C. `reading` is true only while roster input is
/// being collected and is cleared by the first interrupt.
pub fn handle_interrupt(reading: &AtomicBool) -> Interrupt {
    if reading.swap(false, Ordering::SeqCst) {
        Interrupt::StopInput
    } else {
        Interrupt::Exit
    }
}

/// Apply every line of `reader` to `roster` until EOF or until `running` is cleared.
///
/// In interactive mode each line gets a short confirmation on `feedback`; otherwise
/// problems are only logged.
pub fn read_roster<R: BufRead, W: Write>(
    reader: R,
    roster: &mut Roster,
    interactive: bool,
    feedback: &mut W,
    running: &AtomicBool,
) -> io::Result<()> {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let line = line?;
        let Some(command) = RosterCommand::parse(&line) else {
            continue;
        };

        let outcome = roster.apply(&command);
        if interactive {
            report(feedback, &command, outcome)?;
        } else if matches!(outcome, CommandOutcome::Duplicate | CommandOutcome::NotFound) {
            warn!(line = %line.trim(), ?outcome, "roster line had no effect");
        }
    }
    Ok(())
}

/// Read the roster from stdin, prompting on stderr when attached to a terminal.
///
/// Stdout is left untouched so it can carry the schedule.
pub fn read_roster_from_stdin(running: &AtomicBool) -> io::Result<Roster> {
    let interactive = stdin_is_tty();
    let mut feedback = io::stderr();
    if interactive {
        print_prompt(&mut feedback)?;
    }

    let mut roster = Roster::new();
    read_roster(io::stdin().lock(), &mut roster, interactive, &mut feedback, running)?;

    if interactive {
        writeln!(
            feedback,
            "\n登録人数: {} 人 (除外: {} 人)",
            roster.len(),
            roster.excluded().len()
        )?;
    }
    Ok(roster)
}

/// Load a roster from a text file (one command per line) or a spreadsheet.
pub fn read_roster_file(path: &Path) -> Result<Roster, RosterError> {
    let roster = if spreadsheet::is_spreadsheet(path) {
        Roster::from_names(spreadsheet::read_first_column(path)?)
    } else {
        let io_error = |source: io::Error| RosterError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let mut roster = Roster::new();
        let running = AtomicBool::new(true);
        read_roster(BufReader::new(file), &mut roster, false, &mut io::sink(), &running).map_err(io_error)?;
        roster
    };

    info!(
        path = %path.display(),
        included = roster.len(),
        excluded = roster.excluded().len(),
        "loaded roster"
    );
    Ok(roster)
}
