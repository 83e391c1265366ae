use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use group_rotation::input::{handle_interrupt, read_roster_file, read_roster_from_stdin, Interrupt};
use group_rotation::partition::{CommitPolicy, ScanMode};
use group_rotation::render::{write_report, OutputFormat};
use group_rotation::schedule::{
    build, ScheduleConfig, ScheduleReport, DEFAULT_GROUP_SIZE, DEFAULT_MAX_ATTEMPTS,
};
use group_rotation::spreadsheet::write_schedule_xlsx;
use group_rotation::{Roster, Strategy};

/// Exit status when some rounds could not be generated.
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "group-rotation")]
#[command(about = "Split a roster into equal groups over several rounds without repeats")]
struct Cli {
    /// Number of rounds to schedule
    #[arg(short, long)]
    rounds: usize,

    #[arg(short, long, default_value_t = DEFAULT_GROUP_SIZE)]
    group_size: usize,

    /// Random permutations tried per round before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: usize,

    #[arg(long, value_enum, default_value_t = Strategy::Pairwise)]
    strategy: Strategy,

    #[arg(long, value_enum, default_value_t = ScanMode::BestEffort)]
    scan: ScanMode,

    #[arg(long, value_enum, default_value_t = CommitPolicy::Transactional)]
    commit: CommitPolicy,

    /// Seed for a reproducible schedule
    #[arg(long)]
    seed: Option<u64>,

    /// Roster file: text (one name per line) or a spreadsheet (first column). Reads
    /// stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the schedule here instead of stdout. For xlsx, defaults to
    /// group_schedule_<participants>p_<rounds>r.xlsx
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Ctrl+C during input ends the input; any later Ctrl+C aborts the program.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let reading = Arc::new(AtomicBool::new(true));
    let r = reading.clone();

    ctrlc::set_handler(move || match handle_interrupt(&r) {
        Interrupt::StopInput => eprintln!(
            "\n\nCtrl+C が押されました。入力を終了します...続行するには Enter を押してください。"
        ),
        Interrupt::Exit => {
            eprintln!("\n中断しました。");
            std::process::exit(130);
        }
    })
    .context("failed to install Ctrl+C handler")?;

    Ok(reading)
}

fn load_roster(cli: &Cli, reading: &AtomicBool) -> Result<Roster> {
    let roster = match &cli.input {
        Some(path) => {
            reading.store(false, Ordering::SeqCst);
            read_roster_file(path)?
        }
        None => read_roster_from_stdin(reading).context("failed to read roster from stdin")?,
    };
    reading.store(false, Ordering::SeqCst);
    Ok(roster)
}

fn write_output(cli: &Cli, report: &ScheduleReport, participants: usize) -> Result<()> {
    if cli.format == OutputFormat::Xlsx {
        let path = cli.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "group_schedule_{}p_{}r.xlsx",
                participants, report.requested_rounds
            ))
        });
        write_schedule_xlsx(&path, &report.schedule, cli.group_size)?;
        info!(path = %path.display(), "schedule written");
        return Ok(());
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_report(&mut out, report, cli.format, cli.group_size)?;
            out.flush()?;
            info!(path = %path.display(), "schedule written");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(&mut out, report, cli.format, cli.group_size)?;
        }
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let reading = install_interrupt_handler()?;
    let roster = load_roster(&cli, &reading)?;

    let config = ScheduleConfig {
        group_size: cli.group_size,
        max_attempts: cli.max_attempts,
        strategy: cli.strategy,
        scan: cli.scan,
        commit: cli.commit,
    };
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = build(roster.participants(), cli.rounds, &config, &mut rng)?;
    debug!(repeated_pairs = ?report.schedule.repeated_pairs(), "pair repeats in schedule");

    write_output(&cli, &report, roster.len())?;

    eprintln!("{}", report);
    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL))
    }
}
