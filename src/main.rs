use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use csk_sorter::config::{Config, validate_move_log_name};
use csk_sorter::logging::{self, LogLevel, Stage};
use csk_sorter::report::{self, write_summary_json};
use csk_sorter::sites::{self, SiteSet, available_codes};
use csk_sorter::{
    DryRunStore, LocalStore, PassDirection, Plan, Reorganizer, RunOutcome, SceneStore, SortError,
    is_affirmative,
};

/// Sort downloaded CSK scene directories into <site>/<YYYYMMDD>_<site>.
///
/// Run from (or point --dir at) the directory holding the NNNNNN-XXXXX
/// downloads. The three site directories must already exist there.
#[derive(Parser, Debug)]
#[command(name = "csk_sorter", version)]
struct Cli {
    /// Pass direction: asc for ascending data, desc for descending
    direction: String,

    /// Site set: eth for Eyja,Tind,Hekla; nms for nth,mid,sth
    siteset: String,

    /// Working directory holding the scene directories
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Show what would be moved without moving anything
    #[arg(long)]
    dry_run: bool,

    /// TOML file with additional site sets
    #[arg(long)]
    sites_file: Option<PathBuf>,

    /// Diagnostic log file (separate from the move log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Minimum log level: debug, info, warn or error
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Name of the move log inside the working directory
    #[arg(long)]
    move_log: Option<String>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

/// Reports a bad argument the way clap reports its own, then exits.
fn usage_error(error: SortError) -> ! {
    let usage = if matches!(error, SortError::Usage(_)) {
        error
    } else {
        SortError::Usage(error.to_string())
    };
    Cli::command().error(ErrorKind::InvalidValue, usage).exit()
}

fn prompt_operator(plan: &Plan) -> bool {
    report::print_plan(plan);
    print!("If this is all correct, enter 'y' to continue, otherwise enter 'n'\nContinue? (y/n): ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut reply = String::new();
    match io::stdin().lock().read_line(&mut reply) {
        Ok(_) => is_affirmative(&reply),
        Err(_) => false,
    }
}

fn run<S: SceneStore>(
    reorganizer: &mut Reorganizer<S>,
    direction: PassDirection,
    site_set: &SiteSet,
    cli: &Cli,
) -> Result<RunOutcome, SortError> {
    if cli.yes {
        reorganizer.run(direction, site_set, |plan| {
            report::print_plan(plan);
            true
        })
    } else {
        reorganizer.run(direction, site_set, prompt_operator)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_level = cli.log_level.unwrap_or(config.log_level);
    let log_file = cli.log_file.clone().or(config.log_file.clone());
    logging::init_logger(log_level, log_file, false);

    let direction: PassDirection = match cli.direction.parse() {
        Ok(d) => d,
        Err(e) => usage_error(e),
    };

    let extra_sets = match cli.sites_file.as_ref().or(config.sites_file.as_ref()) {
        Some(path) => match sites::load_site_sets(path) {
            Ok(sets) => sets,
            Err(e) => {
                logging::error(Stage::System, None, &e.to_string());
                return ExitCode::FAILURE;
            }
        },
        None => Vec::new(),
    };
    let site_set = match sites::find_site_set(&cli.siteset, &extra_sets) {
        Ok(set) => set,
        Err(e) => usage_error(SortError::Usage(format!(
            "{} (available: {})",
            e,
            available_codes(&extra_sets).join(", ")
        ))),
    };

    let move_log_name = match cli.move_log.as_deref() {
        Some(name) => match validate_move_log_name(name) {
            Ok(name) => name,
            Err(e) => usage_error(e),
        },
        None => config.move_log_name.clone(),
    };

    let root = match std::path::absolute(&cli.dir) {
        Ok(root) => root,
        Err(e) => {
            logging::error(Stage::System, None, &format!("{}: {}", cli.dir.display(), e));
            return ExitCode::FAILURE;
        }
    };

    let outcome = if cli.dry_run {
        logging::info(Stage::System, None, "Dry run. No changes will be written out.");
        let mut reorganizer =
            Reorganizer::new(&root, DryRunStore::new(LocalStore)).with_move_log_name(&move_log_name);
        run(&mut reorganizer, direction, &site_set, &cli)
    } else {
        let mut reorganizer = Reorganizer::new(&root, LocalStore).with_move_log_name(&move_log_name);
        run(&mut reorganizer, direction, &site_set, &cli)
    };

    match outcome {
        Ok(RunOutcome::Declined(_)) => ExitCode::SUCCESS,
        Ok(RunOutcome::Completed(mut summary)) => {
            summary.dry_run = cli.dry_run;
            report::print_summary(&summary);
            if let Some(path) = &cli.summary_json {
                if let Err(e) = write_summary_json(&summary, path) {
                    logging::error(Stage::System, None, &format!("could not write summary: {}", e));
                }
            }
            ExitCode::SUCCESS
        }
        Err(e @ SortError::NoCandidateDirectories(_)) => {
            logging::error(Stage::System, None, &format!("{}; terminating.", e));
            ExitCode::FAILURE
        }
        Err(e) => {
            logging::error(Stage::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}
