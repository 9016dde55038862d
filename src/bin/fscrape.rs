//! File scrape CLI (fscrape) - Main binary entry point

use fscrape::cli::args::{BackupArgs, Command, ProfilesArgs, ScanArgs, parse_args};
use fscrape::cli::interrupt::cancel_on_interrupt;
use fscrape::cli::output::{
    format_backup_json, format_profiles_json, format_scan_json, print_backup_text,
    print_profiles_text, print_scan_text,
};
use fscrape::config::{DEFAULT_SETTINGS_FILE, Settings};
use fscrape::io::results::{read_results, write_results};
use fscrape::services::filter::FilterEngine;
use fscrape::services::format::{format_elapsed, format_size};
use fscrape::services::profiles::{default_profiles_base, discover_profiles};
use fscrape::{
    BackupPlan, Category, Controller, Outcome, PlacementMode, ProgressEvent, ProgressReceiver,
    ReaderKind, RunState,
};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_RESULTS_FILE: &str = "results.json";

const EXIT_OK: i32 = 0;
const EXIT_INVALID_INPUT: i32 = 2;
const EXIT_PARTIAL_FAILURE: i32 = 3;
const EXIT_ERROR: i32 = 4;
const EXIT_CANCELLED: i32 = 130;

fn main() {
    // Initialize logger (controlled by RUST_LOG environment variable)
    // Example: RUST_LOG=debug fscrape scan ~/Documents
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "--help" | "-h" => {
            print_help();
            return;
        }
        "--version" | "-v" => {
            print_version();
            return;
        }
        _ => {}
    }

    let cli_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            process::exit(EXIT_INVALID_INPUT);
        }
    };

    let exit_code = match &cli_args.command {
        Command::Scan(scan_args) => handle_scan(scan_args),
        Command::Backup(backup_args) => handle_backup(backup_args),
        Command::Profiles(profiles_args) => handle_profiles(profiles_args),
    };

    process::exit(exit_code);
}

fn load_settings(path: Option<&str>) -> Result<Settings, i32> {
    let path = Path::new(path.unwrap_or(DEFAULT_SETTINGS_FILE));
    Settings::load(path).map_err(|e| {
        eprintln!("Error: could not load settings from {}: {e}", path.display());
        EXIT_INVALID_INPUT
    })
}

fn parse_categories(labels: &[String]) -> Result<Vec<Category>, i32> {
    labels
        .iter()
        .map(|label| {
            Category::from_str(label).map_err(|e| {
                eprintln!("Error: {e}");
                EXIT_INVALID_INPUT
            })
        })
        .collect()
}

fn handle_scan(args: &ScanArgs) -> i32 {
    let mut settings = match load_settings(args.settings.as_deref()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Explicit roots on the command line replace profile selection
    if !args.roots.is_empty() {
        settings.roots = args.roots.iter().map(PathBuf::from).collect();
        settings.users.clear();
    }
    if !args.categories.is_empty() {
        settings.categories = match parse_categories(&args.categories) {
            Ok(c) => c,
            Err(code) => return code,
        };
    }
    settings.skip.extend(args.skip.iter().map(PathBuf::from));
    settings.block.extend(args.block.iter().map(PathBuf::from));
    settings.skip_patterns.extend(args.skip_patterns.iter().cloned());
    settings.ignore_downloads |= args.ignore_downloads;

    if let Some(label) = args.reader_override.as_deref() {
        match ReaderKind::from_str(label) {
            Ok(kind) => settings.reader = Some(kind),
            Err(err) => {
                eprintln!("Error: {err}");
                return EXIT_INVALID_INPUT;
            }
        }
    }

    let mut config = settings.to_scan_config();
    if let Some(interval_secs) = args.progress_interval_secs {
        config.progress_interval = Duration::from_secs(interval_secs);
        config.progress_entry_trigger = 0;
    }

    if let Err(e) = config.validate().and_then(|()| FilterEngine::new(&config).map(|_| ())) {
        eprintln!("Error: {e}");
        return EXIT_INVALID_INPUT;
    }

    if !args.quiet {
        for root in &config.roots {
            eprintln!("Scanning: {}", root.display());
        }
    }

    let controller = Arc::new(Controller::new());
    install_interrupt_handler(&controller);
    let receiver = match controller.start_scan(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_ERROR;
        }
    };
    drain_progress(&receiver, args.quiet);

    let (result, cancelled) = match controller.wait() {
        RunState::Completed(Outcome::Scan(result)) => (result, false),
        RunState::Cancelled(Outcome::Scan(result)) => (result, true),
        RunState::Failed(message) => {
            eprintln!("Error: {message}");
            return EXIT_ERROR;
        }
        other => {
            eprintln!("Error: unexpected scan state {other:?}");
            return EXIT_ERROR;
        }
    };

    let out = args.out.as_deref().unwrap_or(DEFAULT_RESULTS_FILE);
    if let Err(e) = write_results(Path::new(out), &result) {
        eprintln!("Error: Failed to save results: {e}");
        return EXIT_ERROR;
    }
    if !args.quiet {
        eprintln!("Results saved: {out} ({} records)", result.records.len());
    }

    if args.json {
        println!("{}", format_scan_json(&result));
    } else {
        print_scan_text(&result);
    }

    if cancelled {
        EXIT_CANCELLED
    } else if result.errors.is_empty() {
        EXIT_OK
    } else {
        EXIT_PARTIAL_FAILURE
    }
}

fn handle_backup(args: &BackupArgs) -> i32 {
    let settings = match load_settings(args.settings.as_deref()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mode = match args.mode.as_deref() {
        Some(label) => match PlacementMode::from_str(label) {
            Ok(m) => m,
            Err(err) => {
                eprintln!("Error: {err}");
                return EXIT_INVALID_INPUT;
            }
        },
        None => settings.placement,
    };

    let categories = match parse_categories(&args.categories) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let scan = match read_results(Path::new(&args.from_results)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading results: {e}");
            return EXIT_ERROR;
        }
    };

    let base = args
        .dest
        .as_ref()
        .map_or_else(|| settings.backup_base.clone(), PathBuf::from);
    let plan = match BackupPlan::from_scan(&scan, &categories, mode, &base) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error creating backup folder in {}: {e}", base.display());
            return EXIT_ERROR;
        }
    };

    if !args.quiet {
        eprintln!(
            "Backing up {} file(s), {} to {}",
            plan.records().len(),
            format_size(plan.total_bytes()),
            plan.destination().display()
        );
    }

    let controller = Arc::new(Controller::new());
    install_interrupt_handler(&controller);
    let receiver = match controller.start_backup(plan) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_ERROR;
        }
    };
    drain_progress(&receiver, args.quiet);

    let (report, cancelled) = match controller.wait() {
        RunState::Completed(Outcome::Backup(report)) => (report, false),
        RunState::Cancelled(Outcome::Backup(report)) => (report, true),
        RunState::Failed(message) => {
            eprintln!("Error: {message}");
            return EXIT_ERROR;
        }
        other => {
            eprintln!("Error: unexpected backup state {other:?}");
            return EXIT_ERROR;
        }
    };

    if args.json {
        println!("{}", format_backup_json(&report));
    } else {
        print_backup_text(&report);
    }

    if cancelled {
        EXIT_CANCELLED
    } else if report.failures.is_empty() {
        EXIT_OK
    } else {
        EXIT_PARTIAL_FAILURE
    }
}

fn handle_profiles(args: &ProfilesArgs) -> i32 {
    let base = args
        .base
        .as_ref()
        .map_or_else(default_profiles_base, PathBuf::from);

    let profiles = match discover_profiles(&base) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: could not list {}: {e}", base.display());
            return EXIT_ERROR;
        }
    };

    if args.json {
        println!("{}", format_profiles_json(&profiles));
    } else {
        print_profiles_text(&profiles);
    }

    EXIT_OK
}

/// Ctrl-C cancels the run; it then ends with `EXIT_CANCELLED`.
fn install_interrupt_handler(controller: &Arc<Controller>) {
    if let Err(e) = cancel_on_interrupt(controller) {
        log::warn!("{e}");
    }
}

/// Print throttled progress to stderr until the terminal event arrives.
fn drain_progress(receiver: &ProgressReceiver, quiet: bool) {
    let mut matches = 0u64;
    let mut current = None;

    for event in receiver.iter() {
        match event {
            ProgressEvent::Visiting(path) => current = Some(path),
            ProgressEvent::Counts(counts) => matches = counts.values().sum(),
            ProgressEvent::Transferred { files, bytes } => {
                if !quiet {
                    eprintln!("  {files} file(s), {} copied", format_size(bytes));
                }
            }
            ProgressEvent::Elapsed(elapsed) => {
                if !quiet {
                    let location = current
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    eprintln!("[{}] {matches} match(es) {location}", format_elapsed(elapsed));
                }
            }
            ProgressEvent::Error { path, kind } => {
                if !quiet {
                    eprintln!("  {kind}: {}", path.display());
                }
            }
            ProgressEvent::Done(_) | ProgressEvent::Cancelled(_) | ProgressEvent::Failed(_) => {
                break;
            }
        }
    }
}

fn print_help() {
    println!("File scrape CLI (fscrape) - Find files by category and back them up");
    println!();
    println!("USAGE:");
    println!("    fscrape scan [ROOT...] [OPTIONS]");
    println!("    fscrape backup <RESULTS_FILE> [OPTIONS]");
    println!("    fscrape profiles [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    scan      Walk roots, classify files, and save the results");
    println!("    backup    Copy files from a results file into a timestamped folder");
    println!("    profiles  List user profiles that can be scanned");
    println!();
    println!("GLOBAL OPTIONS:");
    println!("    -h, --help                 Show this help message");
    println!("    -v, --version              Show version information");
    println!();
    println!("SCAN OPTIONS:");
    println!("    --settings <FILE>         Settings file (default: {DEFAULT_SETTINGS_FILE})");
    println!("    -c, --category <LIST>     Categories to collect, comma separated");
    println!("    --skip <DIR>              Never descend into DIR (repeatable)");
    println!("    --block <DIR>             Walk DIR but hide its files (repeatable)");
    println!("    --skip-name <PATTERN>     Skip folders whose name matches PATTERN");
    println!("    --ignore-downloads        Skip Downloads folders");
    println!("    -o, --out <FILE>          Results file (default: {DEFAULT_RESULTS_FILE})");
    println!("    --reader <NAME>           Directory reader: legacy|posix (aliases: std, unix)");
    println!("    --progress-interval <S>   Emit progress updates every S seconds");
    println!("    --json                    Emit machine-readable summary");
    println!("    -q, --quiet               Suppress progress output");
    println!();
    println!("BACKUP OPTIONS:");
    println!("    -d, --dest <DIR>          Backup base folder (default from settings)");
    println!("    --mode <MODE>             by-category (default) or preserve-structure");
    println!("    -c, --category <LIST>     Only back up these categories");
    println!("    --settings <FILE>         Settings file (default: {DEFAULT_SETTINGS_FILE})");
    println!("    --json                    Emit machine-readable report");
    println!("    -q, --quiet               Suppress progress output");
    println!();
    println!("PROFILES OPTIONS:");
    println!("    --base <DIR>              Folder holding user profiles");
    println!("    --json                    Emit machine-readable output");
    println!();
    println!("EXIT CODES:");
    println!("    0 success, 2 invalid input, 3 completed with errors, 4 failure,");
    println!("    130 cancelled (Ctrl-C; partial results are still saved)");
    println!();
    println!("EXAMPLES:");
    println!("    fscrape scan ~/Documents --category text,image --skip ~/Documents/tmp");
    println!("    fscrape backup results.json --dest /mnt/usb --mode preserve-structure");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DATE: &str = env!("GIT_DATE");
    const BUILD_TARGET: &str = env!("BUILD_TARGET");

    println!("fscrape {VERSION}");
    println!("Commit: {GIT_HASH} ({GIT_DATE})");
    println!("Target: {BUILD_TARGET}");

    #[cfg(debug_assertions)]
    println!("Build: debug");
    #[cfg(not(debug_assertions))]
    println!("Build: release");
}
