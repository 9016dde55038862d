//! CLI argument parsing

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Scan(ScanArgs),
    Backup(BackupArgs),
    Profiles(ProfilesArgs),
}

#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    pub roots: Vec<String>,
    pub settings: Option<String>,
    pub categories: Vec<String>,
    pub skip: Vec<String>,
    pub block: Vec<String>,
    pub skip_patterns: Vec<String>,
    pub ignore_downloads: bool,
    pub out: Option<String>,
    pub reader_override: Option<String>,
    pub progress_interval_secs: Option<u64>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BackupArgs {
    pub from_results: String,
    pub dest: Option<String>,
    pub mode: Option<String>,
    pub categories: Vec<String>,
    pub settings: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilesArgs {
    pub base: Option<String>,
    pub json: bool,
}

/// Parse command line arguments
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    let command = match args[1].as_str() {
        "scan" => Command::Scan(parse_scan_args(&args[2..])?),
        "backup" => Command::Backup(parse_backup_args(&args[2..])?),
        "profiles" => Command::Profiles(parse_profiles_args(&args[2..])?),
        _ => return Err(format!("Unknown command: {}", args[1])),
    };

    Ok(CliArgs { command })
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_scan_args(args: &[String]) -> Result<ScanArgs, String> {
    let mut scan_args = ScanArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--settings" => scan_args.settings = Some(take_value(args, &mut i, "--settings")?),
            "--category" | "-c" => {
                let value = take_value(args, &mut i, "--category")?;
                scan_args
                    .categories
                    .extend(value.split(',').filter(|c| !c.is_empty()).map(str::to_string));
            }
            "--skip" => scan_args.skip.push(take_value(args, &mut i, "--skip")?),
            "--block" => scan_args.block.push(take_value(args, &mut i, "--block")?),
            "--skip-name" => scan_args
                .skip_patterns
                .push(take_value(args, &mut i, "--skip-name")?),
            "--ignore-downloads" => scan_args.ignore_downloads = true,
            "--out" | "-o" => scan_args.out = Some(take_value(args, &mut i, "--out")?),
            "--reader" => scan_args.reader_override = Some(take_value(args, &mut i, "--reader")?),
            "--progress-interval" => {
                let secs: u64 = take_value(args, &mut i, "--progress-interval")?
                    .parse()
                    .map_err(|_| "--progress-interval must be a positive integer".to_string())?;
                if secs == 0 {
                    return Err("--progress-interval must be greater than zero".to_string());
                }
                scan_args.progress_interval_secs = Some(secs);
            }
            "--json" => scan_args.json = true,
            "--quiet" | "-q" => scan_args.quiet = true,
            arg if !arg.starts_with('-') => scan_args.roots.push(arg.to_string()),
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    Ok(scan_args)
}

fn parse_backup_args(args: &[String]) -> Result<BackupArgs, String> {
    let mut backup_args = BackupArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--dest" | "-d" => backup_args.dest = Some(take_value(args, &mut i, "--dest")?),
            "--mode" => backup_args.mode = Some(take_value(args, &mut i, "--mode")?),
            "--category" | "-c" => {
                let value = take_value(args, &mut i, "--category")?;
                backup_args
                    .categories
                    .extend(value.split(',').filter(|c| !c.is_empty()).map(str::to_string));
            }
            "--settings" => backup_args.settings = Some(take_value(args, &mut i, "--settings")?),
            "--json" => backup_args.json = true,
            "--quiet" | "-q" => backup_args.quiet = true,
            arg if !arg.starts_with('-') => {
                if backup_args.from_results.is_empty() {
                    backup_args.from_results = arg.to_string();
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if backup_args.from_results.is_empty() {
        return Err("Missing required argument: RESULTS_FILE".to_string());
    }

    Ok(backup_args)
}

fn parse_profiles_args(args: &[String]) -> Result<ProfilesArgs, String> {
    let mut profiles_args = ProfilesArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--base" => profiles_args.base = Some(take_value(args, &mut i, "--base")?),
            "--json" => profiles_args.json = true,
            other => return Err(format!("Unknown option: {other}")),
        }
        i += 1;
    }

    Ok(profiles_args)
}
