//! Unit tests for CLI argument parsing
#[cfg(test)]
mod tests {
	use fscrape::cli::args::{Command, parse_args};

	fn make_args(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn parse_scan_with_roots_and_filters() {
		let argv = make_args(&[
			"fscrape",
			"scan",
			"/home/u/docs",
			"/home/u/pictures",
			"--category",
			"text,image",
			"--skip",
			"/home/u/docs/tmp",
			"--block",
			"/home/u/docs/archive",
			"--skip-name",
			"node_modules",
			"--out",
			"scan.json",
		]);

		let parsed = parse_args(&argv).expect("parse scan args");
		let Command::Scan(scan) = parsed.command else {
			panic!("expected scan command");
		};

		assert_eq!(scan.roots, vec!["/home/u/docs", "/home/u/pictures"]);
		assert_eq!(scan.categories, vec!["text", "image"]);
		assert_eq!(scan.skip, vec!["/home/u/docs/tmp"]);
		assert_eq!(scan.block, vec!["/home/u/docs/archive"]);
		assert_eq!(scan.skip_patterns, vec!["node_modules"]);
		assert_eq!(scan.out.as_deref(), Some("scan.json"));
		assert!(!scan.json);
		assert!(!scan.quiet);
	}

	#[test]
	fn parse_scan_with_reader_override() {
		let argv = make_args(&["fscrape", "scan", "--reader", "posix", "-q", "--json"]);

		let parsed = parse_args(&argv).expect("parse scan args");
		let Command::Scan(scan) = parsed.command else {
			panic!("expected scan command");
		};

		assert!(scan.roots.is_empty());
		assert_eq!(scan.reader_override.as_deref(), Some("posix"));
		assert!(scan.quiet);
		assert!(scan.json);
	}

	#[test]
	fn parse_scan_rejects_zero_progress_interval() {
		let argv = make_args(&["fscrape", "scan", "/tmp", "--progress-interval", "0"]);
		let err = parse_args(&argv).unwrap_err();
		assert!(err.contains("greater than zero"));
	}

	#[test]
	fn parse_scan_accepts_progress_interval() {
		let argv = make_args(&["fscrape", "scan", "/tmp", "--progress-interval", "3"]);
		let Command::Scan(scan) = parse_args(&argv).unwrap().command else {
			panic!("expected scan command");
		};
		assert_eq!(scan.progress_interval_secs, Some(3));
	}

	#[test]
	fn parse_backup_requires_results_file() {
		let argv = make_args(&["fscrape", "backup", "--dest", "/mnt/usb"]);
		let err = parse_args(&argv).unwrap_err();
		assert!(err.contains("RESULTS_FILE"));
	}

	#[test]
	fn parse_backup_with_mode_and_categories() {
		let argv = make_args(&[
			"fscrape",
			"backup",
			"results.json",
			"--dest",
			"/mnt/usb",
			"--mode",
			"preserve-structure",
			"-c",
			"video",
		]);

		let Command::Backup(backup) = parse_args(&argv).unwrap().command else {
			panic!("expected backup command");
		};

		assert_eq!(backup.from_results, "results.json");
		assert_eq!(backup.dest.as_deref(), Some("/mnt/usb"));
		assert_eq!(backup.mode.as_deref(), Some("preserve-structure"));
		assert_eq!(backup.categories, vec!["video"]);
	}

	#[test]
	fn parse_profiles_with_base() {
		let argv = make_args(&["fscrape", "profiles", "--base", "/Users", "--json"]);
		let Command::Profiles(profiles) = parse_args(&argv).unwrap().command else {
			panic!("expected profiles command");
		};
		assert_eq!(profiles.base.as_deref(), Some("/Users"));
		assert!(profiles.json);
	}

	#[test]
	fn missing_option_value_is_an_error() {
		let argv = make_args(&["fscrape", "scan", "/tmp", "--skip"]);
		let err = parse_args(&argv).unwrap_err();
		assert_eq!(err, "--skip requires a value");
	}

	#[test]
	fn unknown_command_and_option_are_errors() {
		assert!(parse_args(&make_args(&["fscrape", "view"])).is_err());
		assert!(parse_args(&make_args(&["fscrape", "scan", "--depth", "3"])).is_err());
		assert!(parse_args(&make_args(&["fscrape"])).is_err());
	}

	#[test]
	fn parse_scan_ignore_downloads_flag() {
		let parsed = parse_args(&make_args(&["fscrape", "scan", "/home/u", "--ignore-downloads"]))
			.expect("parse scan args");
		let Command::Scan(scan) = parsed.command else {
			panic!("expected scan command");
		};

		assert!(scan.ignore_downloads);
		assert_eq!(scan.roots, vec!["/home/u"]);
	}
}
