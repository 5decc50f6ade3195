use clap::Parser;
use std::path::PathBuf;

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG: &str = "settings.cfg";

/// Log file used when `--log` is not given
pub const DEFAULT_LOG: &str = "program.log";

#[derive(Parser)]
#[command(name = "dirquota")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Keep directories under a size quota by deleting their oldest files",
    long_about = None
)]
pub struct Cli {
    /// Quota config file (key=value lines)
    #[arg(short, long, env = "DIRQUOTA_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log file; events are appended to it
    #[arg(short, long, env = "DIRQUOTA_LOG", default_value = DEFAULT_LOG)]
    pub log: PathBuf,

    /// Show what would be deleted without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Stop evicting in a directory after N consecutive undeletable files
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_denials: Option<u32>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the terminal summary
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["dirquota"]).unwrap();
        if std::env::var_os("DIRQUOTA_CONFIG").is_none() {
            assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG));
        }
        if std::env::var_os("DIRQUOTA_LOG").is_none() {
            assert_eq!(cli.log, PathBuf::from(DEFAULT_LOG));
        }
        assert!(!cli.dry_run);
        assert_eq!(cli.max_denials, None);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "dirquota",
            "-c",
            "/etc/dirquota.cfg",
            "--log",
            "/var/log/dirquota.log",
            "-n",
            "--max-denials",
            "5",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/dirquota.cfg"));
        assert_eq!(cli.log, PathBuf::from("/var/log/dirquota.log"));
        assert!(cli.dry_run);
        assert_eq!(cli.max_denials, Some(5));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_max_denials_must_be_positive() {
        assert!(Cli::try_parse_from(["dirquota", "--max-denials", "0"]).is_err());
    }
}
