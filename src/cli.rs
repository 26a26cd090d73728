use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use driverkit::PlatformId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chromedriver-installer")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Install the right ChromeDriver into your project", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./chromedriver.toml if present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download, verify and install ChromeDriver
    Install(InstallArgs),

    /// Run the installer for a package-manager lifecycle event
    Hook {
        /// Event that triggered the hook
        #[arg(value_enum)]
        event: HookEvent,
    },

    /// Show the detected platform and the files it maps to
    Platform,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Default)]
pub struct InstallArgs {
    /// Version to install (default: latest release)
    #[arg(long = "chromedriver-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Directory to install the executable into
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Cache directory for downloaded archives
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Always download, never reuse a cached archive
    #[arg(long)]
    pub no_cache: bool,

    /// Install the build for this platform instead of the host's
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<PlatformId>,

    /// Release server base URL (mirrors)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Lifecycle events that trigger an install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookEvent {
    PostInstall,
    PostUpdate,
}

impl HookEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::PostInstall => "post-install",
            Self::PostUpdate => "post-update",
        }
    }
}

fn parse_platform(s: &str) -> Result<PlatformId, String> {
    s.parse::<PlatformId>().map_err(|e| e.to_string())
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
    fn test_parse_install_flags() {
        let cli = Cli::try_parse_from([
            "chromedriver-installer",
            "-vv",
            "install",
            "--chromedriver-version",
            "2.41",
            "--bin-dir",
            "bin",
            "--no-cache",
            "--platform",
            "linux64",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.version.as_deref(), Some("2.41"));
        assert_eq!(args.bin_dir, Some(PathBuf::from("bin")));
        assert!(args.no_cache);
        assert_eq!(args.platform, Some(PlatformId::Linux64));
        assert!(args.json);
    }

    #[test]
    fn test_parse_rejects_unknown_platform() {
        let result = Cli::try_parse_from([
            "chromedriver-installer",
            "install",
            "--platform",
            "solaris",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_hook_events() {
        let cli = Cli::try_parse_from(["chromedriver-installer", "hook", "post-update"]).unwrap();
        let Command::Hook { event } = cli.command else {
            panic!("expected hook");
        };
        assert_eq!(event, HookEvent::PostUpdate);
        assert_eq!(event.name(), "post-update");

        assert!(Cli::try_parse_from(["chromedriver-installer", "hook", "pre-install"]).is_err());
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["chromedriver-installer", "platform", "-c", "ci.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
    }
}
