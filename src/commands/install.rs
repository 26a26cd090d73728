//! Install command and lifecycle hooks.
//!
//! Both entry points merge CLI flags, environment and the config file into
//! one set of [`InstallOptions`] and hand them to the driverkit installer.

use crate::Context;
use crate::cli::{HookEvent, InstallArgs};
use crate::config::Config;
use crate::paths;
use crate::ui;
use anyhow::{Context as _, Result};
use driverkit::{Endpoints, InstallOptions, InstallOutcome, InstallSource};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Everything one installation run needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: InstallOptions,
    pub endpoints: Endpoints,
}

/// Runs one installation; [`driverkit::install_driver`] outside of tests.
type InstallFn = fn(&InstallOptions, &Endpoints) -> driverkit::Result<InstallOutcome>;

/// Run the install command.
pub fn run(ctx: &Context, config_path: Option<&Path>, args: &InstallArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let settings = settings(args, &config)?;
    execute(ctx, &settings, args.json, driverkit::install_driver)
}

/// Run the installer for a lifecycle event.
///
/// `post-install` and `post-update` share one pipeline; only configuration
/// (file and environment) applies.
pub fn hook(ctx: &Context, config_path: Option<&Path>, event: HookEvent) -> Result<()> {
    run_hook(ctx, config_path, event, driverkit::install_driver)
}

fn run_hook(
    ctx: &Context,
    config_path: Option<&Path>,
    event: HookEvent,
    install: InstallFn,
) -> Result<()> {
    log::info!("Running {} hook", event.name());
    let config = Config::load(config_path)?;
    let settings = settings(&InstallArgs::default(), &config)?;
    execute(ctx, &settings, false, install)
}

/// Merge flags over environment over config over defaults.
pub fn settings(args: &InstallArgs, config: &Config) -> Result<Settings> {
    let bin_dir = paths::bin_dir(args.bin_dir.as_deref(), config.bin_dir.as_deref());
    let cache_dir = paths::cache_dir(args.cache_dir.as_deref(), config.cache_dir.as_deref())?;
    let cache_enabled = paths::cache_enabled(args.no_cache, config.cache);

    let mut options = InstallOptions::new(bin_dir, cache_dir).cache(cache_enabled);
    if let Some(version) = args
        .version
        .as_deref()
        .filter(|v| !v.is_empty())
        .or_else(|| config.requested_version())
    {
        options = options.version(version);
    }
    if let Some(platform) = args.platform.or(config.platform) {
        options = options.platform(platform);
    }

    let endpoints = args
        .base_url
        .as_deref()
        .or(config.base_url.as_deref())
        .map(Endpoints::with_base)
        .unwrap_or_default();

    log::debug!(
        "Install settings: bin_dir={}, cache_dir={}, cache={}, base={}",
        options.bin_dir.display(),
        options.cache_dir.display(),
        options.cache_enabled,
        endpoints.base()
    );

    Ok(Settings { options, endpoints })
}

fn execute(ctx: &Context, settings: &Settings, json: bool, install: InstallFn) -> Result<()> {
    // Log lines and the spinner share stderr; only one of them is shown.
    let spinner = (!ctx.quiet && ctx.verbose == 0 && !json).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Installing ChromeDriver...");
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    let result = install(&settings.options, &settings.endpoints);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if !ctx.quiet {
                ui::error(&err.to_string());
                ui::dim(&format!("{}: {}", err.category(), err.advice()));
            }
            return Err(err).context("ChromeDriver installation failed");
        }
    };

    if json {
        println!("{}", render_json(&outcome)?);
    } else if !ctx.quiet {
        report(&outcome);
    }
    Ok(())
}

fn render_json(outcome: &InstallOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("Failed to serialize install outcome")
}

fn report(outcome: &InstallOutcome) {
    match outcome.source {
        InstallSource::AlreadyInstalled => ui::info(&outcome.to_string()),
        InstallSource::Cache | InstallSource::Download => ui::success(&outcome.to_string()),
    }
    ui::kv("Platform", outcome.platform.display_name());
}

#[cfg(test)]
mod tests {
    use super::*;
    use driverkit::{InstallState, PlatformId};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const QUIET: Context = Context {
        verbose: 0,
        quiet: true,
    };

    /// Every call the fake installer received.
    static CALLS: Mutex<Vec<(InstallOptions, Endpoints)>> = Mutex::new(Vec::new());

    fn fake_install(
        options: &InstallOptions,
        endpoints: &Endpoints,
    ) -> driverkit::Result<InstallOutcome> {
        CALLS.lock().unwrap().push((options.clone(), endpoints.clone()));
        if options.version.as_deref() == Some("broken") {
            return Err(driverkit::Error::InvalidVersion("broken".to_string()));
        }
        Ok(InstallOutcome {
            version: options.version.clone().unwrap_or_default(),
            platform: options.platform.unwrap_or_default(),
            path: options.bin_dir.join("chromedriver"),
            source: InstallSource::Download,
            states: vec![InstallState::ResolvingVersion, InstallState::Done],
        })
    }

    fn last_call_for(version: &str) -> Option<(InstallOptions, Endpoints)> {
        CALLS
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(options, _)| options.version.as_deref() == Some(version))
            .cloned()
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("chromedriver.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_hook_installs_from_config() {
        let temp = tempfile::tempdir().unwrap();
        let config = write_config(
            temp.path(),
            r#"
chromedriver-version = "2.38"
platform = "mac64"
base-url = "https://mirror.example.com/"
cache-dir = "/tmp/chromedriver-cache"
"#,
        );

        for event in [HookEvent::PostInstall, HookEvent::PostUpdate] {
            run_hook(&QUIET, Some(&config), event, fake_install).unwrap();
        }

        let (options, endpoints) = last_call_for("2.38").unwrap();
        assert_eq!(options.platform, Some(PlatformId::Mac64));
        assert_eq!(endpoints.base(), "https://mirror.example.com");
    }

    #[test]
    fn test_hook_reports_install_failure() {
        let temp = tempfile::tempdir().unwrap();
        let config = write_config(temp.path(), "chromedriver-version = \"broken\"\n");

        let err = run_hook(&QUIET, Some(&config), HookEvent::PostUpdate, fake_install).unwrap_err();

        assert!(err.to_string().contains("ChromeDriver installation failed"));
        assert!(last_call_for("broken").is_some());
    }

    #[test]
    fn test_hook_missing_config_fails_before_install() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing.toml");

        assert!(run_hook(&QUIET, Some(&missing), HookEvent::PostInstall, fake_install).is_err());
    }

    fn args_with_dirs() -> InstallArgs {
        InstallArgs {
            bin_dir: Some(PathBuf::from("/flag/bin")),
            cache_dir: Some(PathBuf::from("/flag/cache")),
            ..InstallArgs::default()
        }
    }

    #[test]
    fn test_settings_flags_override_config() {
        let config = Config {
            chromedriver_version: Some("2.40".to_string()),
            bin_dir: Some("/config/bin".to_string()),
            base_url: Some("https://mirror.example.com".to_string()),
            platform: Some(PlatformId::Mac64),
            ..Config::default()
        };
        let args = InstallArgs {
            version: Some("2.41".to_string()),
            platform: Some(PlatformId::Win32),
            base_url: Some("https://flag.example.com/".to_string()),
            no_cache: true,
            ..args_with_dirs()
        };

        let settings = settings(&args, &config).unwrap();
        assert_eq!(settings.options.version.as_deref(), Some("2.41"));
        assert_eq!(settings.options.bin_dir, PathBuf::from("/flag/bin"));
        assert_eq!(settings.options.cache_dir, PathBuf::from("/flag/cache"));
        assert_eq!(settings.options.platform, Some(PlatformId::Win32));
        assert!(!settings.options.cache_enabled);
        assert_eq!(settings.endpoints.base(), "https://flag.example.com");
    }

    #[test]
    fn test_settings_fall_back_to_config() {
        let config = Config {
            version: Some("2.39".to_string()),
            platform: Some(PlatformId::Linux32),
            base_url: Some("https://mirror.example.com".to_string()),
            ..Config::default()
        };

        let settings = settings(&args_with_dirs(), &config).unwrap();
        assert_eq!(settings.options.version.as_deref(), Some("2.39"));
        assert_eq!(settings.options.platform, Some(PlatformId::Linux32));
        assert_eq!(settings.endpoints.base(), "https://mirror.example.com");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = settings(&args_with_dirs(), &Config::default()).unwrap();
        assert!(settings.options.version.is_none());
        assert!(settings.options.platform.is_none());
        assert_eq!(settings.endpoints, Endpoints::default());
    }

    #[test]
    fn test_render_json() {
        let outcome = InstallOutcome {
            version: "2.41".to_string(),
            platform: PlatformId::Linux64,
            path: PathBuf::from("vendor/bin/chromedriver"),
            source: InstallSource::Download,
            states: vec![InstallState::ResolvingVersion, InstallState::Done],
        };

        let json = render_json(&outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "2.41");
        assert_eq!(value["platform"], "linux64");
        assert_eq!(value["source"], "download");
        assert_eq!(value["states"][0], "resolving-version");
    }
}
