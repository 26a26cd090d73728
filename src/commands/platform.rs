//! Show the detected platform.

use crate::Context;
use crate::ui;
use anyhow::Result;
use driverkit::{PlatformId, platform};

pub fn run(ctx: &Context) -> Result<()> {
    let detected = platform::detect();
    if ctx.quiet {
        println!("{detected}");
        return Ok(());
    }

    ui::header("Platform");
    for (key, value) in describe(detected) {
        ui::kv(key, &value);
    }
    if !detected.is_known() {
        println!();
        ui::warn("No ChromeDriver build is published for this host.");
    }
    Ok(())
}

fn describe(detected: PlatformId) -> Vec<(&'static str, String)> {
    let unavailable = |_: driverkit::Error| "-".to_string();
    vec![
        ("OS", platform::host_os_name().to_string()),
        ("Pointer width", format!("{} bits", usize::BITS)),
        ("Platform", detected.to_string()),
        ("Name", detected.display_name().to_string()),
        (
            "Archive",
            platform::remote_file_name(detected).map_or_else(unavailable, str::to_string),
        ),
        (
            "Executable",
            platform::executable_file_name(detected).map_or_else(unavailable, str::to_string),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_platform() {
        let rows = describe(PlatformId::Win32);
        let value = |key| rows.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(value("Platform"), Some("win32"));
        assert_eq!(value("Name"), Some("Windows"));
        assert_eq!(value("Archive"), Some("chromedriver_win32.zip"));
        assert_eq!(value("Executable"), Some("chromedriver.exe"));
    }

    #[test]
    fn test_describe_unknown_platform() {
        let rows = describe(PlatformId::Unknown);
        let value = |key| rows.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(value("Platform"), Some("unknown"));
        assert_eq!(value("Archive"), Some("-"));
        assert_eq!(value("Executable"), Some("-"));
    }
}
