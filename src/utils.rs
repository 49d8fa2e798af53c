use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Opens the map page in the default browser using native commands
pub fn open_browser(url: &str) -> Result<()> {
    browser_command(std::env::consts::OS, url)?
        .spawn()
        .with_context(|| format!("Failed to launch a browser for {}", url))?;
    debug!(url = url, "Browser launched");
    Ok(())
}

fn browser_command(os: &str, url: &str) -> Result<Command> {
    let mut command = match os {
        "macos" => Command::new("open"),
        "windows" => {
            // empty window title, otherwise `start` takes the url as the title
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]);
            cmd
        }
        "linux" => Command::new("xdg-open"),
        other => bail!("No known way to open a browser on {}", other),
    };
    command.arg(url);
    Ok(command)
}
