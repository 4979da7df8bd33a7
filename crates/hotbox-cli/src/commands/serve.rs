//! The `hotbox` command: load config, start the loops, serve until Ctrl+C.

use std::process::Command;

use tokio::signal;

use crate::cli::Cli;
use crate::config::ServerConfig;
use crate::dev::{DevServer, DevServerState};
use crate::error::Result;
use crate::ui;

/// Run the development server.
///
/// # Errors
///
/// Fails on invalid configuration, a missing root directory, a watcher that
/// cannot start, or an address that cannot be bound. Nothing after startup
/// is fatal.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = ServerConfig::load(&cli)?;
    let root = config.resolved_root()?;
    tracing::debug!(?config, root = %root.display(), "configuration loaded");

    let state = DevServerState::spawn(root.clone(), &config)?;
    let server = DevServer::new(config.addr.clone(), state.clone());
    let listener = server.bind().await?;

    let url = config.server_url();
    ui::success(&format!("Serving {} at {}", root.display(), url));
    if config.open {
        open_browser(&url);
    }
    ui::info("Press Ctrl+C to stop");

    let shutdown = async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        ui::info("Shutting down development server...");
        // Ends every SSE stream so the graceful drain can finish
        state.shutdown();
    };

    server.serve(listener, shutdown).await?;
    ui::success("Development server stopped");
    Ok(())
}

/// The platform command that opens `url` in the default browser.
fn open_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("rundll32");
        command.args(["url.dll,FileProtocolHandler", url]);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    }
}

fn open_browser(url: &str) {
    match open_command(url).spawn() {
        Ok(_) => tracing::debug!(url, "opened browser"),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_command_passes_url() {
        let command = open_command("http://localhost:8080");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args.last().unwrap().to_str(), Some("http://localhost:8080"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_command_linux() {
        assert_eq!(open_command("http://localhost:8080").get_program(), "xdg-open");
    }
}
