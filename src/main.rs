//! subnet-upgrade binary entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use subnet_upgrade::cli;
use subnet_upgrade::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = match cli.build_config() {
        Ok(config) => config,
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    };
    config.init_logging();

    let result = tokio::select! {
        result = cli.execute_with_config(config) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{}", "Interrupted".yellow());
            return Ok(());
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
