// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `dagflow` binary entry point: parses and validates CLI arguments
//! through the bootstrap layer, initializes logging, then hands off to
//! [`dagflow::presentation::run_command`].

use dagflow::infrastructure::config::{ConfigService, LoggingSettings};
use dagflow::infrastructure::logging;
use dagflow::presentation::run_command;
use dagflow_bootstrap::{bootstrap_cli, result_to_exit_code};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("dagflow: {e}");
            return std::process::ExitCode::from(64); // EX_USAGE
        }
    };

    let mut logging_settings = ConfigService::load(cli.config.as_deref())
        .map(|cfg| cfg.logging)
        .unwrap_or_else(|_| LoggingSettings::default());
    if cli.verbose {
        logging_settings.level = "debug".to_string();
    }
    logging::init(&logging_settings);

    result_to_exit_code(run_command(cli).await)
}
