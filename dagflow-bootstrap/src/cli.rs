// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parse_cli()                     │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                  │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(name = "dagflow")]
#[command(about = "Reproducible compute-pipeline runtime: DAG execution with content-addressed caching")]
#[command(version = "1.0.1")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (defaults to searching for dagflow.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the CPU concurrency pool size
    #[arg(long)]
    pub max_cpu: Option<u32>,

    /// Override the GPU concurrency pool size
    #[arg(long)]
    pub max_gpu: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a graph to completion
    Run {
        /// Graph file (TOML)
        graph: PathBuf,

        /// Cache directory (defaults to the configured cache_dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Run without a persistent cache backend
        #[arg(long)]
        no_cache: bool,
    },

    /// Expand one node into a parameter sweep, then run the expanded graph
    Sweep {
        /// Graph file (TOML)
        graph: PathBuf,

        /// Node id to sweep
        #[arg(long)]
        node: String,

        /// Grid entry as `key=v1,v2,v3` (repeatable)
        #[arg(long = "grid", value_parser = parse_grid_entry)]
        grid: Vec<(String, String)>,

        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Validate a graph file without running it
    Validate {
        /// Graph file (TOML)
        graph: PathBuf,
    },
}

fn parse_grid_entry(s: &str) -> Result<(String, String), String> {
    let (key, values) = s
        .split_once('=')
        .ok_or_else(|| format!("grid entry '{s}' must be key=v1,v2,..."))?;
    if key.is_empty() || values.is_empty() {
        return Err(format!("grid entry '{s}' must be key=v1,v2,..."));
    }
    Ok((key.to_string(), values.to_string()))
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("unsafe argument rejected: {0}")]
    UnsafeArgument(String),
}

/// Rejects arguments containing shell metacharacters or path traversal
/// sequences before they reach any file-opening or process-spawning code.
pub struct SecureArgParser;

impl SecureArgParser {
    const DANGEROUS_PATTERNS: [&'static str; 6] = ["../", "~", "$(", "`", "|", ";"];

    pub fn validate_argument(value: &str) -> Result<(), ParseError> {
        for pattern in Self::DANGEROUS_PATTERNS {
            if value.contains(pattern) {
                return Err(ParseError::UnsafeArgument(format!("'{value}' contains disallowed sequence '{pattern}'")));
            }
        }
        Ok(())
    }

    pub fn validate_path(value: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(value)?;
        let path = Path::new(value).to_path_buf();
        if !path.exists() {
            return Err(ParseError::PathNotFound(path));
        }
        Ok(path)
    }
}

/// Validated CLI configuration: all paths exist (where required) and all
/// string arguments have passed [`SecureArgParser`].
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub max_cpu: Option<u32>,
    pub max_gpu: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run { graph: PathBuf, cache_dir: Option<PathBuf>, no_cache: bool },
    Sweep { graph: PathBuf, node: String, grid: Vec<(String, String)>, cache_dir: Option<PathBuf> },
    Validate { graph: PathBuf },
}

pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(parse_cli())
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
    }

    if let Some(cpu) = cli.max_cpu {
        if cpu == 0 || cpu > 1024 {
            return Err(ParseError::InvalidValue { arg: "max-cpu".to_string(), reason: "must be between 1 and 1024".to_string() });
        }
    }

    let command = match cli.command {
        Commands::Run { graph, cache_dir, no_cache } => {
            let validated_graph = SecureArgParser::validate_path(&graph.to_string_lossy())?;
            if let Some(ref dir) = cache_dir {
                SecureArgParser::validate_argument(&dir.to_string_lossy())?;
            }
            ValidatedCommand::Run { graph: validated_graph, cache_dir, no_cache }
        }
        Commands::Sweep { graph, node, grid, cache_dir } => {
            let validated_graph = SecureArgParser::validate_path(&graph.to_string_lossy())?;
            SecureArgParser::validate_argument(&node)?;
            if grid.is_empty() {
                return Err(ParseError::InvalidValue { arg: "grid".to_string(), reason: "at least one --grid entry is required".to_string() });
            }
            ValidatedCommand::Sweep { graph: validated_graph, node, grid, cache_dir }
        }
        Commands::Validate { graph } => {
            let validated_graph = SecureArgParser::validate_path(&graph.to_string_lossy())?;
            ValidatedCommand::Validate { graph: validated_graph }
        }
    };

    Ok(ValidatedCli { command, verbose: cli.verbose, config: cli.config, max_cpu: cli.max_cpu, max_gpu: cli.max_gpu })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_traversal() {
        let err = SecureArgParser::validate_argument("../../etc/passwd").unwrap_err();
        assert!(matches!(err, ParseError::UnsafeArgument(_)));
    }

    #[test]
    fn parse_grid_entry_splits_on_equals() {
        assert_eq!(parse_grid_entry("factor=1,2,3").unwrap(), ("factor".to_string(), "1,2,3".to_string()));
        assert!(parse_grid_entry("no-equals-sign").is_err());
    }
}
