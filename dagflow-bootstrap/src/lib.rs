// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Entry point** - Application lifecycle management
//! - **Platform abstraction** - OS-specific operations (POSIX vs Windows)
//! - **Argument parsing** - Secure CLI argument validation
//! - **Error handling** - Unix exit code mapping
//! - **Async coordination** - Shutdown coordination and cancellation
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Module)            │
//! │  - Entry Point                              │
//! │  - Platform Abstraction                     │
//! │  - Secure Arg Parsing                       │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER                   │
//! │  - DagExecutor, GraphLoader, SweepExpander  │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           DOMAIN LAYER                      │
//! │  - Dag, Stage, State, EngineError            │
//! └─────────────────────────────────────────────┘
//!                      ▲
//!                      │
//! ┌─────────────────────────────────────────────┐
//! │       INFRASTRUCTURE LAYER                  │
//! │  - Cache, Scheduler, Metrics, Config         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from Enterprise Layers**
//!    - Bootstrap can access all layers
//!    - Enterprise layers cannot access bootstrap
//!    - Clear architectural boundary
//!
//! 2. **Platform Abstraction**
//!    - Abstract OS-specific functionality behind traits
//!    - POSIX implementation for Linux/macOS
//!    - Windows implementation with cross-platform stubs
//!    - Compile-time platform selection
//!
//! 3. **Graceful Shutdown**
//!    - Cancellation token propagation
//!    - Grace period with timeout enforcement
//!
//! 4. **Security First**
//!    - Input validation for all arguments
//!    - Path traversal prevention
//!
//! 5. **Testability**
//!    - All components behind traits
//!    - No-op implementations for testing
//!
//! ## Module Structure
//!
//! - `platform` - OS abstraction (Unix/Windows)
//! - `cli` - Secure argument parsing
//! - `exit_code` - Unix exit code enumeration
//! - `logger` - Bootstrap-specific logging
//! - `shutdown` - Shutdown coordination

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Parses and validates CLI arguments, the bootstrap layer's entry point.
///
/// The caller is responsible for running the application logic and
/// mapping the result back to an exit code with [`result_to_exit_code`].
///
/// # Errors
///
/// Returns `cli::ParseError` if CLI parsing or validation fails. Clap
/// handles `--help`/`--version` and exits the process itself.
///
/// # Example
///
/// ```no_run
/// use dagflow_bootstrap::{bootstrap_cli, result_to_exit_code};
/// use dagflow_domain::error::EngineError;
///
/// #[tokio::main]
/// async fn main() -> std::process::ExitCode {
///     let validated_cli = match bootstrap_cli() {
///         Ok(cli) => cli,
///         Err(e) => {
///             eprintln!("CLI Error: {}", e);
///             return std::process::ExitCode::from(64); // EX_USAGE
///         }
///     };
///
///     let result = run_application(validated_cli).await;
///     result_to_exit_code(result)
/// }
///
/// async fn run_application(_cli: dagflow_bootstrap::ValidatedCli) -> Result<(), EngineError> {
///     Ok(())
/// }
/// ```
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
