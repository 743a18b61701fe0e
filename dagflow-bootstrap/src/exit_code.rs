// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Mapping
//!
//! Maps a run's `Result` onto the `sysexits.h` convention so shell
//! pipelines and CI steps can branch on failure category without parsing
//! stderr.

use dagflow_domain::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Ok = 0,
    /// Command line usage error (`EX_USAGE`).
    Usage = 64,
    /// Input data was invalid (`EX_DATAERR`).
    DataErr = 65,
    /// Input file did not exist or was unreadable (`EX_NOINPUT`).
    NoInput = 66,
    /// Internal software error (`EX_SOFTWARE`).
    Software = 70,
    /// Temporary failure, retry may succeed (`EX_TEMPFAIL`).
    TempFail = 75,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Categorizes an [`EngineError`] into the exit code a shell caller
/// should see.
pub fn map_error_to_exit_code(err: &EngineError) -> ExitCode {
    match err {
        EngineError::DuplicateNode(_)
        | EngineError::MissingDependency { .. }
        | EngineError::Cycle(_)
        | EngineError::DagInput(_)
        | EngineError::InvalidConfiguration(_) => ExitCode::DataErr,
        EngineError::Io(_) => ExitCode::NoInput,
        EngineError::SchedulerTimeout(_) | EngineError::SchedulerRetry { .. } => ExitCode::TempFail,
        EngineError::StageContract(_) | EngineError::SchedulerError(_) | EngineError::Serialization(_) | EngineError::Internal(_) => {
            ExitCode::Software
        }
    }
}

/// Converts a run's top-level `Result` into the process exit code `main`
/// should return, printing the error to stderr on failure.
pub fn result_to_exit_code<T>(result: Result<T, EngineError>) -> std::process::ExitCode {
    match result {
        Ok(_) => std::process::ExitCode::from(ExitCode::Ok),
        Err(err) => {
            eprintln!("dagflow: {err}");
            std::process::ExitCode::from(map_error_to_exit_code(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_build_errors_map_to_data_err() {
        assert_eq!(map_error_to_exit_code(&EngineError::Cycle(vec!["a".to_string()])), ExitCode::DataErr);
    }

    #[test]
    fn scheduler_timeout_maps_to_temp_fail() {
        assert_eq!(map_error_to_exit_code(&EngineError::SchedulerTimeout("n".to_string())), ExitCode::TempFail);
    }
}
