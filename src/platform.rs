//! Running PHP interpreter detection.
//!
//! The platform-version check compares `php` manifest constraints against
//! the interpreter found on `PATH`. Detection is a single `php -r` call;
//! `--php-version` or the config file override it entirely.

use std::process::Command;

use crate::error::{AuditError, Result};

/// Version of the PHP interpreter on `PATH`, e.g. `8.1.2-1ubuntu2.14`.
///
/// # Errors
///
/// Fails when the interpreter cannot be executed or prints something that
/// is not a version.
pub fn php_version() -> Result<String> {
    let command = if cfg!(target_os = "windows") {
        "php.exe"
    } else {
        "php"
    };

    let output = Command::new(command)
        .args(["-r", "echo PHP_VERSION;"])
        .output()
        .map_err(|e| AuditError::PhpDetect(format!("could not run {command}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AuditError::PhpDetect(format!(
            "{command} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_interpreter_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_interpreter_output(raw: &str) -> Result<String> {
    let version = raw.trim();
    if !version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(AuditError::PhpDetect(format!(
            "unexpected interpreter output \"{version}\""
        )));
    }
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interpreter_output() {
        assert_eq!(parse_interpreter_output("8.1.2\n").unwrap(), "8.1.2");
        assert_eq!(
            parse_interpreter_output("8.1.2-1ubuntu2.14").unwrap(),
            "8.1.2-1ubuntu2.14"
        );
    }

    #[test]
    fn test_non_version_output_is_error() {
        assert!(parse_interpreter_output("").is_err());
        assert!(parse_interpreter_output("PHP Warning: something").is_err());
    }
}
