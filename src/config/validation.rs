//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool size > 0, timeouts > 0)
//! - Detect duplicate handlers in the chain
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending key.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!(
                "\"{}\" is not an IP address",
                config.listener.bind_address
            ),
        ));
    }

    if config.listener.max_threads == 0 {
        errors.push(ValidationError::new(
            "listener.max_threads",
            "must be greater than zero",
        ));
    }

    if config.chain.handlers.is_empty() {
        errors.push(ValidationError::new(
            "chain.handlers",
            "at least one handler is required",
        ));
    }

    let mut seen = HashSet::new();
    for kind in &config.chain.handlers {
        if !seen.insert(kind) {
            errors.push(ValidationError::new(
                "chain.handlers",
                format!("handler \"{}\" is listed more than once", kind),
            ));
        }
    }

    if config.resources.default_page.trim().is_empty() {
        errors.push(ValidationError::new(
            "resources.default_page",
            "must not be blank",
        ));
    }

    if config.resources.dir.trim().is_empty() {
        errors.push(ValidationError::new("resources.dir", "must not be blank"));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.read_secs", timeouts.read_secs),
        ("timeouts.write_secs", timeouts.write_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
