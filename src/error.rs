//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("sheets error: {0}")]
    Sheets(String),

    #[error("docs error: {0}")]
    Docs(String),

    #[error("unknown agent '{requested}' — available: {available}")]
    UnknownAgent {
        requested: String,
        available: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn sheets_error_display() {
        let e = AppError::Sheets("status 403".into());
        assert!(e.to_string().contains("status 403"));
    }

    #[test]
    fn unknown_agent_lists_available() {
        let e = AppError::UnknownAgent {
            requested: "cams".into(),
            available: "cameras, doors".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("cams"));
        assert!(msg.contains("cameras, doors"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        // satisfies std::error::Error trait
        let _: &dyn Error = &e;
    }
}
