//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("dashboard error: {0}")]
    Dashboard(String),

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
        assert!(e.to_string().starts_with("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn server_error_display() {
        let e = AppError::Server("bind failed on 127.0.0.1:1".into());
        assert!(e.to_string().contains("bind failed"));
    }

    #[test]
    fn dashboard_error_display() {
        let e = AppError::Dashboard("no endpoints".into());
        assert!(e.to_string().contains("no endpoints"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
