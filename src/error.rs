//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the core and its
//! transport adapters (HTTP), along with helper mappers to protocol status codes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    InvalidArgument { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::InvalidArgument { code, .. } | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidArgument { message, .. } | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn invalid_argument<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::InvalidArgument { code: code.into(), message: msg.into() }
    }

    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::Internal { code: code.into(), message: msg.into() }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidArgument { .. } => 400,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type WardenResult<T> = Result<T, AppError>;
