//! StudyChat shared configuration, errors and logging

pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, BackendKind};
pub use error::ChatError;
pub type Result<T> = std::result::Result<T, ChatError>;
