//! Domain layer - core types and errors.
//!
//! This layer contains plain data models and error types
//! without any I/O.

pub mod config;
pub mod error;
pub mod models;

pub use config::{ApiConfig, AppConfig, BackoffConfig};
pub use error::{AppError, Result};
pub use models::{
    sort_by_timestamp, ChannelExport, ConversationInfo, ExportStats, Message, NameMap, User,
    UserGroup,
};
