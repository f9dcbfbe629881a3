//! Application layer - use cases and orchestration.
//!
//! This layer contains pagination, fetching, mention resolution and
//! transcript rendering.

pub mod directory;
pub mod exporter;
pub mod formatter;
pub mod history;
pub mod pagination;
pub mod resolver;
pub mod selection;

#[cfg(test)]
pub(crate) mod testing;

pub use exporter::{ExportService, Workspace};
pub use formatter::{format_conversations_table, format_stats};
pub use history::{default_end, parse_date, DateRange, DEFAULT_START};
pub use selection::{select, ExportScope};
