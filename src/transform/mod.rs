//! Transform orchestration
//!
//! Turns the selections of an [`EditorHost`] into process invocations and
//! applies the results back, one selection at a time.

pub mod host;
pub mod orchestrator;
pub mod vault;


pub use host::{each_line, line_range, BufferHost, EditorHost, Notification, Selection, SelectionError};
pub use orchestrator::{BatchReport, TransformKind, TransformOrchestrator};
pub use vault::{strip_leading_indent, VaultAction, VaultFile, VAULT_FILE_PREFIX};
