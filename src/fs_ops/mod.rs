//! Filesystem operations: inspection, tree copy, recursive removal, junction creation,
//! and path resolution.

mod copy;
mod helpers;
mod inspect;
mod junction;
mod meta;
mod remove;
mod resolve;

pub use copy::{BulkTool, CopyMethod, CopyOptions, copy_tree};
pub use helpers::{io_error_with_help, io_error_with_help_io};
pub use inspect::{DirectoryInfo, format_bytes, inspect, status_block};
pub use junction::create_junction;
pub use remove::remove_tree;
pub use resolve::{absolutize, clean_input, ensure_disjoint, is_link, resolve_path};
