//! Filesystem module.
//!
//! Provides:
//! - Temporary directory management
//! - Media file naming

pub mod naming;
pub mod paths;

pub use naming::{append_extension, sanitize_media_id, temp_download_path};
pub use paths::{ensure_dir, is_within};
