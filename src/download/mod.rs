//! Download module.
//!
//! This module provides:
//! - The [`Fetch`] abstraction and a streaming HTTP implementation
//! - The [`DownloadManager`], which names files after their sniffed content type

pub mod fetch;
pub mod manager;

pub use fetch::{Fetch, HttpFetcher};
pub use manager::DownloadManager;
