//! Media module: kinds, content sniffing and provider URL resolution.

pub mod item;
pub mod resolver;
pub mod sniff;

pub use item::{DownloadedMedia, MediaKind};
pub use resolver::{MediaResolver, MediaRule, MediaTarget, ResolvedMedia};
pub use sniff::detect_extension;
