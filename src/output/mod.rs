//! Output module for console output.
//!
//! Provides:
//! - Colored console output
//! - Statistics reporting

pub mod console;
pub mod stats;

pub use console::{
    print_banner, print_config_summary, print_error, print_info, print_success, print_warning,
};
pub use stats::{format_size, print_browser_stats};
