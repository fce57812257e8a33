//! Console output utilities.

use console::style;

use crate::config::BrowserEntry;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Reposter                                          ║
║     Subreddit media to Telegram channels              ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(browsers: &[BrowserEntry], store: Option<&str>) {
    println!();
    println!("{}", style("Configuration:").bold());
    for entry in browsers {
        println!(
            "  r/{} -> {}: top {} ({}) every {}s, remembered {}s, files in {}",
            entry.feed,
            entry.channel,
            entry.top_num,
            entry.top_window,
            entry.browse_delay_seconds,
            entry.cleanup_delay_seconds,
            entry.tmp_dir.display()
        );
    }
    println!("  Store: {}", store.unwrap_or("in memory"));
    println!();
}
