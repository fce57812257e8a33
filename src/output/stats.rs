//! Statistics reporting.

use console::style;

use crate::media::MediaKind;
use crate::stats::{DayStats, StatTotals, StatsSnapshot};

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn print_totals(label: &str, sent: &StatTotals, delivered: &StatTotals) {
    println!("{}", style(label).bold());
    println!(
        "  {:<10} {:>8} {:>10} {:>10} {:>10}",
        "", "sent", "size", "delivered", "size"
    );
    for kind in MediaKind::ALL {
        let s = sent.kind(kind);
        let d = delivered.kind(kind);
        if s.count == 0 && d.count == 0 {
            continue;
        }
        println!(
            "  {:<10} {:>8} {:>10} {:>10} {:>10}",
            kind.as_str(),
            s.count,
            format_size(s.size),
            d.count,
            format_size(d.size)
        );
    }
    println!(
        "  {:<10} {:>8} {:>10} {:>10} {:>10}",
        style("total").bold(),
        style(sent.total).green(),
        format_size(sent.total_size),
        style(delivered.total).green(),
        format_size(delivered.total_size)
    );
}

fn print_week(sent: &[DayStats], delivered: &[DayStats]) {
    println!("{}", style("Last 7 days:").bold());
    for (s, d) in sent.iter().zip(delivered) {
        println!(
            "  {}  sent {:>5}  delivered {:>5}  ({})",
            s.date,
            s.totals.total,
            d.totals.total,
            format_size(d.totals.total_size)
        );
    }
}

/// Print the statistics of one browser.
pub fn print_browser_stats(feed: &str, channel: &str, stats: &StatsSnapshot) {
    println!();
    println!(
        "{}",
        style(format!("Statistics for r/{} -> {}:", feed, channel)).bold()
    );
    print_totals("Lifetime:", &stats.sent.totals, &stats.delivered.totals);
    print_totals("Today:", &stats.sent.today, &stats.delivered.today);
    print_week(&stats.sent.week, &stats.delivered.week);

    let pending = stats
        .sent
        .totals
        .total
        .saturating_sub(stats.delivered.totals.total);
    if pending > 0 {
        println!("  Awaiting confirmation: {}", style(pending).yellow());
    }
}
