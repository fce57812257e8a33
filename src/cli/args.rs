//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{BrowserEntry, Config};
use crate::feed::TimeWindow;

/// Subreddit to Telegram media reposter CLI.
#[derive(Parser, Debug)]
#[command(
    name = "reposter",
    version,
    about = "Repost media from subreddit top listings into Telegram channels",
    long_about = "Periodically scans the top listing of subreddits, downloads embedded media \
                  (imgur, i.redd.it, v.redd.it gifs, gfycat) and forwards it to Telegram channels \
                  through a bot, never posting the same submission twice."
)]
pub struct Args {
    /// Subreddit to browse. Together with --channel, replaces the configured browsers.
    #[arg(short, long)]
    pub feed: Option<String>,

    /// Target channel (@name or numeric chat id).
    #[arg(short = 'C', long)]
    pub channel: Option<String>,

    /// Number of top submissions fetched per poll.
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Seconds between polls.
    #[arg(long = "browse-delay")]
    pub browse_delay: Option<u64>,

    /// Seconds a reposted submission is remembered.
    #[arg(long = "cleanup-delay")]
    pub cleanup_delay: Option<u64>,

    /// Time window of the top listing.
    #[arg(long, value_enum)]
    pub window: Option<TimeWindowArg>,

    /// Telegram bot token.
    #[arg(short = 'b', long = "bot-token", env = "TELEGRAM_BOT_TOKEN")]
    pub bot_token: Option<String>,

    /// User agent for Reddit requests.
    #[arg(short = 'a', long = "user-agent", env = "REDDIT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Store snapshot file.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Print the statistics of every configured browser and exit.
    #[arg(long)]
    pub report: bool,

    /// Write the merged configuration to the config file and exit.
    #[arg(long, conflicts_with = "report")]
    pub write_config: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI time window argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimeWindowArg {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl From<TimeWindowArg> for TimeWindow {
    fn from(arg: TimeWindowArg) -> Self {
        match arg {
            TimeWindowArg::Hour => TimeWindow::Hour,
            TimeWindowArg::Day => TimeWindow::Day,
            TimeWindowArg::Week => TimeWindow::Week,
            TimeWindowArg::Month => TimeWindow::Month,
            TimeWindowArg::Year => TimeWindow::Year,
            TimeWindowArg::All => TimeWindow::All,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    ///
    /// `--feed` with `--channel` selects a single browser (keeping the settings
    /// of a matching configured entry). Either flag alone, and the per-browser
    /// settings, apply to every configured browser.
    pub fn merge_into_config(self, config: &mut Config) {
        match (self.feed, self.channel) {
            (Some(feed), Some(channel)) => {
                let entry = config
                    .browsers
                    .iter()
                    .find(|b| b.feed == feed && b.channel == channel)
                    .cloned()
                    .unwrap_or_else(|| BrowserEntry::new(&feed, &channel));
                config.browsers = vec![entry];
            }
            (Some(feed), None) => {
                for entry in &mut config.browsers {
                    entry.feed = feed.clone();
                }
            }
            (None, Some(channel)) => {
                for entry in &mut config.browsers {
                    entry.channel = channel.clone();
                }
            }
            (None, None) => {}
        }

        for entry in &mut config.browsers {
            if let Some(top) = self.top {
                entry.top_num = top;
            }
            if let Some(delay) = self.browse_delay {
                entry.browse_delay_seconds = delay;
            }
            if let Some(delay) = self.cleanup_delay {
                entry.cleanup_delay_seconds = delay;
            }
            if let Some(window) = self.window {
                entry.top_window = window.into();
            }
        }

        // Override account settings if provided
        if let Some(token) = self.bot_token {
            config.telegram.bot_token = token;
        }

        if let Some(user_agent) = self.user_agent {
            config.reddit.user_agent = user_agent;
        }

        if let Some(store) = self.store {
            config.storage.snapshot_path = Some(store);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("reposter").chain(args.iter().copied())).unwrap()
    }

    fn configured() -> Config {
        let mut config = Config::default();
        let mut entry = BrowserEntry::new("aww", "@aww_reposts");
        entry.top_num = 7;
        config.browsers.push(entry);
        config.browsers.push(BrowserEntry::new("gifs", "@gif_reposts"));
        config
    }

    #[test]
    fn test_feed_and_channel_select_single_browser() {
        let mut config = configured();
        parse(&["--feed", "aww", "--channel", "@aww_reposts"]).merge_into_config(&mut config);

        assert_eq!(config.browsers.len(), 1);
        assert_eq!(config.browsers[0].top_num, 7);
    }

    #[test]
    fn test_new_pair_uses_defaults() {
        let mut config = Config::default();
        parse(&["-f", "Eyebleach", "-C", "@bleach", "--top", "5", "--window", "week"])
            .merge_into_config(&mut config);

        assert_eq!(config.browsers.len(), 1);
        let entry = &config.browsers[0];
        assert_eq!(entry.feed, "Eyebleach");
        assert_eq!(entry.channel, "@bleach");
        assert_eq!(entry.top_num, 5);
        assert_eq!(entry.top_window, TimeWindow::Week);
        assert_eq!(entry.browse_delay_seconds, 3600);
    }

    #[test]
    fn test_settings_apply_to_every_browser() {
        let mut config = configured();
        parse(&["--browse-delay", "600", "--cleanup-delay", "7200"]).merge_into_config(&mut config);

        assert!(config
            .browsers
            .iter()
            .all(|b| b.browse_delay_seconds == 600 && b.cleanup_delay_seconds == 7200));
    }

    #[test]
    fn test_account_overrides() {
        let mut config = Config::default();
        parse(&["--bot-token", "42:secret", "--store", "state.json", "--report"])
            .merge_into_config(&mut config);

        assert_eq!(config.telegram.bot_token, "42:secret");
        assert_eq!(config.storage.snapshot_path, Some(PathBuf::from("state.json")));
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(!args.report);
        assert!(!args.write_config);
        assert!(!args.debug);
    }

    #[test]
    fn test_write_config_conflicts_with_report() {
        assert!(parse(&["--write-config", "-f", "aww", "-C", "@aww_reposts"]).write_config);
        assert!(Args::try_parse_from(["reposter", "--write-config", "--report"]).is_err());
    }
}
