//! Configuration validation logic.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::loader::{BrowserEntry, Config};
use crate::error::{Error, Result};

/// Maximum number of listing entries Reddit returns per request.
pub const MAX_TOP_NUM: usize = 100;

/// Subreddit names: 2-21 characters, alphanumeric and underscores.
static FEED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_]{1,20}$").expect("valid feed name regex"));

/// `@username` of a public channel or a numeric chat id.
static CHANNEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[A-Za-z][A-Za-z0-9_]{3,31}|-?\d+)$").expect("valid channel name regex")
});

/// `<bot id>:<secret>`.
static BOT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:[A-Za-z0-9_-]+$").expect("valid bot token regex"));

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_bot_token(&config.telegram.bot_token)?;
    validate_user_agent(&config.reddit.user_agent)?;
    validate_browsers(&config.browsers)?;

    Ok(())
}

/// Validate the Telegram bot token.
pub fn validate_bot_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::MissingConfig("telegram.bot_token".to_string()));
    }

    // Check for placeholder values
    let token_lower = token.to_lowercase();
    if token_lower.contains("replaceme") || token_lower.contains("your_bot_token") {
        return Err(Error::ConfigValidation {
            field: "telegram.bot_token".to_string(),
            message: "Token appears to be a placeholder. Please provide your bot token."
                .to_string(),
        });
    }

    if !BOT_TOKEN.is_match(token) {
        return Err(Error::ConfigValidation {
            field: "telegram.bot_token".to_string(),
            message: "Token must look like '<bot id>:<secret>'".to_string(),
        });
    }

    Ok(())
}

/// Validate the Reddit user agent.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(Error::MissingConfig("reddit.user_agent".to_string()));
    }

    Ok(())
}

/// Validate a subreddit name.
pub fn validate_feed_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::MissingConfig("feed".to_string()));
    }

    if !FEED_NAME.is_match(name) {
        return Err(Error::ConfigValidation {
            field: "feed".to_string(),
            message: format!(
                "Subreddit '{}' is invalid. Use 2-21 alphanumeric characters or underscores, without the 'r/' prefix.",
                name
            ),
        });
    }

    Ok(())
}

/// Validate a channel reference.
pub fn validate_channel_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::MissingConfig("channel".to_string()));
    }

    if !CHANNEL_NAME.is_match(name) {
        return Err(Error::ConfigValidation {
            field: "channel".to_string(),
            message: format!(
                "Channel '{}' is invalid. Use '@channelname' or a numeric chat id.",
                name
            ),
        });
    }

    Ok(())
}

/// Validate the number of submissions fetched per poll.
pub fn validate_top_num(top_num: usize) -> Result<()> {
    if top_num == 0 || top_num > MAX_TOP_NUM {
        return Err(Error::ConfigValidation {
            field: "top_num".to_string(),
            message: format!("Must be between 1 and {} (got {})", MAX_TOP_NUM, top_num),
        });
    }

    Ok(())
}

/// Validate a delay given in seconds.
pub fn validate_delay(field: &str, seconds: u64) -> Result<()> {
    if seconds == 0 {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: "Delay must be at least one second".to_string(),
        });
    }

    Ok(())
}

/// Validate browser entries.
pub fn validate_browsers(browsers: &[BrowserEntry]) -> Result<()> {
    if browsers.is_empty() {
        return Err(Error::MissingConfig(
            "browsers (at least one feed/channel pair required)".to_string(),
        ));
    }

    let mut seen = HashSet::new();

    for entry in browsers {
        validate_feed_name(&entry.feed)?;
        validate_channel_name(&entry.channel)?;
        validate_top_num(entry.top_num)?;
        validate_delay("browse_delay_seconds", entry.browse_delay_seconds)?;
        validate_delay("cleanup_delay_seconds", entry.cleanup_delay_seconds)?;

        if !seen.insert((entry.feed.to_lowercase(), entry.channel.to_lowercase())) {
            return Err(Error::ConfigValidation {
                field: "browsers".to_string(),
                message: format!(
                    "Duplicate entry for r/{} -> {}",
                    entry.feed, entry.channel
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.telegram.bot_token = "123456789:AAH-abc_DEF".into();
        config.browsers.push(BrowserEntry::new("aww", "@aww_reposts"));
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_bot_token() {
        assert!(validate_bot_token("123:abc").is_ok());
        assert!(matches!(validate_bot_token(""), Err(Error::MissingConfig(_))));
        assert!(validate_bot_token("YOUR_BOT_TOKEN").is_err());
        assert!(validate_bot_token("replaceme").is_err());
        assert!(validate_bot_token("no-colon-here").is_err());
    }

    #[test]
    fn test_feed_names() {
        assert!(validate_feed_name("aww").is_ok());
        assert!(validate_feed_name("Eyebleach").is_ok());
        assert!(validate_feed_name("old_school_cool").is_ok());
        assert!(validate_feed_name("").is_err());
        assert!(validate_feed_name("r/aww").is_err());
        assert!(validate_feed_name("a").is_err());
        assert!(validate_feed_name("this_name_is_far_too_long").is_err());
    }

    #[test]
    fn test_channel_names() {
        assert!(validate_channel_name("@aww_reposts").is_ok());
        assert!(validate_channel_name("-1001234567890").is_ok());
        assert!(validate_channel_name("aww_reposts").is_err());
        assert!(validate_channel_name("@ab").is_err());
        assert!(validate_channel_name("").is_err());
    }

    #[test]
    fn test_numeric_limits() {
        assert!(validate_top_num(1).is_ok());
        assert!(validate_top_num(MAX_TOP_NUM).is_ok());
        assert!(validate_top_num(0).is_err());
        assert!(validate_top_num(MAX_TOP_NUM + 1).is_err());
        assert!(validate_delay("browse_delay_seconds", 0).is_err());
    }

    #[test]
    fn test_browsers_required_and_unique() {
        let mut config = valid_config();
        config.browsers.clear();
        assert!(matches!(validate_config(&config), Err(Error::MissingConfig(_))));

        let mut config = valid_config();
        config.browsers.push(BrowserEntry::new("AWW", "@aww_reposts"));
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.browsers.push(BrowserEntry::new("aww", "@another_channel"));
        assert!(validate_config(&config).is_ok());
    }
}
