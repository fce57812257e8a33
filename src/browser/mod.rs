//! Browse loop module.
//!
//! This module provides:
//! - The [`Browser`] polling a feed and reposting its media into a channel
//! - The [`DeliveryCorrelator`] finishing reposts once delivery is confirmed
//! - Feed fetch retry policies

pub mod config;
pub mod correlator;
pub mod policy;
pub mod scheduler;

pub use config::BrowserConfig;
pub use correlator::DeliveryCorrelator;
pub use policy::{FetchPolicy, NoRetry, RetryTransient};
pub use scheduler::{Browser, BrowserDeps, BrowserStatus, WAIT_STEP};
