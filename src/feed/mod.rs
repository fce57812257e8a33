//! Feed module.
//!
//! This module provides:
//! - The [`FeedClient`] abstraction polled by browsers
//! - A client for public subreddit "top" listings
//! - Submission and listing types

pub mod client;
pub mod types;

pub use client::{FeedClient, RedditClient, REDDIT_BASE};
pub use types::{RedditVideo, Submission, SubmissionMedia, TimeWindow};
