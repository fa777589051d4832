//! Live dashboard client for meme-coin alerts, influencer tweets and creator
//! tokens.

pub mod app;
pub mod config;
pub mod error;
pub mod feeds;
pub mod list;
pub mod tokens;
pub mod ui;

pub use app::LiveListClient;
pub use config::Config;
pub use error::{DashError, Result};
