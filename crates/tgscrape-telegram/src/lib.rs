//! tgscrape Telegram - public channel web preview as a post source
//!
//! Reads `https://t.me/s/<channel>` pages, follows `?before=<id>`
//! pagination and yields posts newest-first through
//! [`tgscrape_core::PostSource`].

pub mod channel;
pub mod config;
pub mod error;
pub mod fetch;
pub mod page;
pub mod retry;
pub mod source;

pub use channel::{ChannelError, normalize_channel};
pub use config::TelegramConfig;
pub use error::{FetchError, TelegramError};
pub use page::{ChannelPage, PageParser};
pub use source::{TelegramPosts, TelegramSource};
