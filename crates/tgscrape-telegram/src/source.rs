//! Paginated web preview source

use std::sync::Arc;

use tgscrape_core::{PostSource, RawPost, SourceError};

use crate::config::TelegramConfig;
use crate::error::{FetchError, TelegramError};
use crate::fetch::PageClient;
use crate::page::{ChannelPage, PageParser};
use crate::retry::retry_with_backoff;

/// Public channel posts read from `{base_url}/s/{channel}`.
///
/// Opening a channel fetches its first page; later pages are fetched only
/// when the harvester has consumed the current one.
#[derive(Debug, Clone)]
pub struct TelegramSource {
    client: PageClient,
    parser: Arc<PageParser>,
    config: Arc<TelegramConfig>,
}

impl TelegramSource {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        Ok(Self {
            client: PageClient::new(&config)?,
            parser: Arc::new(PageParser::new()?),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }
}

impl PostSource for TelegramSource {
    type Posts = TelegramPosts;

    fn get_items(&self, channel: &str) -> Result<TelegramPosts, SourceError> {
        let mut posts = TelegramPosts {
            source: self.clone(),
            channel: channel.to_string(),
            pending: Vec::new(),
            before: None,
            pages: 0,
        };
        let first = posts.fetch(None)?;
        if !first.has_channel_info {
            return Err(SourceError::UnknownChannel(channel.to_string()));
        }
        posts.load(first, None);
        Ok(posts)
    }
}

/// Newest-first iterator over a channel's preview pages
#[derive(Debug)]
pub struct TelegramPosts {
    source: TelegramSource,
    channel: String,
    /// Current page, oldest first; popped from the back
    pending: Vec<RawPost>,
    before: Option<u64>,
    pages: usize,
}

impl TelegramPosts {
    /// Pages fetched so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    fn fetch(&mut self, before: Option<u64>) -> Result<ChannelPage, SourceError> {
        let TelegramSource {
            client,
            parser,
            config,
        } = &self.source;
        let url = config.channel_url(&self.channel, before);
        let html = retry_with_backoff(
            &url,
            config.max_retries,
            config.backoff_base,
            config.max_backoff,
            || client.fetch(&url),
        )
        .map_err(|e| match e {
            FetchError::Status { status: 404, .. } => {
                SourceError::UnknownChannel(self.channel.clone())
            }
            e => SourceError::Unavailable(format!("{url}: {e}")),
        })?;
        self.pages += 1;

        let page = parser.parse(&html).map_err(|e| SourceError::Malformed {
            location: url.clone(),
            message: e.to_string(),
        })?;
        log::debug!("{url}: {} posts, next before {:?}", page.posts.len(), page.before);
        Ok(page)
    }

    fn load(&mut self, page: ChannelPage, requested: Option<u64>) {
        // A page of only service messages still carries a cursor to follow;
        // a cursor that does not move backwards would loop forever
        self.before = match (page.before, requested) {
            (Some(next), Some(prev)) if next >= prev => None,
            (next, _) => next,
        };
        self.pending = page.posts;
    }
}

impl Iterator for TelegramPosts {
    type Item = Result<RawPost, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(post) = self.pending.pop() {
                return Some(Ok(post));
            }
            let before = self.before.take()?;
            match self.fetch(Some(before)) {
                Ok(page) => self.load(page, Some(before)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
