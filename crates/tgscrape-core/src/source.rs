//! Source adapters: lazy, newest-first post sequences for a channel

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::RawPost;

/// Failure reported by a source. Always fatal for the harvest.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("channel '{0}' does not exist or is not public")]
    UnknownChannel(String),
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed post at {location}: {message}")]
    Malformed { location: String, message: String },
    #[error("IO: {0}")]
    Io(#[from] io::Error),
}

/// A channel post provider.
///
/// `get_items` must return a lazy iterator: items are pulled one at a time
/// and the channel is never materialized up front. Items are expected
/// newest-first; the harvester relies on that order to stop early.
pub trait PostSource {
    type Posts: Iterator<Item = Result<RawPost, SourceError>>;

    fn get_items(&self, channel: &str) -> Result<Self::Posts, SourceError>;
}

impl<S: PostSource + ?Sized> PostSource for &S {
    type Posts = S::Posts;

    fn get_items(&self, channel: &str) -> Result<Self::Posts, SourceError> {
        (**self).get_items(channel)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Post(RawPost),
    Fail(String),
}

/// In-memory source over a fixed list of posts.
///
/// Counts how many items were pulled, which lets callers check that
/// traversal stopped where expected.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    channel: Option<String>,
    entries: Arc<Vec<Entry>>,
    pulls: Arc<AtomicUsize>,
}

impl MemorySource {
    /// Source answering for any channel name
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            channel: None,
            entries: Arc::new(posts.into_iter().map(Entry::Post).collect()),
            pulls: Arc::default(),
        }
    }

    /// Source that only knows `channel`; other names fail as unknown.
    pub fn for_channel(channel: &str, posts: Vec<RawPost>) -> Self {
        Self {
            channel: Some(channel.to_string()),
            ..Self::new(posts)
        }
    }

    /// Append an item that fails with [`SourceError::Unavailable`] when pulled
    pub fn with_failure(mut self, message: &str) -> Self {
        let mut entries = (*self.entries).clone();
        entries.push(Entry::Fail(message.to_string()));
        self.entries = Arc::new(entries);
        self
    }

    /// Number of items pulled across all iterators of this source
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::Relaxed)
    }
}

impl PostSource for MemorySource {
    type Posts = MemoryPosts;

    fn get_items(&self, channel: &str) -> Result<MemoryPosts, SourceError> {
        if self.channel.as_deref().is_some_and(|c| c != channel) {
            return Err(SourceError::UnknownChannel(channel.to_string()));
        }
        Ok(MemoryPosts {
            entries: Arc::clone(&self.entries),
            cursor: 0,
            pulls: Arc::clone(&self.pulls),
        })
    }
}

/// Iterator returned by [`MemorySource`]
#[derive(Debug)]
pub struct MemoryPosts {
    entries: Arc<Vec<Entry>>,
    cursor: usize,
    pulls: Arc<AtomicUsize>,
}

impl Iterator for MemoryPosts {
    type Item = Result<RawPost, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.cursor)?;
        self.cursor += 1;
        self.pulls.fetch_add(1, Ordering::Relaxed);
        Some(match entry {
            Entry::Post(post) => Ok(post.clone()),
            Entry::Fail(message) => Err(SourceError::Unavailable(message.clone())),
        })
    }
}

/// Reads a newest-first JSON-lines dump of posts.
///
/// Each non-blank line is an object with `url`, `date` (RFC 3339) and an
/// optional `content`. The channel name is not checked against the file.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PostSource for JsonlSource {
    type Posts = JsonlPosts;

    fn get_items(&self, _channel: &str) -> Result<JsonlPosts, SourceError> {
        let file = File::open(&self.path)?;
        Ok(JsonlPosts {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            label: self.path.display().to_string(),
        })
    }
}

/// Iterator returned by [`JsonlSource`]
#[derive(Debug)]
pub struct JsonlPosts {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    label: String,
}

impl Iterator for JsonlPosts {
    type Item = Result<RawPost, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(SourceError::Io(e))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|e| SourceError::Malformed {
                location: format!("{}:{}", self.label, self.line_no),
                message: e.to_string(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn post(id: u32) -> RawPost {
        RawPost::new(
            format!("https://t.me/chan/{id}"),
            Utc.with_ymd_and_hms(2024, 1, id, 0, 0, 0).unwrap(),
            format!("post {id}"),
        )
    }

    #[test]
    fn memory_source_yields_in_order_and_counts_pulls() {
        let source = MemorySource::new(vec![post(3), post(2), post(1)]);
        let mut items = source.get_items("any").unwrap();
        assert_eq!(items.next().unwrap().unwrap(), post(3));
        assert_eq!(source.pulls(), 1);
        assert_eq!(items.count(), 2);
        assert_eq!(source.pulls(), 3);
    }

    #[test]
    fn memory_source_unknown_channel() {
        let source = MemorySource::for_channel("known", vec![post(1)]);
        assert!(source.get_items("known").is_ok());
        assert!(matches!(
            source.get_items("other"),
            Err(SourceError::UnknownChannel(c)) if c == "other"
        ));
    }

    #[test]
    fn memory_source_failure_entry() {
        let source = MemorySource::new(vec![post(1)]).with_failure("boom");
        let items: Vec<_> = source.get_items("c").unwrap().collect();
        assert!(items[0].is_ok());
        assert!(matches!(&items[1], Err(SourceError::Unavailable(m)) if m == "boom"));
    }

    #[test]
    fn jsonl_source_reads_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"url":"https://t.me/chan/2","date":"2024-01-02T00:00:00Z","content":"b"}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"url":"https://t.me/chan/1","date":"2024-01-01T00:00:00Z"}}"#
        )
        .unwrap();

        let source = JsonlSource::new(file.path());
        let posts: Vec<RawPost> = source
            .get_items("chan")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].content, "b");
        assert!(posts[1].content.is_empty());
    }

    #[test]
    fn jsonl_source_reports_line_of_bad_record() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let source = JsonlSource::new(file.path());
        let err = source.get_items("c").unwrap().next().unwrap().unwrap_err();
        match err {
            SourceError::Malformed { location, .. } => assert!(location.ends_with(":1")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn jsonl_source_missing_file() {
        let source = JsonlSource::new("/nonexistent/tgscrape/dump.jsonl");
        assert!(matches!(source.get_items("c"), Err(SourceError::Io(_))));
    }
}
