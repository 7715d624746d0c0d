//! Export of a result batch to a gzip-compressed Parquet file

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use arrow::array::{ArrayRef, RecordBatch, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;

use crate::batch::ResultBatch;
use crate::model::PostRecord;
use crate::sink::{DEFAULT_GZIP_LEVEL, ParquetSink};
use crate::window::{DATE_FORMAT, QueryWindow};

/// Rows per written record batch
pub const BATCH_SIZE: usize = 8192;

/// Output schema: one row per accepted post
pub static POSTS: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("post_id", DataType::Utf8, false),
        Field::new("post_url", DataType::Utf8, false),
        Field::new(
            "date",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("content", DataType::Utf8, false),
    ]))
});

pub fn posts_schema() -> &'static Schema {
    &POSTS
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to build record batch: {0}")]
    Arrow(#[from] ArrowError),
}

/// What was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Column buffers for building `RecordBatch`es from post records
pub struct PostAccumulator {
    post_id: Vec<String>,
    post_url: Vec<String>,
    date: Vec<i64>,
    content: Vec<String>,
}

impl PostAccumulator {
    pub fn new() -> Self {
        Self {
            post_id: Vec::with_capacity(BATCH_SIZE),
            post_url: Vec::with_capacity(BATCH_SIZE),
            date: Vec::with_capacity(BATCH_SIZE),
            content: Vec::with_capacity(BATCH_SIZE),
        }
    }

    pub fn push(&mut self, record: &PostRecord) {
        self.post_id.push(record.post_id().to_string());
        self.post_url.push(record.post_url().to_string());
        self.date.push(record.timestamp().timestamp_micros());
        self.content.push(record.content().to_string());
    }

    pub fn len(&self) -> usize {
        self.post_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.post_id.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= BATCH_SIZE
    }

    /// Take buffered rows as a RecordBatch, resetting internal state
    pub fn take_batch(&mut self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.post_id))),
            Arc::new(StringArray::from(std::mem::take(&mut self.post_url))),
            Arc::new(
                TimestampMicrosecondArray::from(std::mem::take(&mut self.date)).with_timezone("UTC"),
            ),
            Arc::new(StringArray::from(std::mem::take(&mut self.content))),
        ];
        RecordBatch::try_new(Arc::clone(&*POSTS), arrays)
    }
}

impl Default for PostAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// `tg-posts-{channel}-{start}-{finish}.parquet.gzip`
///
/// Identical windows give identical names, so a rerun overwrites the earlier
/// export. Open-ended windows use `open` as the finish part.
pub fn default_file_name(window: &QueryWindow) -> String {
    let channel: String = window
        .channel()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let finish = window
        .finish()
        .map_or_else(|| "open".to_string(), |d| d.format(DATE_FORMAT).to_string());
    format!(
        "tg-posts-{channel}-{}-{finish}.parquet.gzip",
        window.start().format(DATE_FORMAT)
    )
}

/// Write `batch` to `path`.
///
/// Returns `Ok(None)` without touching the filesystem when the batch is empty.
pub fn export_batch(batch: &ResultBatch, path: &Path) -> Result<Option<ExportSummary>, ExportError> {
    export_records(batch.records(), path, DEFAULT_GZIP_LEVEL)
}

/// Write records with an explicit gzip level
pub fn export_records(
    records: &[PostRecord],
    path: &Path,
    gzip_level: u32,
) -> Result<Option<ExportSummary>, ExportError> {
    if records.is_empty() {
        log::info!("Nothing to export, skipping {}", path.display());
        return Ok(None);
    }

    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let schema = posts_schema();
    let mut sink = ParquetSink::create(path, schema, gzip_level).map_err(io_err)?;
    let mut acc = PostAccumulator::new();
    for record in records {
        acc.push(record);
        if acc.is_full() {
            sink.write_batch(&acc.take_batch()?).map_err(io_err)?;
        }
    }
    if !acc.is_empty() {
        sink.write_batch(&acc.take_batch()?).map_err(io_err)?;
    }
    let rows = sink.finalize().map_err(io_err)?;
    log::debug!("Wrote {rows} rows to {}", path.display());

    Ok(Some(ExportSummary {
        path: path.to_path_buf(),
        rows,
        columns: schema.fields().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_expected_fields() {
        let schema = posts_schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["post_id", "post_url", "date", "content"]);
    }

    #[test]
    fn file_name_closed_window() {
        let w = QueryWindow::parse("durov", "2024-01-01", Some("2024-12-31")).unwrap();
        assert_eq!(
            default_file_name(&w),
            "tg-posts-durov-2024-01-01-2024-12-31.parquet.gzip"
        );
    }

    #[test]
    fn file_name_open_window() {
        let w = QueryWindow::parse("durov", "2024-01-01", None).unwrap();
        assert_eq!(
            default_file_name(&w),
            "tg-posts-durov-2024-01-01-open.parquet.gzip"
        );
    }

    #[test]
    fn file_name_sanitizes_channel() {
        let w = QueryWindow::parse("a/b c", "2024-01-01", None).unwrap();
        assert_eq!(
            default_file_name(&w),
            "tg-posts-a_b_c-2024-01-01-open.parquet.gzip"
        );
    }

    #[test]
    fn empty_accumulator_builds_empty_batch() {
        let mut acc = PostAccumulator::new();
        let batch = acc.take_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 4);
    }
}
