//! tgscrape Core - Date-windowed channel harvesting
//!
//! This crate provides the source-agnostic pieces of the scraper: the query
//! window, the sequential rate-limited harvester, the background task wrapper,
//! and Parquet export of the resulting batch.

pub mod batch;
pub mod cancel;
pub mod clock;
pub mod export;
pub mod harvester;
pub mod logging;
pub mod model;
pub mod progress;
pub mod rate_limit;
pub mod sink;
pub mod source;
pub mod task;
pub mod window;

// Re-exports for convenience
pub use batch::{ResultBatch, StopReason, Throughput};
pub use cancel::CancelFlag;
pub use clock::{Clock, ManualClock, SystemClock};
pub use export::{ExportError, ExportSummary, default_file_name, export_batch};
pub use harvester::{HarvestError, HarvestObserver, Harvester, NoProgress, harvest};
pub use logging::{IndicatifLogger, init_logging};
pub use model::{PostRecord, REDACTION_MARKER, RawPost};
pub use progress::{ProgressContext, SharedProgress};
pub use rate_limit::RateLimiter;
pub use sink::{ParquetSink, is_valid_parquet};
pub use source::{JsonlSource, MemorySource, PostSource, SourceError};
pub use task::{HarvestTask, Progress};
pub use window::{FOUNDING_YEAR, Placement, QueryWindow, WindowError};
