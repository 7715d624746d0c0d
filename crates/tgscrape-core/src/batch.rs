//! Result batch: accepted records plus run metrics

use std::fmt;
use std::time::Duration;

use crate::model::PostRecord;

/// Why traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source had no more items
    Exhausted,
    /// A post older than the start date was reached
    PassedWindow,
    /// Cancellation was requested
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exhausted => "channel exhausted",
            Self::PassedWindow => "reached start date",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Approximate acceptance rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throughput {
    PerMinute(f64),
    /// Fewer than two timed samples
    NotAvailable,
}

impl Throughput {
    /// Mean interval between consecutive acceptance offsets, as posts/minute
    pub fn from_offsets(offsets: &[Duration]) -> Self {
        if offsets.len() < 2 {
            return Self::NotAvailable;
        }
        let span = offsets[offsets.len() - 1].saturating_sub(offsets[0]);
        let mean = span.as_secs_f64() / (offsets.len() - 1) as f64;
        if mean <= 0.0 {
            return Self::NotAvailable;
        }
        Self::PerMinute(60.0 / mean)
    }

    pub fn per_minute(&self) -> Option<f64> {
        match self {
            Self::PerMinute(v) => Some(*v),
            Self::NotAvailable => None,
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerMinute(v) => write!(f, "{v:.0} posts/min"),
            Self::NotAvailable => f.write_str("not available"),
        }
    }
}

/// Accepted posts of one harvest run, newest first, with summary metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBatch {
    records: Vec<PostRecord>,
    offsets: Vec<Duration>,
    elapsed: Duration,
    stop: StopReason,
}

impl ResultBatch {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            offsets: Vec::new(),
            elapsed: Duration::ZERO,
            stop: StopReason::Exhausted,
        }
    }

    /// Append a record accepted `offset` after harvest start
    pub(crate) fn push(&mut self, record: PostRecord, offset: Duration) {
        self.records.push(record);
        self.offsets.push(offset);
    }

    pub(crate) fn finish(&mut self, elapsed: Duration, stop: StopReason) {
        self.elapsed = elapsed;
        self.stop = stop;
    }

    pub fn records(&self) -> &[PostRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PostRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Wall time from harvest start to traversal end
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop
    }

    pub fn was_cancelled(&self) -> bool {
        self.stop == StopReason::Cancelled
    }

    pub fn throughput(&self) -> Throughput {
        Throughput::from_offsets(&self.offsets)
    }
}
