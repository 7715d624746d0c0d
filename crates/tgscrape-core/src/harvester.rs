//! Window harvester: sequential pull loop over a newest-first source
//!
//! Posts newer than the window are skipped, posts inside it are accepted
//! (redacted if requested) and followed by a rate-limit delay, and the first
//! post older than the window ends traversal.

use std::num::NonZeroUsize;

use crate::batch::{ResultBatch, StopReason};
use crate::cancel::CancelFlag;
use crate::clock::Clock;
use crate::model::PostRecord;
use crate::rate_limit::RateLimiter;
use crate::source::{PostSource, SourceError};
use crate::window::{Placement, QueryWindow};

/// Fatal harvest failure. Cancellation is not an error.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("cannot read channel '{channel}': {source}")]
    Open {
        channel: String,
        source: SourceError,
    },
    #[error("source failed after {accepted} accepted posts: {source}")]
    Source { accepted: usize, source: SourceError },
    #[error("harvest thread panicked")]
    Panicked,
}

impl HarvestError {
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            Self::Open { source, .. } | Self::Source { source, .. } => Some(source),
            Self::Panicked => None,
        }
    }
}

/// Receives a notification for every accepted post
pub trait HarvestObserver {
    fn accepted(&mut self, count: usize, record: &PostRecord);
}

impl<F: FnMut(usize, &PostRecord)> HarvestObserver for F {
    fn accepted(&mut self, count: usize, record: &PostRecord) {
        self(count, record)
    }
}

/// Observer that ignores notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl HarvestObserver for NoProgress {
    fn accepted(&mut self, _count: usize, _record: &PostRecord) {}
}

/// One-shot harvester. Each run owns its own accumulator.
#[derive(Debug)]
pub struct Harvester<C> {
    clock: C,
    cancel: CancelFlag,
    limiter: Option<RateLimiter>,
    stop_after: NonZeroUsize,
}

impl<C: Clock> Harvester<C> {
    pub fn new(clock: C, cancel: CancelFlag) -> Self {
        Self {
            clock,
            cancel,
            limiter: None,
            stop_after: NonZeroUsize::MIN,
        }
    }

    /// Flag polled by this harvester; cancel it from any thread
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Use a specific limiter instead of one built from the window's ceiling
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Stop only after `n` consecutive posts older than the window.
    ///
    /// The default of 1 trusts the source's ordering completely. Larger
    /// values tolerate sources that occasionally yield posts out of order.
    pub fn stop_after(mut self, n: NonZeroUsize) -> Self {
        self.stop_after = n;
        self
    }

    /// Traverse `source` for `window`, notifying `observer` per accepted post.
    pub fn run<S: PostSource>(
        self,
        source: &S,
        window: &QueryWindow,
        observer: &mut impl HarvestObserver,
    ) -> Result<ResultBatch, HarvestError> {
        let Self {
            clock,
            cancel,
            limiter,
            stop_after,
        } = self;
        let mut limiter = limiter.unwrap_or_else(|| RateLimiter::new(window.max_sleep()));
        let start = clock.now();
        let mut batch = ResultBatch::new();

        if cancel.is_cancelled() {
            log::debug!("{}: cancelled before start", window.channel());
            batch.finish(clock.now().saturating_sub(start), StopReason::Cancelled);
            return Ok(batch);
        }

        log::debug!("{window}: opening source");
        let mut items = source
            .get_items(window.channel())
            .map_err(|source| HarvestError::Open {
                channel: window.channel().to_string(),
                source,
            })?;

        let mut scanned = 0usize;
        let mut below = 0usize;
        let stop = loop {
            // Checked before every pull so a cancelled run makes no further source calls
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            let Some(item) = items.next() else {
                break StopReason::Exhausted;
            };
            let raw = item.map_err(|source| HarvestError::Source {
                accepted: batch.len(),
                source,
            })?;
            scanned += 1;

            match window.place(raw.date()) {
                Placement::After => {
                    below = 0;
                    log::trace!("skip {} ({}): after window", raw.url, raw.date());
                }
                Placement::Before => {
                    below += 1;
                    log::trace!("{} ({}): before window", raw.url, raw.date());
                    if below >= stop_after.get() {
                        break StopReason::PassedWindow;
                    }
                }
                Placement::Inside => {
                    below = 0;
                    let offset = clock.now().saturating_sub(start);
                    batch.push(PostRecord::from_raw(raw, window.verbose()), offset);
                    if let Some(record) = batch.records().last() {
                        observer.accepted(batch.len(), record);
                    }
                    limiter.delay(&clock);
                }
            }
        };

        batch.finish(clock.now().saturating_sub(start), stop);
        log::debug!(
            "{}: {} accepted of {} scanned ({stop})",
            window.channel(),
            batch.len(),
            scanned
        );
        Ok(batch)
    }
}

/// Run a harvest without progress notifications
pub fn harvest<S: PostSource, C: Clock>(
    source: &S,
    window: &QueryWindow,
    clock: C,
    cancel: CancelFlag,
) -> Result<ResultBatch, HarvestError> {
    Harvester::new(clock, cancel).run(source, window, &mut NoProgress)
}
