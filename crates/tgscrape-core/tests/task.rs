//! Background harvest task: progress channel, cancellation, join

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tgscrape_core::{
    CancelFlag, HarvestError, HarvestTask, Harvester, ManualClock, MemorySource, PostSource,
    QueryWindow, RawPost, SourceError, SystemClock,
};

fn posts(n: u32) -> Vec<RawPost> {
    (0..n)
        .rev()
        .map(|i| {
            RawPost::new(
                format!("https://t.me/bg/{i}"),
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(i64::from(i)),
                "x",
            )
        })
        .collect()
}

fn window() -> QueryWindow {
    QueryWindow::parse("bg", "2024-01-01", None).unwrap()
}

#[test]
fn progress_arrives_in_order_and_join_returns_batch() {
    let source = MemorySource::new(posts(25));
    let harvester = Harvester::new(ManualClock::new(), CancelFlag::new());
    let task = HarvestTask::spawn(source, window(), harvester).unwrap();

    let counts: Vec<usize> = task.progress().iter().map(|p| p.count()).collect();
    assert_eq!(counts, (1..=25).collect::<Vec<_>>());

    let batch = task.join().unwrap();
    assert_eq!(batch.len(), 25);
    assert!(!batch.was_cancelled());
}

#[test]
fn cancel_stops_at_item_boundary() {
    let source = MemorySource::new(posts(10_000));
    // Real sleeps so the task is still running when cancel arrives
    let w = window().with_max_sleep(0.01).unwrap();
    let harvester = Harvester::new(SystemClock::new(), CancelFlag::new());
    let task = HarvestTask::spawn(source.clone(), w, harvester).unwrap();

    let first = task
        .progress()
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert_eq!(first.count(), 1);

    let batch = task.cancel_and_join().unwrap();
    assert!(batch.was_cancelled());
    assert!(batch.len() < 10_000);
    assert_eq!(source.pulls(), batch.len());
}

#[test]
fn external_flag_cancels_task() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let source = MemorySource::new(posts(5));
    let task = HarvestTask::spawn(
        source.clone(),
        window(),
        Harvester::new(ManualClock::new(), cancel),
    )
    .unwrap();
    let batch = task.join().unwrap();
    assert!(batch.is_empty());
    assert_eq!(source.pulls(), 0);
}

#[test]
fn source_error_surfaces_through_join() {
    let source = MemorySource::for_channel("someone-else", posts(3));
    let task = HarvestTask::spawn(
        source,
        window(),
        Harvester::new(ManualClock::new(), CancelFlag::new()),
    )
    .unwrap();
    let err = task.join().unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Open {
            source: SourceError::UnknownChannel(_),
            ..
        }
    ));
}

#[test]
fn drop_cancels_and_waits() {
    let source = MemorySource::new(posts(10_000));
    let w = window().with_max_sleep(0.01).unwrap();
    let task = HarvestTask::spawn(
        source.clone(),
        w,
        Harvester::new(SystemClock::new(), CancelFlag::new()),
    )
    .unwrap();
    task.progress()
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    drop(task);

    let pulled = source.pulls();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(source.pulls(), pulled);
    assert!(pulled < 10_000);
}

/// Source whose iterator panics on the first pull
struct Exploding;

impl PostSource for Exploding {
    type Posts = std::iter::FromFn<fn() -> Option<Result<RawPost, SourceError>>>;

    fn get_items(&self, _channel: &str) -> Result<Self::Posts, SourceError> {
        fn boom() -> Option<Result<RawPost, SourceError>> {
            panic!("source blew up")
        }
        Ok(std::iter::from_fn(boom as fn() -> _))
    }
}

#[test]
fn panic_in_harvest_thread_is_reported() {
    let harvester = Harvester::new(ManualClock::new(), CancelFlag::new());
    let task = HarvestTask::spawn(Exploding, window(), harvester).unwrap();
    assert_eq!(task.progress().iter().count(), 0);
    assert!(matches!(task.join(), Err(HarvestError::Panicked)));
}
