use chrono::{Duration, TimeZone, Utc};
use tgscrape_core::export::export_records;
use tgscrape_core::{PostRecord, RawPost};

fn synthetic_records(n: usize) -> Vec<PostRecord> {
    let base = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let raw = RawPost::new(
                format!("https://t.me/bench/{}", n - i),
                base - Duration::minutes(i as i64),
                format!("Post body number {i} with a little bit of text"),
            );
            PostRecord::from_raw(raw, true)
        })
        .collect()
}

#[divan::bench(args = [1, 6, 9])]
fn export_gzip(bencher: divan::Bencher, gzip_level: u32) {
    let records = synthetic_records(8192);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.parquet.gzip");
    bencher.bench(|| {
        export_records(&records, &path, gzip_level).unwrap();
    });
}

fn main() {
    divan::main();
}
