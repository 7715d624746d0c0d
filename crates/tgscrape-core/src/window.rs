//! Query window: channel, inclusive date range, delay ceiling, verbosity

use std::fmt;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};

/// Earliest year accepted for either bound (platform launch year).
pub const FOUNDING_YEAR: i32 = 2013;

/// Date format used for user input and output file names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default delay ceiling between accepted posts (seconds)
pub const DEFAULT_MAX_SLEEP: f64 = 0.1;

/// Input validation failure. Raised before any source is contacted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("a channel name was not provided")]
    EmptyChannel,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    MalformedDate(String),
    #[error("invalid year in {0}: dates before 2013-01-01 are not accepted")]
    BeforeFounding(NaiveDate),
    #[error("start date {start} is after finish date {finish}")]
    StartAfterFinish { start: NaiveDate, finish: NaiveDate },
    #[error("max sleep must be a non-negative number of seconds, got {0}")]
    InvalidSleep(f64),
}

/// Where a date falls relative to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Newer than the finish date
    After,
    Inside,
    /// Older than the start date
    Before,
}

/// Validated harvest parameters.
///
/// Construct with [`QueryWindow::new`] or [`QueryWindow::parse`]; an invalid
/// window cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryWindow {
    channel: String,
    start: NaiveDate,
    finish: Option<NaiveDate>,
    max_sleep: Duration,
    verbose: bool,
}

impl QueryWindow {
    /// Closed window `[start, finish]`, or open-ended when `finish` is `None`.
    pub fn new(
        channel: &str,
        start: NaiveDate,
        finish: Option<NaiveDate>,
    ) -> Result<Self, WindowError> {
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(WindowError::EmptyChannel);
        }
        check_founding(start)?;
        if let Some(finish) = finish {
            check_founding(finish)?;
            if start > finish {
                return Err(WindowError::StartAfterFinish { start, finish });
            }
        }
        Ok(Self {
            channel: channel.to_string(),
            start,
            finish,
            max_sleep: Duration::from_secs_f64(DEFAULT_MAX_SLEEP),
            verbose: true,
        })
    }

    /// Parse `YYYY-MM-DD` strings. An empty or missing finish gives an open-ended window.
    pub fn parse(channel: &str, start: &str, finish: Option<&str>) -> Result<Self, WindowError> {
        let start = parse_date(start)?;
        let finish = match finish.map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_date(s)?),
            _ => None,
        };
        Self::new(channel, start, finish)
    }

    /// Set the delay ceiling in seconds
    pub fn with_max_sleep(mut self, seconds: f64) -> Result<Self, WindowError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(WindowError::InvalidSleep(seconds));
        }
        self.max_sleep = Duration::from_secs_f64(seconds);
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn finish(&self) -> Option<NaiveDate> {
        self.finish
    }

    pub fn is_open_ended(&self) -> bool {
        self.finish.is_none()
    }

    pub fn max_sleep(&self) -> Duration {
        self.max_sleep
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn place(&self, date: NaiveDate) -> Placement {
        if date < self.start {
            Placement::Before
        } else if self.finish.is_some_and(|f| date > f) {
            Placement::After
        } else {
            Placement::Inside
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.place(date) == Placement::Inside
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finish {
            Some(finish) => write!(f, "{} from {} to {}", self.channel, self.start, finish),
            None => write!(f, "{} from {} onwards", self.channel, self.start),
        }
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, WindowError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| WindowError::MalformedDate(s.to_string()))
}

/// January 1 and December 31 of the given date's year
pub fn year_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let year = today.year();
    (
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today),
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today),
    )
}

fn check_founding(date: NaiveDate) -> Result<(), WindowError> {
    if date.year() < FOUNDING_YEAR {
        return Err(WindowError::BeforeFounding(date));
    }
    Ok(())
}
