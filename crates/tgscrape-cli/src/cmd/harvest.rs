//! Harvest subcommand - collect a channel's posts for a date window

use std::io::{BufRead, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use tgscrape_core::export::export_records;
use tgscrape_core::progress::{fmt_duration, fmt_num};
use tgscrape_core::window::year_bounds;
use tgscrape_core::{
    CancelFlag, HarvestTask, Harvester, JsonlSource, PostSource, Progress, QueryWindow,
    ResultBatch, SharedProgress, SystemClock, default_file_name,
};
use tgscrape_telegram::{TelegramSource, normalize_channel};

use super::prompt::Prompter;
use crate::config::Config;

/// Longest content excerpt shown in the sample
const SAMPLE_CHARS: usize = 50;

/// Log interval for non-TTY progress
const LOG_EVERY: usize = 100;

#[derive(Args, Debug, Default)]
pub struct HarvestArgs {
    /// Channel name or link, e.g. durov, @durov or https://t.me/s/durov (prompted if omitted)
    pub channel: Option<String>,

    /// First date to include, YYYY-MM-DD (default: January 1 of this year)
    #[arg(short, long)]
    pub start: Option<String>,

    /// Last date to include, YYYY-MM-DD (default: December 31 of this year)
    #[arg(short, long, conflicts_with = "open_ended")]
    pub finish: Option<String>,

    /// No upper date bound
    #[arg(long)]
    pub open_ended: bool,

    /// Ceiling of the random delay after each accepted post, in seconds
    #[arg(long)]
    pub max_sleep: Option<f64>,

    /// Replace post contents with a redaction marker
    #[arg(long)]
    pub no_content: bool,

    /// Output file (default: <output-dir>/tg-posts-<channel>-<start>-<finish>.parquet.gzip)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for the default file name
    #[arg(long, conflicts_with = "output")]
    pub output_dir: Option<PathBuf>,

    /// Consecutive posts older than the start date needed to stop
    #[arg(long)]
    pub stop_after: Option<NonZeroUsize>,

    /// Do not prompt; use defaults for anything not given
    #[arg(short, long)]
    pub yes: bool,

    /// Read posts from a newest-first JSON-lines dump instead of Telegram
    #[arg(long)]
    pub from_jsonl: Option<PathBuf>,
}

pub fn run(args: HarvestArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let today = Local::now().date_naive();
    let mut prompter = Prompter::stdio();
    let window = resolve_window(&args, config, &mut prompter, today)?;

    if !args.yes {
        let question = format!("\nYou are about to scrape all posts of {window}. Continue?");
        if !prompter.confirm(&question)? {
            log::info!("Exiting program");
            return Ok(());
        }
    }

    let output = args.output.clone().unwrap_or_else(|| {
        args.output_dir
            .clone()
            .unwrap_or_else(|| config.output.default_dir.clone())
            .join(default_file_name(&window))
    });

    let batch = match &args.from_jsonl {
        Some(path) => {
            let source = JsonlSource::new(path);
            log::info!("Reading {} from {}", window.channel(), source.path().display());
            harvest(source, &window, &args, config, progress)?
        }
        None => {
            let source = TelegramSource::new(config.telegram_config())
                .context("Failed to set up Telegram client")?;
            harvest(source, &window, &args, config, progress)?
        }
    };

    finish(&batch, &window, &output, config, progress)
}

/// Fill in every value not given on the command line, prompting unless `--yes`
pub fn resolve_window<R: BufRead, W: Write>(
    args: &HarvestArgs,
    config: &Config,
    prompter: &mut Prompter<R, W>,
    today: NaiveDate,
) -> Result<QueryWindow> {
    let interactive = !args.yes;

    let raw_channel = match &args.channel {
        Some(c) => c.clone(),
        None if interactive => prompter.ask(
            "Enter a channel name to scrape (XXXX in https://t.me/s/XXXX or https://web.telegram.org/k/#@XXXX)",
            None,
        )?,
        None => bail!("A channel name is required with --yes"),
    };
    let channel = normalize_channel(&raw_channel)?;

    let (first_day, last_day) = year_bounds(today);
    let start = match &args.start {
        Some(s) => s.clone(),
        None if interactive => prompter.ask(
            "Enter the first date to scrape, YYYY-MM-DD",
            Some(&first_day.to_string()),
        )?,
        None => first_day.to_string(),
    };
    let finish = if args.open_ended {
        None
    } else {
        match &args.finish {
            Some(f) => Some(f.clone()),
            None if interactive => {
                let answer = prompter.ask(
                    "Enter the last date to scrape, YYYY-MM-DD or 'open' for no limit",
                    Some(&last_day.to_string()),
                )?;
                (!answer.eq_ignore_ascii_case("open")).then_some(answer)
            }
            None => Some(last_day.to_string()),
        }
    };

    let verbose = if args.no_content {
        false
    } else if interactive {
        prompter.yes_no(
            "Do you want to include posts contents in the output file?",
            config.harvest.verbose,
        )?
    } else {
        config.harvest.verbose
    };

    let window = QueryWindow::parse(&channel, &start, finish.as_deref())?
        .with_max_sleep(args.max_sleep.unwrap_or(config.harvest.max_sleep))?
        .with_verbose(verbose);
    Ok(window)
}

/// Run the harvest on a background thread, driving the progress display
fn harvest<S>(
    source: S,
    window: &QueryWindow,
    args: &HarvestArgs,
    config: &Config,
    progress: &SharedProgress,
) -> Result<ResultBatch>
where
    S: PostSource + Send + 'static,
{
    let stop_after = args
        .stop_after
        .or_else(|| NonZeroUsize::new(config.harvest.stop_after))
        .unwrap_or(NonZeroUsize::MIN);

    let cancel = CancelFlag::new();
    setup_signal_handler(&cancel)?;
    let harvester = Harvester::new(SystemClock::new(), cancel).stop_after(stop_after);

    progress.println(format!("\nTarget Telegram channel >>> '{}'", window.channel()));
    log::info!(
        "Scraping posts of {window} with random delay up to {:.2}s",
        window.max_sleep().as_secs_f64()
    );

    let task = HarvestTask::spawn(source, window.clone(), harvester)
        .context("Failed to start harvest thread")?;
    let pb = progress.harvest_line(window.channel());
    for event in task.progress() {
        match event {
            Progress::Accepted {
                count,
                post_id,
                date,
            } => {
                pb.set_position(count as u64);
                pb.set_message(format!("#{post_id} {date}"));
                if !progress.is_tty() && count % LOG_EVERY == 0 {
                    log::info!("{}: {} posts, last {date}", window.channel(), fmt_num(count));
                }
            }
        }
    }
    pb.finish_and_clear();

    let batch = task
        .join()
        .with_context(|| format!("Harvest of '{}' failed", window.channel()))?;
    if batch.was_cancelled() {
        log::warn!("Interrupted, keeping {} posts collected so far", batch.len());
    }
    Ok(batch)
}

fn finish(
    batch: &ResultBatch,
    window: &QueryWindow,
    output: &Path,
    config: &Config,
    progress: &SharedProgress,
) -> Result<()> {
    if let Some(first) = batch.records().first() {
        let excerpt: String = first.content().chars().take(SAMPLE_CHARS).collect();
        progress.println(format!(
            "Output sample:\n  Post #{}\n  URL: {}\n  Date: {}\n  Content: {excerpt}...",
            first.post_id(),
            first.post_url(),
            first.timestamp(),
        ));
    }

    let summary = export_records(batch.records(), output, config.output.compression_level)
        .with_context(|| format!("Failed to export to {}", output.display()))?;

    let (file, dataset) = match &summary {
        Some(s) => (
            s.path.display().to_string(),
            format!("{} rows × {} columns", fmt_num(s.rows), s.columns),
        ),
        None => {
            log::warn!("No posts found in {window}; nothing exported");
            ("not written".to_string(), "empty".to_string())
        }
    };

    print_summary(
        window.channel(),
        &[
            ("Window", window.to_string()),
            ("Posts", fmt_num(batch.len())),
            ("Stopped", batch.stop_reason().to_string()),
            ("Time", fmt_duration(batch.elapsed())),
            ("Speed", batch.throughput().to_string()),
            ("Dataset", dataset),
            ("Output", file),
        ],
    );
    Ok(())
}

/// Print a key-value summary table on stderr
fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

/// First signal: cancel the harvest at the next post boundary.
/// Second signal: exit immediately with status 130.
fn setup_signal_handler(cancel: &CancelFlag) -> Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        let cancel = cancel.clone();
        // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
        unsafe {
            signal_hook::low_level::register(signal, move || {
                if cancel.swap_cancel() {
                    std::process::exit(130);
                }
            })
        }
        .with_context(|| format!("Failed to register handler for signal {signal}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn interactive_defaults_cover_current_year() {
        let args = HarvestArgs::default();
        let mut p = prompter("https://t.me/s/durov\n\n\n\n");
        let window = resolve_window(&args, &Config::default(), &mut p, today()).unwrap();
        assert_eq!(window.channel(), "durov");
        assert_eq!(window.start().to_string(), "2024-01-01");
        assert_eq!(window.finish().unwrap().to_string(), "2024-12-31");
        assert!(window.verbose());
    }

    #[test]
    fn interactive_open_finish_and_redaction() {
        let args = HarvestArgs::default();
        let mut p = prompter("@chan\n2023-05-01\nopen\nn\n");
        let window = resolve_window(&args, &Config::default(), &mut p, today()).unwrap();
        assert!(window.is_open_ended());
        assert!(!window.verbose());
    }

    #[test]
    fn flags_skip_prompts() {
        let args = HarvestArgs {
            channel: Some("chan".into()),
            start: Some("2024-02-01".into()),
            finish: Some("2024-02-29".into()),
            no_content: true,
            max_sleep: Some(0.0),
            ..Default::default()
        };
        let mut p = prompter("");
        let window = resolve_window(&args, &Config::default(), &mut p, today()).unwrap();
        assert_eq!(window.to_string(), "chan from 2024-02-01 to 2024-02-29");
        assert!(!window.verbose());
    }

    #[test]
    fn yes_requires_channel_and_uses_defaults() {
        let mut p = prompter("");
        let args = HarvestArgs {
            yes: true,
            ..Default::default()
        };
        assert!(resolve_window(&args, &Config::default(), &mut p, today()).is_err());

        let args = HarvestArgs {
            channel: Some("chan".into()),
            yes: true,
            ..Default::default()
        };
        let mut config = Config::default();
        config.harvest.verbose = false;
        let window = resolve_window(&args, &config, &mut p, today()).unwrap();
        assert_eq!(window.start().to_string(), "2024-01-01");
        assert!(!window.verbose());
    }

    #[test]
    fn invalid_inputs_rejected() {
        let base = HarvestArgs {
            channel: Some("chan".into()),
            yes: true,
            ..Default::default()
        };
        let early = HarvestArgs {
            start: Some("2012-06-01".into()),
            ..base
        };
        let mut p = prompter("");
        assert!(resolve_window(&early, &Config::default(), &mut p, today()).is_err());

        let reversed = HarvestArgs {
            channel: Some("chan".into()),
            start: Some("2024-03-01".into()),
            finish: Some("2024-01-01".into()),
            yes: true,
            ..Default::default()
        };
        assert!(resolve_window(&reversed, &Config::default(), &mut p, today()).is_err());

        let blank = HarvestArgs {
            channel: Some("   ".into()),
            yes: true,
            ..Default::default()
        };
        assert!(resolve_window(&blank, &Config::default(), &mut p, today()).is_err());
    }
}
