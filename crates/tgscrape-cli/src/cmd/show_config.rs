//! Config subcommand - print the effective configuration

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

pub fn table(config: &Config) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Output directory",
        &config.output.default_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Compression level",
        &format!("gzip {}", config.output.compression_level),
    ]);
    table.add_row(vec!["Max sleep", &format!("{}s", config.harvest.max_sleep)]);
    table.add_row(vec![
        "Post contents",
        if config.harvest.verbose {
            "included"
        } else {
            "redacted"
        },
    ]);
    table.add_row(vec!["Stop after", &config.harvest.stop_after.to_string()]);
    table.add_row(vec!["Telegram URL", &config.telegram.base_url]);
    table.add_row(vec!["User agent", &config.telegram.user_agent]);
    table.add_row(vec![
        "Read timeout",
        &format!("{}s", config.http.read_timeout),
    ]);
    table.add_row(vec![
        "Connect timeout",
        &format!("{}s", config.http.connect_timeout),
    ]);
    table.add_row(vec!["Max retries", &config.http.max_retries.to_string()]);
    table
}

pub fn run(config: &Config) {
    eprintln!("\n{}", table(config));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_section() {
        let rendered = table(&Config::default()).to_string();
        for label in ["Output directory", "Max sleep", "Telegram URL", "Max retries"] {
            assert!(rendered.contains(label), "missing {label}");
        }
        assert!(rendered.contains("https://t.me"));
    }
}
