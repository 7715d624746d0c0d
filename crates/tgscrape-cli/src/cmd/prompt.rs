//! Line-based terminal prompts

use std::io::{self, BufRead, Stderr, StdinLock, Write};

use anyhow::{Context, Result, bail};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stderr> {
    /// Read answers from stdin, print questions on stderr
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Trimmed answer line, `None` at end of input
    fn answer(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        Ok((n > 0).then(|| line.trim().to_string()))
    }

    /// Free-form answer; empty input takes `default` when there is one
    pub fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String> {
        let question = match default {
            Some(d) => format!("{question} [{d}]"),
            None => question.to_string(),
        };
        let answer = self.answer(&question)?.unwrap_or_default();
        match (answer.is_empty(), default) {
            (false, _) => Ok(answer),
            (true, Some(d)) => Ok(d.to_string()),
            (true, None) => bail!("No answer given"),
        }
    }

    /// y/n question where empty input takes `default`
    pub fn yes_no(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.answer(&format!("{question} {hint}"))?.unwrap_or_default();
        if answer.is_empty() {
            return Ok(default);
        }
        parse_yes_no(&answer)
    }

    /// y/n question without a default; anything else is an error
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.answer(&format!("{question} y/n"))?.unwrap_or_default();
        parse_yes_no(&answer)
    }
}

fn parse_yes_no(answer: &str) -> Result<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => bail!("Received an invalid response '{answer}'"),
    }
}
