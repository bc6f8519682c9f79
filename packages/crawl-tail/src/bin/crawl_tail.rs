// Terminal front end: start a crawl job and follow its log on stdout.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Term;
use crawl_tail::{
    config::parse_url, CursorKind, HttpJobClient, JobConfig, JobController, JobPreset, JobStatus,
    LogRenderer, Placeholder, StartBody, StatusPanel, StatusReflector, TailExit, TokioSleeper,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "crawl-tail")]
#[command(about = "Start a backend crawl job and follow its log until it finishes")]
struct Cli {
    /// Backend page: vrain-html, vrain-api or vrain-selenium
    #[arg(long, short)]
    preset: Option<JobPreset>,

    /// Backend origin (default: $CRAWL_BASE_URL or http://localhost:8000)
    #[arg(long)]
    base_url: Option<String>,

    /// Override the start endpoint
    #[arg(long)]
    start_url: Option<String>,

    /// Override the tail endpoint
    #[arg(long)]
    tail_url: Option<String>,

    /// Cursor strategy: since, offset or job-offset
    #[arg(long)]
    cursor: Option<CursorKind>,

    /// CSRF token sent as X-CSRFToken
    #[arg(long)]
    csrf_token: Option<String>,

    /// Raw Cookie header (session + csrftoken)
    #[arg(long)]
    cookie: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// JSON body for the start request
    #[arg(long, conflicts_with = "form")]
    json: Option<String>,

    /// Form field for the start request (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    form: Vec<String>,
}

impl Cli {
    fn resolve(&self) -> Result<JobConfig> {
        let mut config = JobConfig::from_env_with(self.preset, self.base_url.as_deref())?;

        if let Some(raw) = &self.start_url {
            config = config.with_start_url(parse_url("--start-url", raw)?);
        }
        if let Some(raw) = &self.tail_url {
            config = config.with_tail_url(parse_url("--tail-url", raw)?);
        }
        if let Some(cursor) = self.cursor {
            config = config.with_cursor(cursor);
        }
        if let Some(token) = &self.csrf_token {
            config = config.with_csrf_token(token.clone());
        }
        if let Some(cookie) = &self.cookie {
            config = config.with_cookie(cookie.clone());
        }
        if let Some(ms) = self.interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(raw) = &self.json {
            let value = serde_json::from_str(raw).context("--json must be valid JSON")?;
            config = config.with_start_body(StartBody::Json(value));
        }
        if !self.form.is_empty() {
            let pairs = self
                .form
                .iter()
                .map(|field| {
                    field
                        .split_once('=')
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .with_context(|| format!("--form expects KEY=VALUE, got {:?}", field))
                })
                .collect::<Result<Vec<_>>>()?;
            config = config.with_start_body(StartBody::Form(pairs));
        }

        config.validate()?;
        Ok(config)
    }
}

/// Prints log lines to stdout; the placeholder is erased once output arrives.
///
/// When stdout is not a terminal only the job's lines are written: no
/// placeholder and no cursor-control escapes.
struct TerminalLog {
    term: Term,
    interactive: bool,
    placeholder_shown: bool,
}

impl TerminalLog {
    fn new() -> Self {
        let term = Term::stdout();
        Self {
            interactive: term.is_term(),
            term,
            placeholder_shown: false,
        }
    }

    fn write(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            tracing::warn!(error = %e, "Failed to write log line");
        }
    }
}

impl LogRenderer for TerminalLog {
    fn append_lines(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        if std::mem::take(&mut self.placeholder_shown) && self.interactive {
            if let Err(e) = self.term.clear_last_lines(1) {
                tracing::warn!(error = %e, "Failed to erase placeholder");
            }
        }
        for line in lines {
            if line.starts_with("[ERROR]") {
                self.write(&line.red().to_string());
            } else {
                self.write(line);
            }
        }
    }

    fn reset(&mut self, placeholder: Placeholder) {
        if !self.interactive {
            return;
        }
        self.write(&placeholder.text().dimmed().to_string());
        self.placeholder_shown = true;
    }
}

/// Prints status changes to stderr.
#[derive(Default)]
struct TerminalStatus {
    panel: StatusPanel,
}

impl TerminalStatus {
    fn announce(&self, before: &StatusPanel) {
        let panel = &self.panel;
        if panel.spinner_visible != before.spinner_visible {
            if panel.spinner_visible {
                eprintln!("{} {}", "●".yellow(), panel.caption.yellow());
            } else {
                eprintln!("{} {}", "✓".green(), panel.caption.green());
            }
        }
        if panel.last_run != before.last_run {
            if let Some(at) = &panel.last_run {
                eprintln!("  Last run:    {}", at.bold());
            }
        }
        if panel.output_size != before.output_size {
            eprintln!("  Output size: {}", panel.output_size.bold());
        }
        if panel.last_file != before.last_file {
            if let Some(file) = &panel.last_file {
                eprintln!("  Last file:   {}", file.bold());
            }
        }
    }
}

impl StatusReflector for TerminalStatus {
    fn set_running(&mut self, running: bool) {
        let before = self.panel.clone();
        self.panel.set_running(running);
        self.announce(&before);
    }

    fn apply(&mut self, status: &JobStatus) {
        let before = self.panel.clone();
        self.panel.apply(status);
        self.announce(&before);
    }

    fn report_error(&mut self, message: &str) {
        self.panel.report_error(message);
        eprintln!("{} {}", "✗".red(), message.red());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the job's own output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,crawl_tail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve().context("Failed to load configuration")?;
    tracing::info!(
        job = %config.name,
        tail_url = %config.tail_url,
        cursor = %config.cursor,
        interval_ms = config.poll_interval.as_millis() as u64,
        "Configuration loaded"
    );

    let controller = JobController::new(
        &config,
        HttpJobClient::new(config.clone()),
        TerminalLog::new(),
        TerminalStatus::default(),
    );

    let run = controller.start().await.context("Failed to start job")?;

    tokio::select! {
        exit = run.run(TokioSleeper) => match exit {
            TailExit::Completed => tracing::info!("Job finished"),
            TailExit::Superseded => tracing::warn!("Tail run was superseded"),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted; leaving the job running on the server");
        }
    }

    if let Some(code) = controller.with_reflector(|status| status.panel.last_return_code) {
        eprintln!("  Return code: {}", code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piped_log() -> TerminalLog {
        TerminalLog {
            term: Term::stdout(),
            interactive: false,
            placeholder_shown: false,
        }
    }

    #[test]
    fn test_piped_output_never_shows_placeholder() {
        let mut log = piped_log();
        log.reset(Placeholder::Waiting);
        assert!(!log.placeholder_shown);

        log.append_lines(&["Saved 12 rows".to_string()]);
        assert!(!log.placeholder_shown);
    }

    #[test]
    fn test_placeholder_is_erased_once() {
        let mut log = piped_log();
        log.placeholder_shown = true;

        log.append_lines(&[]);
        assert!(log.placeholder_shown);

        log.append_lines(&["first".to_string()]);
        assert!(!log.placeholder_shown);
    }

    #[test]
    fn test_form_fields_parse_into_body() {
        let cli = Cli::parse_from([
            "crawl-tail",
            "--preset",
            "vrain-api",
            "--form",
            "province=Hanoi",
            "--form",
            "days=3",
        ]);
        assert_eq!(cli.preset, Some(JobPreset::VrainApi));
        assert_eq!(cli.form, vec!["province=Hanoi", "days=3"]);
    }
}
