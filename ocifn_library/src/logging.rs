use crate::transaction::TransactionId;
use crate::utils::file_utils::ensure_dir;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;

#[derive(Debug, serde::Deserialize, Default, Clone)]
/// Details about how/where to log to
pub struct LoggingConfig {
    /// the min log level
    /// see [tracing_subscriber::filter::Builder::parse()]
    pub level: String,
    /// Directory to store logs in, formatted as JSON.
    /// If empty, no log file is written.
    #[serde(default)]
    pub directory: String,
    /// Additionally write human-readable logs to stderr.
    /// Stdout is reserved for command output.
    #[serde(default)]
    pub stderr: Option<bool>,
    /// log filename start string
    #[serde(default)]
    pub basename: String,
    /// How to log spans, in all caps
    /// look at for details [mod@tracing_subscriber::fmt::format]
    /// Multiple options can be passed by listing them as a list using '+' between values.
    #[serde(default)]
    pub spanning: String,
    /// Include currently entered spans when logging JSON messages.
    /// See (here for more details)<https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/format/struct.Json.html#method.with_span_list>
    #[serde(default)]
    pub include_spans_json: bool,
}

fn parse_span(span: &str) -> Result<FmtSpan> {
    Ok(match span {
        "NEW" => FmtSpan::NEW,
        "ENTER" => FmtSpan::ENTER,
        "EXIT" => FmtSpan::EXIT,
        "CLOSE" => FmtSpan::CLOSE,
        "NONE" => FmtSpan::NONE,
        "" => FmtSpan::NONE,
        "ACTIVE" => FmtSpan::ACTIVE,
        "FULL" => FmtSpan::FULL,
        _ => anyhow::bail!("Unknown spanning value {}", span),
    })
}

pub(crate) fn str_to_span(spanning: &str) -> Result<FmtSpan> {
    spanning
        .split('+')
        .map(parse_span)
        .try_fold(FmtSpan::NONE, |acc, item| Ok::<FmtSpan, anyhow::Error>(acc | item?))
}

fn panic_hook() {
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("!!Thread panicked!!");
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("<unnamed>");

        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &**s,
                None => "Box<Any>",
            },
        };

        match info.location() {
            Some(location) => {
                tracing::error!(
                    target: "panic", "thread '{}' panicked at '{}': {}:{}",
                    thread,
                    msg,
                    location.file(),
                    location.line(),
                );
            },
            None => tracing::error!(target: "panic", "thread '{}' panicked at '{}'", thread, msg),
        }
    }));
}

/// Install the global tracing subscriber described by `config`.
/// The returned value holds the non-blocking writer guards and must be kept alive until exit,
/// otherwise buffered log lines are lost.
pub fn start_tracing(config: &LoggingConfig, tid: &TransactionId) -> Result<impl Drop> {
    #[allow(dyn_drop)]
    let mut drops: Vec<Box<dyn Drop>> = vec![];

    let file_layer = match config.directory.is_empty() {
        true => None,
        false => {
            let fname = format!("{}.log", config.basename);
            ensure_dir(&PathBuf::from(&config.directory))?;
            let dir = match std::fs::canonicalize(&config.directory) {
                Ok(d) => d,
                Err(e) => anyhow::bail!("Failed to canonicalize log directory '{}', error: '{}'", config.directory, e),
            };

            let appender = tracing_appender::rolling::never(dir, fname);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            drops.push(Box::new(guard));
            Some(
                tracing_subscriber::fmt::Layer::default()
                    .with_span_events(str_to_span(&config.spanning)?)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(file_writer)
                    .json()
                    .with_span_list(config.include_spans_json),
            )
        },
    };

    let stderr_layer = match config.stderr.unwrap_or(false) {
        true => {
            let (stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
            drops.push(Box::new(guard));
            Some(
                tracing_subscriber::fmt::Layer::default()
                    .with_span_events(str_to_span(&config.spanning)?)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(stderr)
                    .with_ansi(false)
                    .compact(),
            )
        },
        false => None,
    };

    let subscriber = Registry::default()
        .with(EnvFilter::builder().parse(&config.level)?)
        .with(file_layer)
        .with(stderr_layer);
    match tracing::subscriber::set_global_default(subscriber) {
        Ok(_) => {
            panic_hook();
            info!(tid = tid, "Logger initialized");
            Ok(drops)
        },
        Err(e) => {
            warn!(tid=tid, error=%e, "Global tracing subscriber was already set");
            Ok(vec![])
        },
    }
}
