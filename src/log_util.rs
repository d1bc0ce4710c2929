use std::{io::stdout, path::Path};

use time::{format_description, OffsetDateTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    EnvFilter,
};

/// Logs to stdout and to `log_<timestamp>.log` inside `log_dir`. Keep the
/// returned guards alive until exit or buffered lines are lost.
pub fn init(log_dir: &Path) -> anyhow::Result<(WorkerGuard, WorkerGuard)> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description::parse("[year][month][day]_[hour][minute][second]")?;
    let log_file_name = format!("log_{}.log", now.format(&format)?);

    std::fs::create_dir_all(log_dir)?;
    println!("log file path: {}", log_dir.join(&log_file_name).display());

    let log_file = tracing_appender::rolling::never(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(log_file);
    let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(stdout());

    let timer = OffsetTime::new(now.offset(), time::format_description::well_known::Rfc3339);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing::subscriber::set_global_default(
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_timer(timer.clone())
            .with_writer(non_blocking_stdout)
            .finish()
            .with(
                fmt::Layer::default()
                    .with_timer(timer)
                    .with_ansi(false)
                    .with_writer(non_blocking_file),
            ),
    )?;

    Ok((stdout_guard, file_guard))
}
