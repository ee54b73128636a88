//! Tracing initialization.
//! Builds a subscriber with EnvFilter, supports compact or JSON formats, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by LogLevel (no RUST_LOG override here).
//! - Console logs go to stderr so stdout carries only user-facing narration.
//! - If `log_file` is provided and passes safety checks, a non-blocking file layer is added.
//! - Each sink caps its own level; the global filter admits the most verbose of them.
//! - File logging uses tracing_appender::non_blocking and is refused if any ancestor
//!   of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use junction_move::output as out;
use junction_move::platform::open_log_file_secure_append;
use junction_move::{LogLevel, path_has_symlink_ancestor};
use std::fmt as stdfmt;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::{Registry, registry};
use tracing_subscriber::util::SubscriberInitExt;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%d/%m/%y %H:%M:%S"))
    }
}

/// Console threshold. Progress at the default level is carried by the narration.
#[inline]
fn console_level(lvl: &LogLevel) -> Level {
    match lvl {
        LogLevel::Quiet => Level::ERROR,
        LogLevel::Normal => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::TRACE,
    }
}

/// The file log always records at least INFO.
#[inline]
fn file_level(lvl: &LogLevel) -> Level {
    match lvl {
        LogLevel::Quiet | LogLevel::Normal | LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::TRACE,
    }
}

#[inline]
fn env_filter_from_level(level_filter: LevelFilter) -> EnvFilter {
    let level_str = match level_filter {
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
        _ => "info",
    };
    EnvFilter::new(level_str)
}

/// Try to open a non-blocking file writer for logging:
/// - Refuse if any ancestor is a symlink (prints a warning and returns None)
/// - Open file for append (parent created) and wrap with non_blocking
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            out::print_warn(&format!(
                "Refusing to enable file logging: ancestor of {} is a symlink.",
                path.display()
            ));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!(
                "Error checking log path {} for symlinks: {e}",
                path.display()
            ));
            return None;
        }
        Ok(false) => {}
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!("Failed to open log file {}: {e}", path.display()));
            None
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// One fmt layer; compact or JSON, same timer and metadata either way.
fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(ansi)
        .with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.compact().boxed()
    }
}

/// Initialize tracing based on LogLevel and format. Returns an optional WorkerGuard
/// if a file appender is created (must be held until shutdown to flush logs).
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let console = console_level(lvl);
    let mut layers = vec![fmt_layer(
        io::stderr.with_max_level(console),
        json,
        atty::is(atty::Stream::Stderr),
    )];
    let mut global = console;
    let mut guard = None;

    if let Some(path) = log_file {
        match maybe_open_non_blocking_writer(path) {
            Some((writer, g)) => {
                let file = file_level(lvl);
                layers.push(fmt_layer(writer.with_max_level(file), json, false));
                global = global.max(file);
                guard = Some(g);
            }
            None => out::print_warn(&format!(
                "File logging to '{}' is not enabled; logs continue on the console.",
                path.display()
            )),
        }
    }

    registry()
        .with(layers)
        .with(env_filter_from_level(LevelFilter::from_level(global)))
        .try_init()?;
    Ok(guard)
}
