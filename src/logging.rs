use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub const LOG_FILE_VAR: &str = "RUST_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "logs/flagscape.log";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Directory and file name prefix for the daily rolling appender.
fn split_log_path(path: &str) -> (PathBuf, OsString) {
    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("flagscape.log"));
    (dir.to_path_buf(), file)
}

/// Installs the global subscriber: compact stderr output plus a daily log file
/// (`RUST_LOG_FILE`, default `logs/flagscape.log`). `RUST_LOG` filters both.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    let log_path = env::var(LOG_FILE_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (dir, file) = split_log_path(&log_path);
    let (nb_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));
    let _ = FILE_GUARD.set(guard);

    let file_layer = fmt::layer()
        .with_writer(nb_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // panics go through the log, backtrace included
    std::panic::set_hook(Box::new(|info| {
        let mut msg = String::new();
        if let Some(loc) = info.location() {
            msg.push_str(&format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()));
        }
        if let Some(s) = info.payload().downcast_ref::<&str>() {
            msg.push_str(s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            msg.push_str(s);
        } else {
            msg.push_str("<non-string panic>");
        }
        let bt = std::backtrace::Backtrace::force_capture();
        tracing::error!("{}\nBacktrace:\n{:?}", msg, bt);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_splits_into_dir_and_prefix() {
        let (dir, file) = split_log_path("logs/flagscape.log");
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(file, OsString::from("flagscape.log"));
    }

    #[test]
    fn bare_file_name_logs_to_working_dir() {
        let (dir, file) = split_log_path("run.log");
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, OsString::from("run.log"));
    }

    #[test]
    fn nested_temp_dir_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("app.log");
        let (dir, file) = split_log_path(path.to_str().unwrap());
        assert_eq!(dir, tmp.path().join("nested"));
        assert_eq!(file, OsString::from("app.log"));
    }
}
