//! Log subscriber setup and user-facing error reporting.

use crate::error::{Error, Warning};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Overrides the stderr log level, e.g. `WRAPMETA_LOG=wrapmeta::resolver=debug`.
pub const LOG_ENV: &str = "WRAPMETA_LOG";

/// Installs the global subscriber.
///
/// Stderr gets `warn` by default, `error` with `quiet` and `debug` with
/// `verbose`, unless [`LOG_ENV`] is set. With `trace_log`, every event down
/// to `trace` is also written to that file, prefixed with its span path
/// (`file`, `namespace`, `class`, `function`, `pass`).
pub fn init_tracing(quiet: bool, verbose: bool, trace_log: Option<&Path>) -> Result<(), Error> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let stderr = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter);

    let trace = match trace_log {
        Some(path) => {
            let file = File::create(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .without_time()
                    .with_filter(LevelFilter::TRACE),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(trace)
        .try_init()
        .map_err(|err| Error::Internal(format!("failed to initialize tracing subscriber: {err}")))
}

/// Prints warnings as `file:line: warning: message`.
pub fn report_warnings(out: &mut impl Write, warnings: &[Warning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "{warning}")?;
    }
    Ok(())
}

/// Prints a failed run: one `file:line: message` line per source error.
pub fn report_error(out: &mut impl Write, err: &Error) -> io::Result<()> {
    match err {
        Error::Source(errors) => {
            for error in errors {
                writeln!(out, "{error}")?;
            }
            writeln!(out, "wrapmeta: {err}")
        }
        Error::Internal(_) => writeln!(out, "wrapmeta: {err} (this is a bug in wrapmeta)"),
        _ => writeln!(out, "wrapmeta: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SourceError, SourceErrorKind};
    use crate::metadata::SourceLocation;

    #[test]
    fn test_source_errors_are_listed_one_per_line() {
        let err = Error::Source(vec![
            SourceError::new(SourceLocation::new("a.h", 3), SourceErrorKind::UnmatchedBrace),
            SourceError::new(
                SourceLocation::new("b.h", 7),
                SourceErrorKind::Unsupported("#pragma pack".to_string()),
            ),
        ]);

        let mut out = Vec::new();
        report_error(&mut out, &err).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("a.h:3: "));
        assert!(lines[1].contains("#pragma pack is not supported"));
        assert_eq!(lines[2], "wrapmeta: 2 source error(s)");
    }

    #[test]
    fn test_warnings_are_prefixed_with_location() {
        let warning = Warning {
            location: SourceLocation::new("x.h", 1),
            message: "interface 'Thing' should follow the naming pattern 'IName'".to_string(),
        };
        let mut out = Vec::new();
        report_warnings(&mut out, &[warning]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "x.h:1: warning: interface 'Thing' should follow the naming pattern 'IName'\n"
        );
    }
}
