//! End-to-end pipeline: header discovery, per-file parsing, sequential merge
//! and resolution.

use crate::config::{Config, InputConfig};
use crate::error::{Error, SourceError, Warning};
use crate::metadata::MetadataGraph;
use crate::parser::{parse_source, ParseOutput};
use crate::resolver::resolve;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn has_header_extension(path: &Path, input: &InputConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| input.header_extensions.iter().any(|h| h.eq_ignore_ascii_case(ext)))
}

/// Expands the input paths into the list of headers to parse.
///
/// Files are kept in the order given. Directories are walked recursively and
/// contribute their matching headers sorted by path.
pub fn collect_headers(paths: &[PathBuf], input: &InputConfig) -> Result<Vec<PathBuf>, Error> {
    let mut headers = Vec::new();

    for path in paths {
        if path.is_file() {
            headers.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(Error::Io {
                path: path.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry.map_err(|err| Error::Io {
                path: err.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone()),
                source: err.into(),
            })?;
            if entry.file_type().is_file() && has_header_extension(entry.path(), input) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        tracing::debug!(dir = %path.display(), headers = found.len(), "collected headers");
        headers.extend(found);
    }

    Ok(headers)
}

/// Name recorded in source locations: relative to the include root when the
/// file lives under it, with `/` separators.
pub fn display_name(path: &Path, include_root: Option<&Path>) -> String {
    let relative = include_root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Parses every header and merges the results in input order.
///
/// Each file stops at its first source error, but every file is parsed so
/// that all of them are reported together.
pub fn parse_headers(paths: &[PathBuf], config: &Config) -> Result<ParseOutput, Error> {
    let mut output = ParseOutput::default();
    let mut errors: Vec<SourceError> = Vec::new();
    let include_root = config.input.include_root.as_deref();

    for path in paths {
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let file = display_name(path, include_root);

        match parse_source(&file, &source, config) {
            Ok(parsed) => {
                output.warnings.extend(parsed.warnings);
                if let Err(err) = output.declarations.merge(parsed.declarations) {
                    errors.push(err);
                }
            }
            Err(err) => {
                tracing::debug!(file = %file, error = %err, "parse failed");
                errors.push(err);
            }
        }
    }

    if !errors.is_empty() {
        return Err(Error::Source(errors));
    }
    Ok(output)
}

/// Collects, parses and resolves `paths` into a metadata graph.
///
/// The returned warnings are the parse warnings followed by the resolver's.
pub fn generate(paths: &[PathBuf], config: &Config) -> Result<(MetadataGraph, Vec<Warning>), Error> {
    let headers = collect_headers(paths, &config.input)?;
    tracing::info!(headers = headers.len(), "parsing headers");

    let parsed = parse_headers(&headers, config)?;
    let (graph, resolve_warnings) = resolve(parsed.declarations)?;

    let mut warnings = parsed.warnings;
    warnings.extend(resolve_warnings);
    Ok((graph, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_relative_to_root() {
        let root = Path::new("/sdk/include");
        assert_eq!(
            display_name(Path::new("/sdk/include/ui/Widget.h"), Some(root)),
            "ui/Widget.h"
        );
        assert_eq!(
            display_name(Path::new("/other/Widget.h"), Some(root)),
            "/other/Widget.h"
        );
        assert_eq!(display_name(Path::new("a/b.h"), None), "a/b.h");
    }

    #[test]
    fn test_extension_filter_ignores_case() {
        let input = InputConfig::default();
        assert!(has_header_extension(Path::new("x/Y.H"), &input));
        assert!(has_header_extension(Path::new("x/y.hpp"), &input));
        assert!(!has_header_extension(Path::new("x/y.cpp"), &input));
        assert!(!has_header_extension(Path::new("x/README"), &input));
    }
}
