//! Command-line interface
//!
//! `wrapmeta [OPTIONS] <PATHS>...` parses the given headers (directories are
//! walked) and prints the resolved metadata graph as JSON.

use crate::config::Config;
use crate::diagnostics;
use crate::error::Error;
use crate::pipeline;
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Extract binding metadata from annotated C++ SDK headers
#[derive(Debug, Parser)]
#[command(name = "wrapmeta")]
#[command(version)]
#[command(about = "Extract binding metadata from annotated C++ SDK headers", long_about = None)]
pub struct Cli {
    /// Header files or directories to scan
    #[arg(value_name = "PATHS", required = true)]
    pub paths: Vec<PathBuf>,

    /// Configuration file layered over wrapmeta.toml
    #[arg(short, long, value_name = "FILE", env = "WRAPMETA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the JSON graph here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON graph
    #[arg(long)]
    pub pretty: bool,

    /// Write a full trace of parsing and resolution to this file
    #[arg(long, value_name = "FILE")]
    pub trace_log: Option<PathBuf>,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report progress while parsing and resolving
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Runs the whole pipeline and writes the graph.
    pub fn run(&self) -> Result<(), Error> {
        diagnostics::init_tracing(self.quiet, self.verbose, self.trace_log.as_deref())?;
        let config = Config::load(self.config.as_deref())?;

        let (graph, warnings) = pipeline::generate(&self.paths, &config)?;
        if !self.quiet {
            // Nothing sensible to do if stderr is gone.
            let _ = diagnostics::report_warnings(&mut io::stderr().lock(), &warnings);
        }

        let json = graph
            .to_json(self.pretty)
            .map_err(|err| Error::Internal(format!("failed to serialize metadata: {err}")))?;

        match &self.output {
            Some(path) => fs::write(path, json + "\n").map_err(|source| Error::Io {
                path: path.clone(),
                source,
            }),
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{json}").map_err(|source| Error::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })
            }
        }
    }
}
