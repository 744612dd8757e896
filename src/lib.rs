//! # Introduction
//!
//! wrapmeta reads C++ SDK headers annotated with export markers and produces
//! a language-neutral metadata graph for binding generators: every exported
//! enum, struct, class, interface, class template, typedef and function, with
//! fully-qualified and classified type references and stable binding symbols.
//!
//! ## Pipeline
//!
//! ```text
//! Headers → WordReader → Parser → Declarations → Resolver → MetadataGraph → JSON
//! ```
//!
//! 1. [`parser`]: splits header text into words and parses the annotated
//!    subset into per-file [`metadata::Declarations`].
//! 2. [`pipeline`]: collects headers, parses each file and merges the results
//!    sequentially.
//! 3. [`resolver`]: six whole-graph passes (template harvesting, namespace
//!    resolution, classification, template parameter marking, instance
//!    propagation, naming).
//! 4. [`metadata`]: the resulting read-only [`metadata::MetadataGraph`],
//!    serializable with serde.
//!
//! ## Example
//!
//! ```
//! use wrapmeta::{config::Config, parser::parse_source, resolver::resolve};
//!
//! let config = Config::default();
//! let parsed = parse_source("api.h", "WRAP_API int Answer();", &config).unwrap();
//! let (graph, _warnings) = resolve(parsed.declarations).unwrap();
//! assert!(graph.functions().contains_key("Answer_int"));
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metadata;
pub mod parser;
pub mod pipeline;
pub mod resolver;

pub use config::Config;
pub use error::{Error, ResolveError, SourceError, SourceErrorKind, Warning};
pub use metadata::{Declarations, MetadataGraph};
pub use pipeline::{collect_headers, generate, parse_headers};
