//! Annotated C++ header parser
//!
//! This module turns header text into [`Declarations`](crate::metadata::Declarations):
//! - [`reader`]: word splitting (source text → words)
//! - [`parse`]: parser core, comments, top-level declarations
//! - `types`, `declarations`, `classes`, `functions`: the grammar, split by
//!   construct
//!
//! # Supported Subset
//!
//! Only declarations carrying the configured export markers are extracted:
//! - Namespaces (`a::b` syntax included), `extern "C"` blocks
//! - Enums, structs, classes, interfaces, class templates, typedefs, aliases
//! - Free functions, methods, constructors, destructors, operators
//! - `[[deprecated]]`, `///` and `/** */` documentation
//!
//! Function bodies, initializers and unexported declarations are skipped
//! without being interpreted. No preprocessing is performed.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent over whitespace/punctuation-delimited
//! words. No external parser generator dependencies.

mod classes;
mod declarations;
mod functions;
pub mod parse;
pub mod reader;
mod types;

pub use parse::{ParseContext, ParseOutput, Parser};
pub use types::is_primitive;

use crate::config::Config;
use crate::error::SourceError;
use crate::metadata::TypeDescriptor;

/// Parses one header. `file` is the name recorded in source locations.
pub fn parse_source(file: &str, source: &str, config: &Config) -> Result<ParseOutput, SourceError> {
    let mut ctx = ParseContext::new();
    Parser::new(file, source, config).parse_into(&mut ctx)?;
    Ok(ctx.into_output())
}

/// Parses a standalone type expression such as `const std::vector<int>&`.
///
/// `Ok(None)` for `void`.
pub fn parse_type_expression(text: &str, config: &Config) -> Result<Option<TypeDescriptor>, SourceError> {
    let source = format!("{text} ;");
    let mut parser = Parser::new("<type>", &source, config);
    let first = parser.expect_next("type")?;
    let (ty, end) = parser.parse_type(first)?;
    if end != ";" {
        return Err(parser.unexpected("end of type", &end));
    }
    Ok(ty)
}
