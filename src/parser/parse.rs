//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, the [`ParseContext`] it fills,
//! the shared token helpers and the top-level declaration loop.
//!
//! # Parser Architecture
//!
//! Parsing is recursive descent over the words produced by [`WordReader`]:
//! - This module: Parser struct, comment/doc handling, helpers, top level
//! - `types`: type expressions
//! - `declarations`: namespaces, enums, typedefs, templates, struct/class gating
//! - `classes`: class and struct bodies, fields, nested types, interfaces
//! - `functions`: function and operator declarations
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks.
//! Everything a parse produces goes into an explicit [`ParseContext`] passed
//! down by `&mut`, so one file's parse shares no state with another's.

use crate::config::Config;
use crate::error::{SourceError, SourceErrorKind, Warning};
use crate::metadata::{Declarations, Deprecation, NamespacePath, SourceLocation};
use crate::parser::reader::WordReader;

/// Declarations and warnings produced by parsing one or more files.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub declarations: Declarations,
    pub warnings: Vec<Warning>,
}

/// Mutable state threaded through the recursive parse functions.
#[derive(Debug, Default)]
pub struct ParseContext {
    /// Active namespace path, including enclosing class names while a class
    /// body is being parsed.
    pub namespace: NamespacePath,
    /// Segments pushed by each open top-level brace (`extern "C"` pushes 0).
    scopes: Vec<usize>,
    pub declarations: Declarations,
    pub warnings: Vec<Warning>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open_scope(&mut self, segments: Vec<String>) {
        self.scopes.push(segments.len());
        for segment in segments {
            self.namespace.push(segment);
        }
    }

    /// Pops the innermost scope. `false` when none is open.
    pub(crate) fn close_scope(&mut self) -> bool {
        match self.scopes.pop() {
            Some(count) => {
                for _ in 0..count {
                    self.namespace.pop();
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn warn(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.warnings.push(Warning::new(location, message));
    }

    pub fn into_output(self) -> ParseOutput {
        ParseOutput {
            declarations: self.declarations,
            warnings: self.warnings,
        }
    }
}

/// Recursive descent parser for one header file
pub struct Parser<'c> {
    pub(crate) reader: WordReader,
    pub(crate) config: &'c Config,
    pub(crate) file: String,
    /// Documentation lines waiting for the next declaration.
    pub(crate) docs: Vec<String>,
}

impl<'c> Parser<'c> {
    pub fn new(file: impl Into<String>, source: &str, config: &'c Config) -> Self {
        Self {
            reader: WordReader::new(source),
            config,
            file: file.into(),
            docs: Vec::new(),
        }
    }

    /// Parse the whole file into `ctx`.
    pub fn parse_into(&mut self, ctx: &mut ParseContext) -> Result<(), SourceError> {
        let _span = tracing::debug_span!("file", file = %self.file).entered();
        tracing::debug!("begin parsing");
        self.parse_top_level(ctx)?;
        tracing::debug!("end parsing");
        Ok(())
    }

    fn parse_top_level(&mut self, ctx: &mut ParseContext) -> Result<(), SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let mut carried: Option<String> = None;
        let mut pending_deprecation: Option<Deprecation> = None;

        while let Some(word) = carried.take().or_else(|| self.next()) {
            let deprecation = pending_deprecation.take();

            match word.as_str() {
                "#" => {
                    self.clear_docs();
                    self.parse_directive()?;
                }
                "[" => pending_deprecation = self.parse_attribute()?.or(deprecation),
                ";" => {}
                "}" => {
                    self.clear_docs();
                    if !ctx.close_scope() {
                        return Err(self.error(SourceErrorKind::UnmatchedBrace));
                    }
                    tracing::debug!(namespace = %ctx.namespace, "exiting scope");
                    self.skip_optional_semicolon();
                }
                "namespace" => {
                    self.clear_docs();
                    self.parse_namespace(ctx)?;
                }
                "inline" => {
                    let next = self.expect_next("declaration after 'inline'")?;
                    if next == "namespace" {
                        self.clear_docs();
                        self.parse_namespace(ctx)?;
                    } else {
                        self.skip_declaration(&next)?;
                    }
                }
                "extern" => {
                    let next = self.expect_next("declaration after 'extern'")?;
                    if next.starts_with('"') {
                        let after = self.expect_next("declaration after linkage")?;
                        if after == "{" {
                            ctx.open_scope(Vec::new());
                        } else {
                            carried = Some(after);
                        }
                    } else {
                        self.skip_declaration(&next)?;
                    }
                }
                "using" => self.parse_using(ctx, true)?,
                "typedef" => self.parse_typedef(ctx, true)?,
                "enum" => {
                    let docs = self.take_docs();
                    if let Some(mut e) = self.parse_enum(ctx, false)? {
                        e.docs = docs;
                        ctx.declarations.add_enum(e)?;
                    }
                }
                "struct" => {
                    let docs = self.take_docs();
                    if let Some(mut s) = self.parse_struct(ctx, false)? {
                        s.docs = docs;
                        ctx.declarations.add_struct(s)?;
                    }
                }
                "class" => {
                    let docs = self.take_docs();
                    if let Some(mut c) = self.parse_class(ctx, false)? {
                        c.docs = docs;
                        ctx.declarations.add_class(c)?;
                    }
                }
                "template" => {
                    let docs = self.take_docs();
                    self.parse_template(ctx, docs)?;
                }
                w if w == markers.interface => {
                    let docs = self.take_docs();
                    if let Some(mut i) = self.parse_interface(ctx, false)? {
                        i.docs = docs;
                        ctx.declarations.add_interface(i)?;
                    }
                }
                w if w == markers.ignore_start => {
                    self.clear_docs();
                    self.skip_ignore_block()?;
                }
                w if w == markers.no_export => {
                    self.clear_docs();
                    let next = self.expect_next("declaration after no-export marker")?;
                    self.skip_declaration(&next)?;
                }
                w if markers.is_export(w) || markers.is_function_marker(w) => {
                    let docs = self.take_docs();
                    let first = if markers.is_export(w) {
                        self.expect_next("function declaration")?
                    } else {
                        word.clone()
                    };
                    let mut function = self.parse_function(ctx, first, None)?;
                    function.docs = docs;
                    function.deprecation = deprecation;
                    function.unique_name = crate::resolver::naming::function_unique_name(&function);
                    tracing::debug!(function = %function.unique_name, "found function");
                    ctx.declarations.add_function(function)?;
                }
                _ => {
                    tracing::trace!(word = %word, "skipping unexported declaration");
                    self.skip_declaration(&word)?;
                }
            }
        }

        if !ctx.scopes.is_empty() {
            return Err(self.error(SourceErrorKind::UnclosedNamespace(
                ctx.namespace.to_string(),
            )));
        }
        Ok(())
    }

    // ===== Token helpers =====

    /// Next word after any comments. String and character literals come
    /// back whole, quotes included.
    pub(crate) fn next(&mut self) -> Option<String> {
        self.skip_trivia();
        match self.reader.peek_char(0) {
            Some('"') | Some('\'') => self.reader.read_quoted(),
            _ => self.reader.next_word(),
        }
    }

    pub(crate) fn expect_next(&mut self, expected: &str) -> Result<String, SourceError> {
        match self.next() {
            Some(word) => Ok(word),
            None => Err(self.error(SourceErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            })),
        }
    }

    pub(crate) fn expect(&mut self, token: &str, expected: &str) -> Result<(), SourceError> {
        let word = self.expect_next(expected)?;
        if word == token {
            Ok(())
        } else {
            Err(self.unexpected(expected, &word))
        }
    }

    pub(crate) fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.reader.current_line())
    }

    pub(crate) fn error(&self, kind: SourceErrorKind) -> SourceError {
        SourceError::new(self.location(), kind)
    }

    pub(crate) fn unexpected(&self, expected: &str, found: &str) -> SourceError {
        self.error(SourceErrorKind::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }

    pub(crate) fn skip_optional_semicolon(&mut self) {
        self.skip_trivia();
        if self.reader.peek_char(0) == Some(';') {
            self.reader.skip(1);
        }
    }

    // ===== Comments and documentation =====

    /// Consumes whitespace and comments in front of the cursor.
    ///
    /// `///` lines and `/** */` blocks accumulate as documentation, `///<`
    /// trailing docs are dropped, and any other comment clears what has been
    /// accumulated so far.
    pub(crate) fn skip_trivia(&mut self) {
        loop {
            self.reader.skip_whitespace();
            let r = &self.reader;
            let lead = (r.peek_char(0), r.peek_char(1), r.peek_char(2), r.peek_char(3));

            match lead {
                (Some('/'), Some('/'), Some('/'), Some('<')) => self.reader.skip_line(),
                (Some('/'), Some('/'), Some('/'), next) if next != Some('/') => {
                    self.reader.skip_char(3);
                    let line = self.reader.read_line();
                    if !line.is_empty() {
                        self.docs.push(line);
                    }
                }
                (Some('/'), Some('/'), _, _) => {
                    self.docs.clear();
                    self.reader.skip_line();
                }
                (Some('/'), Some('*'), Some('*'), next)
                    if next != Some('/') && next != Some('<') =>
                {
                    let body = self.reader.read_block_comment();
                    self.docs.extend(
                        body.lines()
                            .map(|l| l.trim().trim_start_matches('*').trim())
                            .filter(|l| !l.is_empty())
                            .map(str::to_string),
                    );
                }
                (Some('/'), Some('*'), _, _) => {
                    self.docs.clear();
                    self.reader.read_block_comment();
                }
                _ => break,
            }
        }
    }

    pub(crate) fn take_docs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.docs)
    }

    pub(crate) fn clear_docs(&mut self) {
        self.docs.clear();
    }

    // ===== Skipping =====

    /// Skips a group whose opening token was just consumed.
    pub(crate) fn skip_balanced(&mut self, open: &str) -> Result<(), SourceError> {
        let close = match open {
            "(" => ")",
            "[" => "]",
            "<" => ">",
            _ => "}",
        };
        let mut depth = 1usize;
        while depth > 0 {
            let word = self.expect_next(&format!("'{close}'"))?;
            if word == open {
                depth += 1;
            } else if word == close {
                depth -= 1;
            }
        }
        self.clear_docs();
        Ok(())
    }

    /// Skips one declaration starting at `first`: through the `;` that ends
    /// it, or through the closing `}` of its body.
    ///
    /// Stops short of a `}` that would close an enclosing scope.
    pub(crate) fn skip_declaration(&mut self, first: &str) -> Result<(), SourceError> {
        let mut depth = 0usize;
        let mut word = first.to_string();

        loop {
            match word.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.skip_optional_semicolon();
                        break;
                    }
                }
                ";" if depth == 0 => break,
                _ => {}
            }

            self.skip_trivia();
            if depth == 0 && self.reader.peek_char(0) == Some('}') {
                break;
            }
            word = match self.next() {
                Some(word) => word,
                None if depth == 0 => break,
                None => {
                    return Err(self.error(SourceErrorKind::UnexpectedEof {
                        expected: "'}'".to_string(),
                    }))
                }
            };
        }

        self.clear_docs();
        Ok(())
    }

    pub(crate) fn skip_ignore_block(&mut self) -> Result<(), SourceError> {
        let config = self.config;
        let end = &config.markers.ignore_end;
        loop {
            let word = self.expect_next(end)?;
            if word == *end {
                break;
            }
        }
        self.clear_docs();
        Ok(())
    }

    /// `#` directive: the rest of the line is skipped.
    fn parse_directive(&mut self) -> Result<(), SourceError> {
        let location = self.location();
        let line = self.reader.read_line();
        let mut parts = line.split_whitespace();
        if parts.next() == Some("pragma") && parts.next().is_some_and(|p| p.starts_with("pack")) {
            return Err(SourceError::new(
                location,
                SourceErrorKind::Unsupported(
                    "#pragma pack (it breaks struct marshalling)".to_string(),
                ),
            ));
        }
        Ok(())
    }

    /// After `[`. Returns the deprecation described by a
    /// `[[deprecated]]` / `[[deprecated("why")]]` attribute; every other
    /// bracketed construct is skipped.
    pub(crate) fn parse_attribute(&mut self) -> Result<Option<Deprecation>, SourceError> {
        let word = self.expect_next("attribute")?;
        if word != "[" {
            if word != "]" {
                self.skip_until_bracket_depth(1)?;
            }
            return Ok(None);
        }

        let name = self.expect_next("attribute name")?;
        if name != "deprecated" {
            if name != "]" {
                self.skip_until_bracket_depth(2)?;
            } else {
                self.skip_until_bracket_depth(1)?;
            }
            return Ok(None);
        }

        let message = match self.expect_next("']]'")?.as_str() {
            "(" => {
                let literal = self.expect_next("deprecation message")?;
                if !(literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"')) {
                    return Err(self.error(SourceErrorKind::MalformedDeprecation));
                }
                if self.next().as_deref() != Some(")") {
                    return Err(self.error(SourceErrorKind::MalformedDeprecation));
                }
                if self.next().as_deref() != Some("]") {
                    return Err(self.error(SourceErrorKind::MalformedDeprecation));
                }
                Some(literal[1..literal.len() - 1].to_string())
            }
            "]" => None,
            _ => return Err(self.error(SourceErrorKind::MalformedDeprecation)),
        };
        if self.next().as_deref() != Some("]") {
            return Err(self.error(SourceErrorKind::MalformedDeprecation));
        }
        Ok(Some(Deprecation { message }))
    }

    fn skip_until_bracket_depth(&mut self, mut depth: usize) -> Result<(), SourceError> {
        while depth > 0 {
            match self.expect_next("']'")?.as_str() {
                "[" => depth += 1,
                "]" => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }
}
