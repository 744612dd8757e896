//! Declaration parsing
//!
//! Parses namespaces, enums, typedefs, `using` aliases, template headers and
//! the head of struct/class declarations (name, export marker, base list).
//! Record bodies are handled in `classes`.

use crate::error::{SourceError, SourceErrorKind};
use crate::metadata::{
    mark_last, EnumDescriptor, EnumField, SourceLocation, TemplateDescriptor, TemplateParameter,
    TypeDescriptor, TypedefDescriptor,
};
use crate::parser::classes::Access;
use crate::parser::parse::{ParseContext, Parser};

/// Everything in front of a struct/class body.
pub(crate) struct RecordHeader {
    pub location: SourceLocation,
    pub name: String,
    pub inherits: Vec<TypeDescriptor>,
    pub should_dispose: bool,
}

impl Parser<'_> {
    /// After `namespace`. Opens a scope for `namespace a::b {`; anonymous
    /// namespaces and namespace aliases are skipped.
    pub(crate) fn parse_namespace(&mut self, ctx: &mut ParseContext) -> Result<(), SourceError> {
        let first = self.expect_next("namespace name")?;
        if first == "{" {
            tracing::debug!("skipping anonymous namespace");
            return self.skip_balanced("{");
        }

        let mut segments = vec![first];
        let mut word = self.expect_next("'{' after namespace name")?;
        while word == ":" {
            self.expect(":", "'::' in namespace name")?;
            segments.push(self.expect_next("namespace name")?);
            word = self.expect_next("'{' after namespace name")?;
        }

        match word.as_str() {
            "{" => {
                ctx.open_scope(segments);
                tracing::debug!(namespace = %ctx.namespace, "entering namespace");
                Ok(())
            }
            "=" => self.skip_declaration("="),
            _ => Err(self.unexpected("'{' after namespace name", &word)),
        }
    }

    /// After `enum`. `None` for forward declarations and anonymous enums.
    pub(crate) fn parse_enum(
        &mut self,
        ctx: &mut ParseContext,
        nested: bool,
    ) -> Result<Option<EnumDescriptor>, SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let location = self.location();

        let mut word = self.expect_next("enum name")?;
        if word == "class" || word == "struct" {
            word = self.expect_next("enum name")?;
        }
        let mut is_flags = false;
        loop {
            if word == markers.enum_flags {
                is_flags = true;
            } else if !markers.is_export(&word) {
                break;
            }
            word = self.expect_next("enum name")?;
        }

        if word == "{" {
            tracing::debug!("skipping anonymous enum");
            self.skip_balanced("{")?;
            self.skip_optional_semicolon();
            return Ok(None);
        }

        let name = word;
        let mut next = self.expect_next("'{' after enum name")?;
        let mut base = None;
        if next == ":" {
            let word = self.expect_next("enum base type")?;
            let (ty, after) = self.parse_type(word)?;
            base = ty.map(|t| t.key());
            next = after;
        }
        if next == ";" {
            return Ok(None);
        }
        if next != "{" {
            return Err(self.unexpected("'{' after enum name", &next));
        }

        let mut fields = Vec::new();
        loop {
            let word = self.expect_next("'}' to close enum")?;
            match word.as_str() {
                "}" => break,
                "," => continue,
                "[" => {
                    self.parse_attribute()?;
                    continue;
                }
                _ => {}
            }

            let docs = self.take_docs();
            let mut value = None;
            let mut after = self.expect_next("',' or '}' in enum")?;
            if after == "[" {
                self.parse_attribute()?;
                after = self.expect_next("',' or '}' in enum")?;
            }
            if after == "=" {
                value = Some(self.reader.take_balanced_until(&[',', '}']));
                after = self.expect_next("',' or '}' in enum")?;
            }
            fields.push(EnumField {
                name: word,
                value,
                docs,
            });

            match after.as_str() {
                "}" => break,
                "," => {}
                _ => return Err(self.unexpected("',' or '}' in enum", &after)),
            }
        }
        self.clear_docs();
        self.skip_optional_semicolon();

        tracing::debug!(name = %ctx.namespace.qualify(&name), fields = fields.len(), "found enum");
        Ok(Some(EnumDescriptor {
            location,
            end_line: self.reader.current_line(),
            namespace: ctx.namespace.clone(),
            full_safe_type_name: ctx.namespace.prefix_underscored(&name),
            name,
            base,
            fields,
            is_flags,
            is_nested_type: nested,
            docs: Vec::new(),
        }))
    }

    /// After `typedef`. Registers the alias only when `register` is set.
    pub(crate) fn parse_typedef(
        &mut self,
        ctx: &mut ParseContext,
        register: bool,
    ) -> Result<(), SourceError> {
        let location = self.location();
        let docs = self.take_docs();

        let word = self.expect_next("typedef target type")?;
        let (ty, name) = self.parse_type(word)?;
        match name.as_str() {
            "(" => {
                return Err(SourceError::new(
                    location,
                    SourceErrorKind::Unsupported(
                        "function pointer typedefs (use the function type instead)".to_string(),
                    ),
                ))
            }
            "{" => {
                // C-style `typedef struct { ... } Name;`
                self.skip_balanced("{")?;
                let next = self.expect_next("typedef name")?;
                return self.skip_declaration(&next);
            }
            _ => {}
        }
        let Some(ty) = ty else {
            return Err(self.unexpected("typedef target type", "void"));
        };
        self.expect(";", "';' after typedef")?;

        if register {
            self.register_typedef(ctx, location, name, ty, docs)?;
        }
        Ok(())
    }

    /// After `using`. Only `using Name = Type;` aliases are registered;
    /// using-directives and using-declarations are skipped.
    pub(crate) fn parse_using(
        &mut self,
        ctx: &mut ParseContext,
        register: bool,
    ) -> Result<(), SourceError> {
        let location = self.location();
        let docs = self.take_docs();

        let name = self.expect_next("name after 'using'")?;
        if name == "namespace" {
            return self.skip_declaration(&name);
        }
        let next = self.expect_next("'=' in alias declaration")?;
        if next != "=" {
            return self.skip_declaration(&next);
        }

        let word = self.expect_next("alias target type")?;
        let (ty, end) = self.parse_type(word)?;
        let Some(ty) = ty else {
            return Err(self.unexpected("alias target type", "void"));
        };
        if end != ";" {
            return Err(self.unexpected("';' after alias declaration", &end));
        }

        if register {
            self.register_typedef(ctx, location, name, ty, docs)?;
        }
        Ok(())
    }

    fn register_typedef(
        &mut self,
        ctx: &mut ParseContext,
        location: SourceLocation,
        name: String,
        ty: TypeDescriptor,
        docs: Vec<String>,
    ) -> Result<(), SourceError> {
        tracing::debug!(name = %ctx.namespace.qualify(&name), target = %ty, "found typedef");
        ctx.declarations.add_typedef(TypedefDescriptor {
            location,
            namespace: ctx.namespace.clone(),
            name,
            ty,
            docs,
        })
    }

    /// After `template`. Exported class templates are registered; other
    /// templates are skipped unless they carry an export marker.
    pub(crate) fn parse_template(
        &mut self,
        ctx: &mut ParseContext,
        docs: Vec<String>,
    ) -> Result<(), SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let location = self.location();

        self.expect("<", "'<' after 'template'")?;
        let parameters = self.parse_template_parameters()?;

        let word = self.expect_next("declaration after template parameters")?;
        match word.as_str() {
            "class" | "struct" => {
                let access = if word == "class" {
                    Access::Private
                } else {
                    Access::Public
                };
                if let Some(mut definition) = self.parse_template_class(ctx, access)? {
                    definition.docs = docs;
                    tracing::debug!(template = %definition.key(), "found template");
                    ctx.declarations.add_template(TemplateDescriptor {
                        definition,
                        parameters,
                        instances: Vec::new(),
                    })?;
                }
                Ok(())
            }
            w if markers.is_export(w) => Err(SourceError::new(
                location,
                SourceErrorKind::Unsupported("exported templates other than classes".to_string()),
            )),
            _ => self.skip_declaration(&word),
        }
    }

    /// After `template <`: parameter names through the closing `>`.
    fn parse_template_parameters(&mut self) -> Result<Vec<TemplateParameter>, SourceError> {
        let mut parameters = Vec::new();
        let mut word = self.expect_next("template parameter")?;

        while word != ">" {
            if word == "," {
                word = self.expect_next("template parameter")?;
                continue;
            }

            // `typename T`, `class T`, `unsigned int N`: the last word names it.
            let mut words = vec![word];
            let next = loop {
                let w = self.expect_next("template parameter")?;
                if matches!(w.as_str(), "," | ">" | "=") {
                    break w;
                }
                words.push(w);
            };
            if words.len() < 2 {
                return Err(self.unexpected("template parameter name", &next));
            }
            if let Some(name) = words.pop() {
                parameters.push(TemplateParameter {
                    name,
                    is_last: false,
                });
            }

            word = if next == "=" {
                self.skip_template_default()?
            } else {
                next
            };
        }

        mark_last(&mut parameters, |p, last| p.is_last = last);
        Ok(parameters)
    }

    /// Skips a default template argument, returning the `,` or `>` after it.
    fn skip_template_default(&mut self) -> Result<String, SourceError> {
        let mut depth = 0usize;
        loop {
            let word = self.expect_next("'>' to close template parameters")?;
            match word.as_str() {
                "<" => depth += 1,
                ">" if depth == 0 => return Ok(word),
                ">" => depth -= 1,
                "," if depth == 0 => return Ok(word),
                "(" | "[" | "{" => self.skip_balanced(&word)?,
                _ => {}
            }
        }
    }

    /// Name, markers and base list of a struct or class.
    ///
    /// `None` when the declaration is skipped: a forward declaration, an
    /// anonymous type, or a type without the export marker where one is
    /// required.
    pub(crate) fn parse_record_header(
        &mut self,
        require_export: bool,
    ) -> Result<Option<RecordHeader>, SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let location = self.location();

        let mut word = self.expect_next("type name")?;
        if word == "[" {
            self.parse_attribute()?;
            word = self.expect_next("type name")?;
        }

        if markers.is_export(&word) {
            word = self.expect_next("type name")?;
        } else if require_export {
            tracing::trace!(name = %word, "skipping unexported type");
            self.skip_declaration(&word)?;
            return Ok(None);
        }

        let mut should_dispose = true;
        if word == markers.no_dispose {
            should_dispose = false;
            word = self.expect_next("type name")?;
        }

        if word == "{" {
            self.skip_declaration(&word)?;
            return Ok(None);
        }

        let name = word;
        let mut next = self.expect_next("'{' after type name")?;
        if next == "final" {
            next = self.expect_next("'{' after type name")?;
        }
        if next == ";" {
            return Ok(None);
        }

        let mut inherits = Vec::new();
        if next == ":" {
            loop {
                let mut base = self.expect_next("base type")?;
                while matches!(base.as_str(), "public" | "protected" | "private" | "virtual") {
                    base = self.expect_next("base type")?;
                }
                let (ty, after) = self.parse_type(base)?;
                inherits.extend(ty);
                next = after;
                if next != "," {
                    break;
                }
            }
        }

        if next != "{" {
            return Err(self.unexpected("'{' after type name", &next));
        }
        Ok(Some(RecordHeader {
            location,
            name,
            inherits,
            should_dispose,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::SourceErrorKind;
    use crate::parser::parse::{ParseContext, ParseOutput, Parser};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<ParseOutput, crate::error::SourceError> {
        let config = Config::default();
        let mut parser = Parser::new("test.h", source, &config);
        let mut ctx = ParseContext::new();
        parser.parse_into(&mut ctx)?;
        Ok(ctx.into_output())
    }

    #[test]
    fn test_empty_enum() {
        let output = parse("enum Foo {};").unwrap();
        let foo = output.declarations.enums.get("Foo").unwrap();
        assert!(foo.fields.is_empty());
        assert_eq!(foo.full_safe_type_name, "Foo");
    }

    #[test]
    fn test_enum_values_and_flags() {
        let output = parse(
            "namespace gfx {\nenum class WRAP_FLAGS Mode : uint8_t {\n  /// none\n  None = 0,\n  Read = 1 << 0,\n  Write = 1 << 1, ///< trailing\n  All = Read | Write\n};\n}",
        )
        .unwrap();
        let mode = output.declarations.enums.get("gfx::Mode").unwrap();
        assert!(mode.is_flags);
        assert_eq!(mode.base.as_deref(), Some("uint8_t"));
        assert_eq!(mode.full_safe_type_name, "gfx_Mode");

        let fields: Vec<_> = mode
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_deref()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("None", Some("0")),
                ("Read", Some("1 << 0")),
                ("Write", Some("1 << 1")),
                ("All", Some("Read | Write")),
            ]
        );
        assert_eq!(mode.fields[0].docs, vec!["none"]);
        assert!(mode.fields[3].docs.is_empty());
    }

    #[test]
    fn test_nested_namespace_syntax() {
        let output = parse("namespace eggs::and {\nnamespace bacon {\nenum E { A };\n}\n}").unwrap();
        assert!(output.declarations.enums.contains_key("eggs::and::bacon::E"));
    }

    #[test]
    fn test_anonymous_namespace_is_skipped() {
        let output = parse("namespace {\nenum Hidden { A };\n}\nenum Shown { B };").unwrap();
        assert!(!output.declarations.enums.contains_key("Hidden"));
        assert!(output.declarations.enums.contains_key("Shown"));
    }

    #[test]
    fn test_typedef_and_alias_are_registered() {
        let output = parse(
            "namespace app {\n/// Identifier\ntypedef unsigned int Id;\nusing Names = List<String>;\nusing namespace std;\n}",
        )
        .unwrap();
        let id = output.declarations.typedefs.get("app::Id").unwrap();
        assert_eq!(id.ty.name, "unsigned int");
        assert_eq!(id.docs, vec!["Identifier"]);
        let names = output.declarations.typedefs.get("app::Names").unwrap();
        assert_eq!(names.ty.name, "List");
        assert_eq!(output.declarations.typedefs.len(), 2);
    }

    #[test]
    fn test_function_pointer_typedef_is_unsupported() {
        let err = parse("typedef void (*Callback)(int);").unwrap_err();
        assert!(matches!(err.kind, SourceErrorKind::Unsupported(_)));
    }

    #[test]
    fn test_conflicting_typedef_is_a_duplicate() {
        assert!(parse("typedef int A;\ntypedef int A;").is_ok());
        let err = parse("typedef int A;\ntypedef float A;").unwrap_err();
        assert!(matches!(err.kind, SourceErrorKind::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_template_class_parameters() {
        let output = parse(
            "template <typename K, typename V = Default<K>>\nclass WRAP_API Map {\npublic:\n  V Get(const K& key) const;\n};",
        )
        .unwrap();
        let map = output.declarations.templates.get("Map").unwrap();
        assert_eq!(map.parameter_names(), vec!["K", "V"]);
        assert!(map.parameters[1].is_last);
        assert!(map.definition.methods.iter().any(|m| m.name == "Get"));
    }

    #[test]
    fn test_unexported_function_template_is_skipped() {
        let output = parse("template <typename T> T Max(T a, T b) { return a > b ? a : b; }\nenum E { A };").unwrap();
        assert!(output.declarations.templates.is_empty());
        assert!(output.declarations.enums.contains_key("E"));
    }

    #[test]
    fn test_forward_declarations_are_ignored() {
        let output = parse("class WRAP_API Widget;\nstruct Point;\nenum class Mode : int;").unwrap();
        assert!(output.declarations.classes.is_empty());
        assert!(output.declarations.structs.is_empty());
        assert!(output.declarations.enums.is_empty());
    }
}
