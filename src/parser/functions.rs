//! Function declaration parsing
//!
//! Covers free functions, methods, constructors, destructors, operator
//! overloads and conversion operators, including their parameter lists and
//! everything that may follow the closing parenthesis.

use crate::error::{SourceError, SourceErrorKind};
use crate::metadata::{
    mark_last, FunctionDescriptor, OperatorKind, OwnerRef, ParameterDescriptor,
    ParameterModifier, PointerKind,
};
use crate::parser::parse::{ParseContext, Parser};
use crate::parser::reader::is_identifier_char;

fn is_event_name(name: &str) -> bool {
    name.len() > "SetCallback".len() && name.starts_with("Set") && name.ends_with("Callback")
}

impl Parser<'_> {
    /// Parses one function declaration starting at `word`, through its `;` or
    /// body. The caller fills in docs, deprecation and the unique name.
    pub(crate) fn parse_function(
        &mut self,
        ctx: &mut ParseContext,
        word: String,
        owner: Option<&OwnerRef>,
    ) -> Result<FunctionDescriptor, SourceError> {
        let config = self.config;
        let markers = &config.markers;

        let mut function = FunctionDescriptor {
            location: self.location(),
            namespace: ctx.namespace.clone(),
            owner: owner.cloned(),
            ..FunctionDescriptor::default()
        };

        let mut word = word;
        loop {
            match word.as_str() {
                w if w == markers.async_result => function.is_async_result = true,
                w if w == markers.async_result_with_progress => {
                    function.is_async_result_with_progress = true
                }
                w if w == markers.event => function.is_event = true,
                w if markers.is_export(w) => {}
                "virtual" => function.is_virtual = true,
                "static" => function.is_static = true,
                "inline" | "constexpr" | "explicit" | "extern" => {}
                _ => break,
            }
            word = self.expect_next("function declaration")?;
        }

        if word == "~" {
            let name = self.expect_next("destructor name")?;
            function.name = format!("~{name}");
            function.is_destructor = true;
            self.expect("(", "'(' after destructor name")?;
        } else if word == "operator" {
            let target = self.expect_next("conversion target type")?;
            let (ty, open) = self.parse_type(target)?;
            let Some(ty) = ty else {
                return Err(self.unexpected("conversion target type", "void"));
            };
            if open != "(" {
                return Err(self.unexpected("'(' after conversion operator", &open));
            }
            function.name = format!("operator {}", ty.name);
            function.operator = Some(OperatorKind::Conversion);
            function.return_type = Some(ty);
        } else {
            let (return_type, name) = self.parse_type(word)?;
            if name == "(" {
                let Some(ty) = return_type else {
                    return Err(self.unexpected("function name", "("));
                };
                function.name = ty.name;
                function.is_constructor = true;
            } else {
                function.return_type = return_type;
                match name
                    .strip_prefix("operator")
                    .filter(|rest| !rest.starts_with(is_identifier_char))
                {
                    Some(rest) => {
                        let rest = rest.to_string();
                        self.parse_operator(&mut function, rest)?;
                    }
                    None => {
                        if !name.starts_with(is_identifier_char) {
                            return Err(self.unexpected("function name", &name));
                        }
                        function.name = name;
                        self.expect("(", "'(' after function name")?;
                    }
                }
            }
        }

        self.parse_parameters(&mut function)?;
        self.parse_function_tail(&mut function)?;
        function.end_line = self.reader.current_line();

        if function.is_event && !is_event_name(&function.name) {
            ctx.warn(
                function.location.clone(),
                format!(
                    "event '{}' should follow the naming pattern 'SetXCallback'",
                    function.name
                ),
            );
        }
        Ok(function)
    }

    /// Operator symbol after `operator`, through the `(` that opens the
    /// parameter list.
    fn parse_operator(
        &mut self,
        function: &mut FunctionDescriptor,
        mut symbol: String,
    ) -> Result<(), SourceError> {
        if symbol.is_empty() && self.reader.peek_char(0) == Some('(') {
            self.expect("(", "'(' after operator")?;
            self.expect(")", "')' in 'operator()'")?;
            symbol.push_str("()");
        }
        loop {
            self.skip_trivia();
            match self.reader.peek_char(0) {
                Some('(') => break,
                Some(_) => symbol.push_str(&self.expect_next("operator symbol")?),
                None => {
                    return Err(self.error(SourceErrorKind::UnexpectedEof {
                        expected: "operator symbol".to_string(),
                    }))
                }
            }
        }

        let Some(kind) = OperatorKind::from_symbol(&symbol) else {
            return Err(self.error(SourceErrorKind::UnsupportedOperator { symbol }));
        };
        if kind == OperatorKind::Index
            && function.return_type.as_ref().map(|t| t.pointer) != Some(PointerKind::Reference)
        {
            let owner = function
                .owner
                .as_ref()
                .map(|o| o.name.clone())
                .unwrap_or_default();
            return Err(self.error(SourceErrorKind::SubscriptWithoutReference { owner }));
        }

        function.name = format!("operator{symbol}");
        function.operator = Some(kind);
        self.expect("(", "'(' after operator")
    }

    /// After `(`: parameters through `)`. Unnamed parameters become `argN`
    /// and default values are skipped.
    fn parse_parameters(&mut self, function: &mut FunctionDescriptor) -> Result<(), SourceError> {
        let config = self.config;
        let markers = &config.markers;
        let mut parameters: Vec<ParameterDescriptor> = Vec::new();

        let mut word = self.expect_next("')' to close parameter list")?;
        loop {
            match word.as_str() {
                ")" => break,
                "," => {
                    word = self.expect_next("parameter")?;
                    continue;
                }
                _ => {}
            }

            let mut modifier = ParameterModifier::None;
            if word == markers.out {
                modifier = ParameterModifier::Out;
                word = self.expect_next("parameter type")?;
            } else if word == markers.in_out {
                modifier = ParameterModifier::InOut;
                word = self.expect_next("parameter type")?;
            }

            let (ty, mut next) = self.parse_type(word)?;
            let Some(ty) = ty else {
                if next == ")" && parameters.is_empty() && modifier == ParameterModifier::None {
                    word = next;
                    continue;
                }
                return Err(self.unexpected("parameter type", "void"));
            };

            let name = if matches!(next.as_str(), "," | ")" | "=" | "[") {
                format!("arg{}", parameters.len() + 1)
            } else {
                let name = next;
                next = self.expect_next("',' or ')' in parameter list")?;
                name
            };
            while next == "[" {
                self.skip_balanced("[")?;
                next = self.expect_next("',' or ')' in parameter list")?;
            }
            if next == "=" {
                self.reader.take_balanced_until(&[',', ')']);
                next = self.expect_next("',' or ')' in parameter list")?;
            }
            if next != "," && next != ")" {
                return Err(self.unexpected("',' or ')' in parameter list", &next));
            }

            parameters.push(ParameterDescriptor {
                name,
                ty,
                modifier,
                is_last: false,
            });
            word = next;
        }

        mark_last(&mut parameters, |p, last| p.is_last = last);
        function.parameters = parameters;
        Ok(())
    }

    /// Qualifiers, `= 0` / `= delete` / `= default`, an initializer list,
    /// and the terminating `;` or body.
    fn parse_function_tail(&mut self, function: &mut FunctionDescriptor) -> Result<(), SourceError> {
        let mut word = self.expect_next("';' or function body")?;
        loop {
            match word.as_str() {
                "const" => function.is_const = true,
                "override" => function.is_override = true,
                "final" | "&" | "volatile" => {}
                "noexcept" | "throw" => {
                    self.skip_trivia();
                    if self.reader.peek_char(0) == Some('(') {
                        self.expect("(", "'('")?;
                        self.skip_balanced("(")?;
                    }
                }
                "-" => {
                    // trailing return type
                    self.expect(">", "'->'")?;
                    let target = self.expect_next("trailing return type")?;
                    let (ty, next) = self.parse_type(target)?;
                    function.return_type = ty;
                    word = next;
                    continue;
                }
                _ => break,
            }
            word = self.expect_next("';' or function body")?;
        }

        if word == "=" {
            let value = self.expect_next("'0', 'delete' or 'default'")?;
            match value.as_str() {
                "0" => function.is_pure = true,
                "delete" => function.is_private = true,
                "default" => {}
                _ => return Err(self.unexpected("'0', 'delete' or 'default'", &value)),
            }
            word = self.expect_next("';'")?;
        }

        if word == ":" {
            word = self.skip_initializer_list()?;
        }

        match word.as_str() {
            ";" => Ok(()),
            "{" => {
                self.skip_balanced("{")?;
                self.skip_optional_semicolon();
                Ok(())
            }
            _ => Err(self.unexpected("';' or function body", &word)),
        }
    }

    /// After a constructor's `:`. Returns the word that follows the list.
    fn skip_initializer_list(&mut self) -> Result<String, SourceError> {
        loop {
            let mut word = self.expect_next("member initializer")?;
            while word != "(" && word != "{" {
                word = self.expect_next("member initializer")?;
            }
            self.skip_balanced(&word)?;

            let next = self.expect_next("function body")?;
            if next != "," {
                return Ok(next);
            }
        }
    }
}
