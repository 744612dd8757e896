//! Type expression parsing
//!
//! Handles everything that can appear where a type is written: cv
//! qualifiers, elaborated type specifiers, multi-word primitives, qualified
//! names, template arguments, `Optional<T>`, `function<R(Args)>` signatures
//! and the pointer/reference suffix.

use crate::error::SourceError;
use crate::metadata::{
    mark_last, FunctionSignature, NamespacePath, ParameterDescriptor, ParameterModifier,
    PointerKind, TemplateArgument, TypeClass, TypeDescriptor,
};
use crate::parser::parse::Parser;

/// Words that start a multi-word builtin type.
const PRIMITIVE_LEADERS: &[&str] = &["unsigned", "signed", "short", "long"];

/// Words that may continue a multi-word builtin type.
const PRIMITIVE_CONTINUATIONS: &[&str] = &["unsigned", "signed", "short", "long", "int", "char", "double"];

const PRIMITIVE_NAMES: &[&str] = &[
    "bool",
    "char",
    "signed char",
    "unsigned char",
    "wchar_t",
    "char8_t",
    "char16_t",
    "char32_t",
    "short",
    "short int",
    "signed short",
    "signed short int",
    "unsigned short",
    "unsigned short int",
    "int",
    "signed",
    "signed int",
    "unsigned",
    "unsigned int",
    "long",
    "long int",
    "signed long",
    "signed long int",
    "unsigned long",
    "unsigned long int",
    "long long",
    "long long int",
    "unsigned long long",
    "unsigned long long int",
    "float",
    "double",
    "long double",
    "void",
    "int8_t",
    "uint8_t",
    "int16_t",
    "uint16_t",
    "int32_t",
    "uint32_t",
    "int64_t",
    "uint64_t",
    "size_t",
    "intptr_t",
    "uintptr_t",
];

/// Builtin arithmetic type, with or without a `std::` qualifier.
pub fn is_primitive(namespace: &NamespacePath, name: &str) -> bool {
    let unqualified = namespace.is_empty()
        || (namespace.len() == 1 && namespace.segments()[0] == "std");
    unqualified && PRIMITIVE_NAMES.contains(&name)
}

/// Classification that can be decided from the text alone.
fn syntactic_class(ty: &TypeDescriptor) -> Option<TypeClass> {
    if ty.signature.is_some() {
        Some(TypeClass::FunctionSignature)
    } else if ty.is_string {
        Some(TypeClass::String)
    } else if ty.is_template() {
        Some(TypeClass::Template)
    } else if is_primitive(&ty.namespace, &ty.name) {
        Some(TypeClass::Primitive)
    } else {
        None
    }
}

impl Parser<'_> {
    /// Parses a type expression starting at `word`.
    ///
    /// Returns the type, or `None` for a bare `void`, together with the first
    /// word after the expression.
    pub(crate) fn parse_type(
        &mut self,
        word: String,
    ) -> Result<(Option<TypeDescriptor>, String), SourceError> {
        let config = self.config;
        let types = &config.types;

        let mut word = word;
        let mut is_const = false;
        let mut is_inline_forward = false;
        loop {
            match word.as_str() {
                "const" => is_const = true,
                "volatile" | "typename" => {}
                "class" | "struct" | "enum" | "union" => is_inline_forward = true,
                _ => break,
            }
            word = self.expect_next("type name")?;
        }

        let mut ty;
        let mut next;
        if PRIMITIVE_LEADERS.contains(&word.as_str()) {
            let mut name = word;
            next = self.expect_next("declaration after type")?;
            while PRIMITIVE_CONTINUATIONS.contains(&next.as_str()) {
                name.push(' ');
                name.push_str(&next);
                next = self.expect_next("declaration after type")?;
            }
            ty = TypeDescriptor::named(name);
        } else {
            let (namespace, name, after) = self.parse_qualified_name(word)?;
            next = after;

            if name == types.optional_type && next == "<" {
                let inner_word = self.expect_next("type inside optional")?;
                let (inner, close) = self.parse_type(inner_word)?;
                let Some(inner) = inner else {
                    return Err(self.unexpected("type inside optional", "void"));
                };
                if close != ">" {
                    return Err(self.unexpected("'>' to close optional", &close));
                }
                ty = inner;
                ty.is_optional = true;
                next = self.expect_next("declaration after type")?;
            } else if name == types.function_type && next == "<" {
                let signature = self.parse_signature()?;
                ty = TypeDescriptor {
                    namespace,
                    name,
                    signature: Some(Box::new(signature)),
                    ..TypeDescriptor::default()
                };
                next = self.expect_next("declaration after type")?;
            } else {
                ty = TypeDescriptor {
                    namespace,
                    name,
                    ..TypeDescriptor::default()
                };
                if next == "<" {
                    ty.template_arguments = self.parse_template_arguments()?;
                    next = self.expect_next("declaration after type")?;
                }
            }
        }

        ty.is_const |= is_const;
        ty.is_inline_forward |= is_inline_forward;

        // east const
        while next == "const" || next == "volatile" {
            ty.is_const |= next == "const";
            next = self.expect_next("declaration after type")?;
        }

        match next.as_str() {
            "*" => {
                ty.pointer = PointerKind::Pointer;
                next = self.expect_next("declaration after type")?;
                if next == "*" {
                    ty.pointer = PointerKind::PointerPointer;
                    next = self.expect_next("declaration after type")?;
                }
            }
            "&" => {
                ty.pointer = PointerKind::Reference;
                next = self.expect_next("declaration after type")?;
                if next == "&" {
                    next = self.expect_next("declaration after type")?;
                }
            }
            _ => {}
        }

        // `T* const`: the pointer itself is const, which the metadata ignores.
        while next == "const" || next == "volatile" {
            next = self.expect_next("declaration after type")?;
        }

        if ty.name == "void"
            && ty.namespace.is_empty()
            && ty.pointer == PointerKind::None
            && !ty.is_optional
        {
            return Ok((None, next));
        }

        ty.is_string = ty.namespace.is_empty() && ty.name == types.string_type;
        ty.class = syntactic_class(&ty);
        Ok((Some(ty), next))
    }

    /// `a::b::Name` starting at `word`, with an optional leading `::`.
    fn parse_qualified_name(
        &mut self,
        word: String,
    ) -> Result<(NamespacePath, String, String), SourceError> {
        let mut namespace = NamespacePath::new();
        let mut name = word;
        if name == ":" {
            self.expect(":", "'::'")?;
            name = self.expect_next("type name")?;
        }

        let mut next = self.expect_next("declaration after type")?;
        while next == ":" {
            self.expect(":", "'::'")?;
            namespace.push(name);
            name = self.expect_next("name after '::'")?;
            next = self.expect_next("declaration after type")?;
        }
        Ok((namespace, name, next))
    }

    /// After `<`: comma-separated type arguments through the closing `>`.
    fn parse_template_arguments(&mut self) -> Result<Vec<TemplateArgument>, SourceError> {
        let mut arguments = Vec::new();
        let mut word = self.expect_next("template argument")?;
        loop {
            if word == ">" {
                break;
            }
            if word == "," {
                word = self.expect_next("template argument")?;
                continue;
            }
            let (arg, next) = self.parse_type(word)?;
            let Some(arg) = arg else {
                return Err(self.unexpected("template argument type", "void"));
            };
            if next != "," && next != ">" {
                return Err(self.unexpected("',' or '>' in template arguments", &next));
            }
            arguments.push(TemplateArgument::new(arg));
            word = next;
        }
        mark_last(&mut arguments, |a, last| a.is_last = last);
        Ok(arguments)
    }

    /// After `function<`: `R(Args...)>`. Unnamed parameters become `argN`.
    fn parse_signature(&mut self) -> Result<FunctionSignature, SourceError> {
        let word = self.expect_next("function return type")?;
        let (return_type, open) = self.parse_type(word)?;
        if open != "(" {
            return Err(self.unexpected("'(' in function type", &open));
        }

        let mut parameters: Vec<ParameterDescriptor> = Vec::new();
        let mut word = self.expect_next("')' in function type")?;
        loop {
            if word == ")" {
                break;
            }
            if word == "," {
                word = self.expect_next("parameter type")?;
                continue;
            }
            let (ty, next) = self.parse_type(word)?;
            let Some(ty) = ty else {
                if next == ")" && parameters.is_empty() {
                    word = next;
                    continue;
                }
                return Err(self.unexpected("parameter type", "void"));
            };
            let (name, next) = if next == "," || next == ")" {
                (format!("arg{}", parameters.len() + 1), next)
            } else {
                let after = self.expect_next("',' or ')' in function type")?;
                (next, after)
            };
            parameters.push(ParameterDescriptor {
                name,
                ty,
                modifier: ParameterModifier::None,
                is_last: false,
            });
            word = next;
        }
        mark_last(&mut parameters, |p, last| p.is_last = last);

        self.expect(">", "'>' to close function type")?;
        Ok(FunctionSignature {
            return_type,
            parameters,
            docs: Vec::new(),
        })
    }
}
