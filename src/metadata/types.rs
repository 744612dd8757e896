//! Type references
//!
//! A [`TypeDescriptor`] is one written occurrence of a type: a return type, a
//! parameter, a field, a base class, a typedef target or a template argument.
//! The parser fills in what the text says; the resolver later annotates the
//! same value in place with its namespace, classification and safe names.

use serde::ser::{Serialize, Serializer};
use std::fmt;

/// Ordered namespace segments. The empty path is the global namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamespacePath {
    segments: Vec<String>,
}

impl NamespacePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `a::b::c` into segments. Empty segments are dropped.
    pub fn parse(text: &str) -> Self {
        Self {
            segments: text
                .split("::")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// The enclosing namespace, or `None` at global scope.
    pub fn parent(&self) -> Option<NamespacePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn join(&self, other: &NamespacePath) -> NamespacePath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn child(&self, segment: &str) -> NamespacePath {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Segments joined with `_`, as used in generated identifiers.
    pub fn underscored(&self) -> String {
        self.segments.join("_")
    }

    /// `namespace::name`, or just `name` in the global namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.segments.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.segments.join("::"), name)
        }
    }

    /// `namespace_rest`, or just `rest` in the global namespace.
    pub fn prefix_underscored(&self, rest: &str) -> String {
        if self.segments.is_empty() {
            rest.to_string()
        } else {
            format!("{}_{}", self.underscored(), rest)
        }
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("::"))
    }
}

impl Serialize for NamespacePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    #[default]
    None,
    Pointer,
    PointerPointer,
    Reference,
}

impl PointerKind {
    pub fn is_pointer_or_reference(self) -> bool {
        self != PointerKind::None
    }

    /// Indirection of `outer` applied to a type that already carries `self`,
    /// as when a typedef'd pointer is used by pointer or by reference.
    ///
    /// A reference to a pointer is passed like a pointer to a pointer.
    /// References collapse, and nothing deeper than two levels is
    /// representable, so the extra levels are dropped.
    pub fn compose(self, outer: PointerKind) -> PointerKind {
        use PointerKind::*;
        match (self, outer) {
            (None, outer) => outer,
            (inner, None) => inner,
            (Pointer, _) => PointerPointer,
            (Reference, outer) => outer,
            (PointerPointer, _) => PointerPointer,
        }
    }
}

/// Resolved category of a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeClass {
    Primitive,
    String,
    Enum,
    Struct,
    Class,
    Interface,
    Template,
    FunctionSignature,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TypeDescriptor {
    pub namespace: NamespacePath,
    pub name: String,
    pub pointer: PointerKind,
    pub is_const: bool,
    pub is_optional: bool,
    pub is_string: bool,
    pub is_inline_forward: bool,
    /// Set once the namespace lookup found a declaration for this name.
    pub is_resolved: bool,
    /// Names one of the enclosing template's own formal parameters.
    pub is_template_argument: bool,
    /// `None` until classified, and for template parameters.
    pub class: Option<TypeClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Box<FunctionSignature>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub template_arguments: Vec<TemplateArgument>,
    /// Safe identifier of the template definition this reference instantiates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_safe_type_name: Option<String>,
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> String {
        self.namespace.qualify(&self.name)
    }

    pub fn is_template(&self) -> bool {
        !self.template_arguments.is_empty()
    }

    pub fn is_primitive(&self) -> bool {
        self.class == Some(TypeClass::Primitive)
    }

    pub fn is_class_or_interface(&self) -> bool {
        matches!(
            self.class,
            Some(TypeClass::Class | TypeClass::Interface | TypeClass::Template)
        )
    }

    /// Depth of template nesting: `int` is 0, `List<int>` is 1.
    pub fn template_depth(&self) -> usize {
        self.template_arguments
            .iter()
            .map(|a| a.ty.template_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// True when this reference or anything nested in its template arguments
    /// is still an unbound template parameter.
    pub fn mentions_template_argument(&self, params: &[String]) -> bool {
        let is_param = self.is_template_argument
            || (self.namespace.is_empty() && params.iter().any(|p| *p == self.name));
        is_param
            || self
                .template_arguments
                .iter()
                .any(|a| a.ty.mentions_template_argument(params))
    }

    /// Normalized structural key used to deduplicate template instances.
    pub fn structural_signature(&self) -> String {
        let mut out = self.key();
        if !self.template_arguments.is_empty() {
            out.push('<');
            for (i, arg) in self.template_arguments.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&arg.ty.structural_signature());
            }
            out.push('>');
        }
        out
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        if self.is_optional {
            write!(f, "Optional<")?;
        }
        write!(f, "{}", self.key())?;
        if !self.template_arguments.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.template_arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg.ty)?;
            }
            write!(f, ">")?;
        }
        if let Some(signature) = self.signature.as_deref() {
            write!(f, "<{signature}>")?;
        }
        if self.is_optional {
            write!(f, ">")?;
        }
        match self.pointer {
            PointerKind::None => Ok(()),
            PointerKind::Pointer => write!(f, "*"),
            PointerKind::PointerPointer => write!(f, "**"),
            PointerKind::Reference => write!(f, "&"),
        }
    }
}

/// Parameter list and return type carried by a `function<R(Args...)>` type.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FunctionSignature {
    pub return_type: Option<TypeDescriptor>,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

/// `R(T a, U b)`, as written inside `function<...>`.
impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.return_type {
            Some(ret) => write!(f, "{ret}(")?,
            None => write!(f, "void(")?,
        }
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", param.ty, param.name)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TemplateArgument {
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub is_last: bool,
    pub parameter_name: Option<String>,
    pub safe_type_name: Option<String>,
    pub full_safe_type_name: Option<String>,
}

impl TemplateArgument {
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            is_last: false,
            parameter_name: None,
            safe_type_name: None,
            full_safe_type_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterModifier {
    #[default]
    None,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub modifier: ParameterModifier,
    pub is_last: bool,
}

/// Marks the final element of a list, clearing the flag on the others.
pub(crate) fn mark_last<T>(items: &mut [T], mut set: impl FnMut(&mut T, bool)) {
    let count = items.len();
    for (i, item) in items.iter_mut().enumerate() {
        set(item, i + 1 == count);
    }
}
