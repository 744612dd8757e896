//! Declaration descriptors
//!
//! One struct per kind of declaration the parser produces. Descriptors are
//! created once by the parser and only annotated in place by the resolver.

use super::types::{
    FunctionSignature, NamespacePath, ParameterDescriptor, TemplateArgument, TypeDescriptor,
};
use serde::Serialize;
use std::fmt;

/// Where a declaration starts, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Struct,
    Class,
    Interface,
    Template,
}

/// Identity of the type a member belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRef {
    pub namespace: NamespacePath,
    pub name: String,
    pub kind: OwnerKind,
}

impl OwnerRef {
    pub fn key(&self) -> String {
        self.namespace.qualify(&self.name)
    }

    /// Namespace used to look up names written inside the owner's body.
    pub fn scope(&self) -> NamespacePath {
        self.namespace.child(&self.name)
    }
}

/// Overloadable operators and their generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Xor,
    And,
    Or,
    Comp,
    Not,
    Assign,
    Lt,
    Gt,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    XorAssign,
    AndAssign,
    OrAssign,
    Lsh,
    Rsh,
    LshAssign,
    RshAssign,
    Equ,
    NEqu,
    Lte,
    Gte,
    Inc,
    Dec,
    Member,
    Call,
    Index,
    /// `operator T()`
    Conversion,
}

impl OperatorKind {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use OperatorKind::*;
        let kind = match symbol {
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Mod,
            "^" => Xor,
            "&" => And,
            "|" => Or,
            "~" => Comp,
            "!" => Not,
            "=" => Assign,
            "<" => Lt,
            ">" => Gt,
            "+=" => AddAssign,
            "-=" => SubAssign,
            "*=" => MulAssign,
            "/=" => DivAssign,
            "%=" => ModAssign,
            "^=" => XorAssign,
            "&=" => AndAssign,
            "|=" => OrAssign,
            "<<" => Lsh,
            ">>" => Rsh,
            "<<=" => LshAssign,
            ">>=" => RshAssign,
            "==" => Equ,
            "!=" => NEqu,
            "<=" => Lte,
            ">=" => Gte,
            "++" => Inc,
            "--" => Dec,
            "->" => Member,
            "()" => Call,
            "[]" => Index,
            _ => return None,
        };
        Some(kind)
    }

    pub fn identifier(self) -> &'static str {
        use OperatorKind::*;
        match self {
            Add => "op_Add",
            Sub => "op_Sub",
            Mul => "op_Mul",
            Div => "op_Div",
            Mod => "op_Mod",
            Xor => "op_Xor",
            And => "op_And",
            Or => "op_Or",
            Comp => "op_Comp",
            Not => "op_Not",
            Assign => "op_Assign",
            Lt => "op_LT",
            Gt => "op_GT",
            AddAssign => "op_AddAssign",
            SubAssign => "op_SubAssign",
            MulAssign => "op_MulAssign",
            DivAssign => "op_DivAssign",
            ModAssign => "op_ModAssign",
            XorAssign => "op_XorAssign",
            AndAssign => "op_AndAssign",
            OrAssign => "op_OrAssign",
            Lsh => "op_LSH",
            Rsh => "op_RSH",
            LshAssign => "op_LSHAssign",
            RshAssign => "op_RSHAssign",
            Equ => "op_Equ",
            NEqu => "op_NEqu",
            Lte => "op_LTE",
            Gte => "op_GTE",
            Inc => "op_Inc",
            Dec => "op_Dec",
            Member => "op_Member",
            Call => "op_Call",
            Index => "op_Index",
            Conversion => "Conv",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionDescriptor {
    pub location: SourceLocation,
    pub end_line: usize,
    pub namespace: NamespacePath,
    pub name: String,
    pub return_type: Option<TypeDescriptor>,
    pub parameters: Vec<ParameterDescriptor>,
    pub owner: Option<OwnerRef>,
    pub unique_name: String,
    pub operator: Option<OperatorKind>,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure: bool,
    pub is_override: bool,
    pub is_const: bool,
    pub is_constructor: bool,
    pub is_destructor: bool,
    pub is_async_result: bool,
    pub is_async_result_with_progress: bool,
    pub is_event: bool,
    pub is_explicit_converter: bool,
    pub is_interface_implementation: bool,
    pub is_private: bool,
    /// Constructor or destructor the parser added because none was declared.
    pub is_synthesized: bool,
    pub deprecation: Option<Deprecation>,
    pub docs: Vec<String>,
}

impl FunctionDescriptor {
    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }

    pub fn is_operator_overload(&self) -> bool {
        self.operator.is_some()
    }

    pub fn has_return(&self) -> bool {
        self.return_type.is_some()
    }

    /// Same name and same written parameter types.
    pub fn same_signature(&self, other: &FunctionDescriptor) -> bool {
        self.name == other.name
            && self.is_const == other.is_const
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.ty == b.ty && a.modifier == b.modifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub location: SourceLocation,
    pub owner: OwnerRef,
    pub namespace: NamespacePath,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub is_static: bool,
    pub unique_getter_name: String,
    pub unique_setter_name: String,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumField {
    pub name: String,
    /// Raw initializer text, never evaluated.
    pub value: Option<String>,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDescriptor {
    pub location: SourceLocation,
    pub end_line: usize,
    pub namespace: NamespacePath,
    pub name: String,
    pub full_safe_type_name: String,
    pub base: Option<String>,
    pub fields: Vec<EnumField>,
    pub is_flags: bool,
    pub is_nested_type: bool,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDescriptor {
    pub location: SourceLocation,
    pub end_line: usize,
    pub namespace: NamespacePath,
    pub name: String,
    pub full_safe_type_name: String,
    pub base: Option<TypeDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub is_nested_type: bool,
    pub has_nested_types: bool,
    pub docs: Vec<String>,
}

/// An interface implemented by a class, or inherited by another interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceRef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDescriptor {
    pub location: SourceLocation,
    pub end_line: usize,
    pub namespace: NamespacePath,
    pub name: String,
    pub full_safe_type_name: String,
    /// Inheritance list as written; split into `base` and `interfaces` once
    /// the bases are classified.
    pub inherits: Vec<TypeDescriptor>,
    pub base: Option<TypeDescriptor>,
    pub interfaces: Vec<InterfaceRef>,
    pub has_interfaces: bool,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<FunctionDescriptor>,
    pub should_dispose: bool,
    pub is_pure_virtual: bool,
    pub is_static: bool,
    pub is_nested_type: bool,
    pub has_nested_types: bool,
    pub docs: Vec<String>,
}

impl ClassDescriptor {
    pub fn has_base_type(&self) -> bool {
        self.base.is_some()
    }

    pub fn key(&self) -> String {
        self.namespace.qualify(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDescriptor {
    pub location: SourceLocation,
    pub end_line: usize,
    pub namespace: NamespacePath,
    pub name: String,
    pub full_safe_type_name: String,
    pub inherits: Vec<TypeDescriptor>,
    pub interfaces: Vec<InterfaceRef>,
    pub has_interfaces: bool,
    pub methods: Vec<FunctionDescriptor>,
    pub is_nested_type: bool,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParameter {
    pub name: String,
    pub is_last: bool,
}

/// One concrete argument binding of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInstance {
    /// Namespace of the reference the binding was harvested from.
    pub parent_namespace: NamespacePath,
    pub arguments: Vec<TemplateArgument>,
    pub full_safe_type_name: Option<String>,
    #[serde(skip)]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateDescriptor {
    pub definition: ClassDescriptor,
    pub parameters: Vec<TemplateParameter>,
    pub instances: Vec<TemplateInstance>,
}

impl TemplateDescriptor {
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedefDescriptor {
    pub location: SourceLocation,
    pub namespace: NamespacePath,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub docs: Vec<String>,
}

impl TypedefDescriptor {
    pub fn key(&self) -> String {
        self.namespace.qualify(&self.name)
    }
}

/// Inline signature attached to a typedef'd callback type.
pub fn signature_with_docs(signature: &FunctionSignature, docs: &[String]) -> FunctionSignature {
    let mut signature = signature.clone();
    if !docs.is_empty() {
        signature.docs = docs.to_vec();
    }
    signature
}
