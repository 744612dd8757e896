//! Generated identifiers
//!
//! Safe type names are what renderers paste into identifiers: `common_List`
//! for a declaration, `common_List_Int32` for an instance. Unique names are
//! the binding symbols of functions; they encode the owner, the operator or
//! lifecycle role, and every type in the signature, so overloads get distinct
//! symbols.

use super::walk_declarations;
use crate::error::{ResolveError, Warning};
use crate::metadata::{
    Declarations, FunctionDescriptor, PointerKind, TypeClass, TypeDescriptor,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Fixed-width names for the primitives renderers map to foreign types.
fn primitive_safe_name(name: &str) -> Option<&'static str> {
    let safe = match name {
        "bool" => "Bool",
        "int8_t" | "signed char" => "Int8",
        "uint8_t" | "unsigned char" => "UInt8",
        "int16_t" | "short" | "short int" | "signed short" => "Int16",
        "uint16_t" | "unsigned short" | "unsigned short int" => "UInt16",
        "int32_t" | "int" | "signed" | "signed int" | "long" | "long int" => "Int32",
        "uint32_t" | "unsigned" | "unsigned int" | "unsigned long" | "unsigned long int"
        | "size_t" => "UInt32",
        "int64_t" | "long long" | "long long int" => "Int64",
        "uint64_t" | "unsigned long long" | "unsigned long long int" => "UInt64",
        "float" => "Float",
        "double" => "Double",
        _ => return None,
    };
    Some(safe)
}

/// Identifier-safe name of `ty` without its namespace.
pub fn safe_type_name(ty: &TypeDescriptor) -> String {
    if ty.is_string {
        return "String".to_string();
    }
    match primitive_safe_name(&ty.name) {
        Some(safe) => safe.to_string(),
        None => ty.name.replace(' ', "_"),
    }
}

/// Namespace-qualified safe name, followed by the full safe names of the
/// template arguments.
pub fn full_safe_type_name(ty: &TypeDescriptor) -> String {
    let safe = safe_type_name(ty);
    let mut out = if ty.is_string {
        safe
    } else {
        ty.namespace.prefix_underscored(&safe)
    };
    for arg in &ty.template_arguments {
        out.push('_');
        out.push_str(&full_safe_type_name(&arg.ty));
    }
    out
}

fn type_token(ty: &TypeDescriptor) -> String {
    let mut token = ty.name.replace(' ', "_");
    if ty.is_template() {
        let args: Vec<_> = ty.template_arguments.iter().map(|a| type_token(&a.ty)).collect();
        token.push_str("__");
        token.push_str(&args.join("_"));
        token.push_str("__");
    }
    if ty.is_optional {
        token.push('O');
    }
    match ty.pointer {
        PointerKind::None => {}
        PointerKind::Pointer => token.push('P'),
        PointerKind::PointerPointer => token.push_str("PP"),
        PointerKind::Reference => token.push('R'),
    }
    if ty.is_const {
        token.push('C');
    }
    token
}

/// Binding symbol of a function before collision handling.
///
/// `ns_Owner_Role[C]_Return_Param...`, where constructors and destructors
/// carry no return token and a `void` return is spelled out.
pub(crate) fn function_unique_name(function: &FunctionDescriptor) -> String {
    let role = match (&function.operator, &function.owner) {
        (Some(op), _) => op.identifier().to_string(),
        (None, Some(_)) if function.is_constructor => "Ctor".to_string(),
        (None, Some(_)) if function.is_destructor => "Dtor".to_string(),
        (None, _) => function.name.clone(),
    };

    let mut name = match &function.owner {
        Some(owner) => {
            let role = if function.is_const { format!("{role}C") } else { role };
            owner
                .namespace
                .prefix_underscored(&format!("{}_{role}", owner.name))
        }
        None => function.namespace.prefix_underscored(&role),
    };

    if !function.is_constructor && !function.is_destructor {
        name.push('_');
        match &function.return_type {
            Some(ret) => name.push_str(&type_token(ret)),
            None => name.push_str("void"),
        }
    }
    for param in &function.parameters {
        name.push('_');
        name.push_str(&type_token(&param.ty));
    }
    name
}

struct TemplateNames {
    full_safe_type_name: String,
    parameters: Vec<String>,
}

fn name_reference(
    ty: &mut TypeDescriptor,
    templates: &FxHashMap<String, TemplateNames>,
    interfaces: &FxHashSet<String>,
) -> Result<(), ResolveError> {
    let key = ty.key();
    if ty.is_resolved && ty.class == Some(TypeClass::Interface) && !interfaces.contains(&key) {
        return Err(ResolveError::Internal(format!(
            "'{key}' is classified as an interface but is not declared"
        )));
    }
    if !ty.is_template() {
        return Ok(());
    }

    let definition = if ty.is_resolved { templates.get(&key) } else { None };
    if ty.is_resolved && ty.class == Some(TypeClass::Template) && definition.is_none() {
        return Err(ResolveError::Internal(format!(
            "'{key}' is classified as a template but is not declared"
        )));
    }

    ty.template_safe_type_name = definition.map(|d| d.full_safe_type_name.clone());
    for (i, arg) in ty.template_arguments.iter_mut().enumerate() {
        arg.parameter_name = definition.and_then(|d| d.parameters.get(i).cloned());
        arg.safe_type_name = Some(safe_type_name(&arg.ty));
        arg.full_safe_type_name = Some(full_safe_type_name(&arg.ty));
    }
    Ok(())
}

/// Takes the first free name among `base`, `base_2`, `base_3`, ...
fn assign_unique(function: &mut FunctionDescriptor, taken: &mut FxHashSet<String>, warnings: &mut Vec<Warning>) {
    let base = function_unique_name(function);
    let mut name = base.clone();
    let mut suffix = 2;
    while !taken.insert(name.clone()) {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    if name != base {
        warnings.push(Warning::new(
            function.location.clone(),
            format!("'{}' has the same binding symbol as another overload; renamed to '{name}'", function.name),
        ));
    }
    function.unique_name = name;
}

/// Pass 6: fills in every generated identifier and re-keys the function
/// table by final unique name.
pub(super) fn assign_names(
    declarations: &mut Declarations,
    warnings: &mut Vec<Warning>,
) -> Result<(), ResolveError> {
    let templates: FxHashMap<String, TemplateNames> = declarations
        .templates
        .iter()
        .map(|(key, t)| {
            let names = TemplateNames {
                full_safe_type_name: t.definition.full_safe_type_name.clone(),
                parameters: t.parameter_names(),
            };
            (key.to_string(), names)
        })
        .collect();
    let interfaces: FxHashSet<String> = declarations.interfaces.keys().map(str::to_string).collect();

    walk_declarations(declarations, &mut |ty, _| name_reference(ty, &templates, &interfaces))?;

    for template in declarations.templates.values_mut() {
        let params = template.parameter_names();
        for instance in &mut template.instances {
            let mut full = template.definition.full_safe_type_name.clone();
            for (i, arg) in instance.arguments.iter_mut().enumerate() {
                arg.parameter_name = params.get(i).cloned();
                arg.safe_type_name = Some(safe_type_name(&arg.ty));
                let arg_full = full_safe_type_name(&arg.ty);
                full.push('_');
                full.push_str(&arg_full);
                arg.full_safe_type_name = Some(arg_full);
            }
            instance.full_safe_type_name = Some(full);
        }
    }

    let mut taken = FxHashSet::default();
    for function in declarations.functions.values_mut() {
        assign_unique(function, &mut taken, warnings);
    }
    for class in declarations.classes.values_mut() {
        for method in &mut class.methods {
            assign_unique(method, &mut taken, warnings);
        }
    }
    for interface in declarations.interfaces.values_mut() {
        for method in &mut interface.methods {
            assign_unique(method, &mut taken, warnings);
        }
    }
    for template in declarations.templates.values_mut() {
        for method in &mut template.definition.methods {
            assign_unique(method, &mut taken, warnings);
        }
    }

    declarations
        .functions
        .rekey(|f| f.unique_name.clone())
        .map_err(|key| ResolveError::Internal(format!("unique name '{key}' was assigned twice")))
}
