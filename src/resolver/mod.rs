//! Semantic resolver
//!
//! Turns the merged per-file [`Declarations`] into a cross-referenced
//! [`MetadataGraph`] with six whole-graph passes, run once each and in order:
//!
//! 1. template instance harvesting (`templates`)
//! 2. namespace and typedef resolution (`namespaces`)
//! 3. classification and base splitting (`namespaces`)
//! 4. template parameter marking (`templates`)
//! 5. derived instance propagation (`templates`)
//! 6. safe names and unique names (`naming`)
//!
//! Every pass sees every type reference through [`walk_declarations`], which
//! visits them in table order together with the [`Site`] they were written at.
//! Running the resolver on an already resolved graph changes nothing.

pub(crate) mod naming;
mod namespaces;
mod templates;

use crate::error::{ResolveError, Warning};
use crate::metadata::{
    ClassDescriptor, Declarations, FieldDescriptor, FunctionDescriptor, MetadataGraph,
    NamespacePath, OwnerRef, SourceLocation, TypeDescriptor,
};

pub(crate) use namespaces::TypeIndex;

/// Where a type reference was written.
#[derive(Debug, Clone)]
pub(crate) struct Site {
    /// Innermost namespace names are looked up from.
    pub scope: NamespacePath,
    /// Formal parameters of the enclosing template, if any.
    pub template_params: Vec<String>,
    pub location: SourceLocation,
}

impl Site {
    fn new(scope: NamespacePath, template_params: &[String], location: &SourceLocation) -> Self {
        Self {
            scope,
            template_params: template_params.to_vec(),
            location: location.clone(),
        }
    }

    /// `ty` is one of the enclosing template's own parameters.
    pub fn is_template_param(&self, ty: &TypeDescriptor) -> bool {
        ty.namespace.is_empty() && self.template_params.iter().any(|p| *p == ty.name)
    }
}

pub(crate) type Visit<'v> = dyn FnMut(&mut TypeDescriptor, &Site) -> Result<(), ResolveError> + 'v;

/// Resolves a merged declaration set.
///
/// Returns the finished graph together with the convention warnings raised
/// while naming it.
pub fn resolve(declarations: Declarations) -> Result<(MetadataGraph, Vec<Warning>), ResolveError> {
    let _span = tracing::info_span!("resolve").entered();
    let mut declarations = declarations;
    let mut warnings = Vec::new();

    let index = TypeIndex::build(&declarations);

    run_pass("harvest templates", || templates::harvest_instances(&mut declarations, &index))?;
    run_pass("resolve namespaces", || namespaces::resolve_namespaces(&mut declarations, &index))?;
    run_pass("classify", || namespaces::classify(&mut declarations, &index))?;
    run_pass("mark template parameters", || templates::mark_template_parameters(&mut declarations))?;
    run_pass("propagate instances", || templates::propagate_instances(&mut declarations))?;
    run_pass("assign names", || naming::assign_names(&mut declarations, &mut warnings))?;

    Ok((MetadataGraph::new(declarations), warnings))
}

fn run_pass(
    name: &str,
    pass: impl FnOnce() -> Result<(), ResolveError>,
) -> Result<(), ResolveError> {
    let _span = tracing::debug_span!("pass", name).entered();
    tracing::debug!("begin");
    pass()?;
    tracing::debug!("end");
    Ok(())
}

/// Visits `ty` and then, recursively, its template arguments and the
/// return and parameter types of its function signature.
pub(crate) fn walk_type(
    ty: &mut TypeDescriptor,
    site: &Site,
    visit: &mut Visit<'_>,
) -> Result<(), ResolveError> {
    visit(ty, site)?;
    for arg in &mut ty.template_arguments {
        walk_type(&mut arg.ty, site, visit)?;
    }
    if let Some(signature) = ty.signature.as_deref_mut() {
        if let Some(ret) = signature.return_type.as_mut() {
            walk_type(ret, site, visit)?;
        }
        for param in &mut signature.parameters {
            walk_type(&mut param.ty, site, visit)?;
        }
    }
    Ok(())
}

fn walk_function(
    function: &mut FunctionDescriptor,
    template_params: &[String],
    visit: &mut Visit<'_>,
) -> Result<(), ResolveError> {
    let scope = function
        .owner
        .as_ref()
        .map(OwnerRef::scope)
        .unwrap_or_else(|| function.namespace.clone());
    let site = Site::new(scope, template_params, &function.location);
    if let Some(ret) = function.return_type.as_mut() {
        walk_type(ret, &site, visit)?;
    }
    for param in &mut function.parameters {
        walk_type(&mut param.ty, &site, visit)?;
    }
    Ok(())
}

fn walk_fields(
    fields: &mut [FieldDescriptor],
    template_params: &[String],
    visit: &mut Visit<'_>,
) -> Result<(), ResolveError> {
    for field in fields {
        let site = Site::new(field.owner.scope(), template_params, &field.location);
        walk_type(&mut field.ty, &site, visit)?;
    }
    Ok(())
}

fn walk_class(
    class: &mut ClassDescriptor,
    template_params: &[String],
    visit: &mut Visit<'_>,
) -> Result<(), ResolveError> {
    // Bases are written outside the body.
    let outer = Site::new(class.namespace.clone(), template_params, &class.location);
    for base in &mut class.inherits {
        walk_type(base, &outer, visit)?;
    }
    if let Some(base) = class.base.as_mut() {
        walk_type(base, &outer, visit)?;
    }
    for interface in &mut class.interfaces {
        walk_type(&mut interface.ty, &outer, visit)?;
    }
    for method in &mut class.methods {
        walk_function(method, template_params, visit)?;
    }
    walk_fields(&mut class.fields, template_params, visit)
}

/// Visits every type reference in the declaration set, in table order.
pub(crate) fn walk_declarations(
    declarations: &mut Declarations,
    visit: &mut Visit<'_>,
) -> Result<(), ResolveError> {
    for typedef in declarations.typedefs.values_mut() {
        let site = Site::new(typedef.namespace.clone(), &[], &typedef.location);
        walk_type(&mut typedef.ty, &site, visit)?;
    }

    for function in declarations.functions.values_mut() {
        walk_function(function, &[], visit)?;
    }

    for strukt in declarations.structs.values_mut() {
        if let Some(base) = strukt.base.as_mut() {
            let site = Site::new(strukt.namespace.clone(), &[], &strukt.location);
            walk_type(base, &site, visit)?;
        }
        walk_fields(&mut strukt.fields, &[], visit)?;
    }

    for class in declarations.classes.values_mut() {
        walk_class(class, &[], visit)?;
    }

    for interface in declarations.interfaces.values_mut() {
        let outer = Site::new(interface.namespace.clone(), &[], &interface.location);
        for base in &mut interface.inherits {
            walk_type(base, &outer, visit)?;
        }
        for base in &mut interface.interfaces {
            walk_type(&mut base.ty, &outer, visit)?;
        }
        for method in &mut interface.methods {
            walk_function(method, &[], visit)?;
        }
    }

    for template in declarations.templates.values_mut() {
        let params = template.parameter_names();
        walk_class(&mut template.definition, &params, visit)?;
    }

    for template in declarations.templates.values_mut() {
        let location = template.definition.location.clone();
        for instance in &mut template.instances {
            let site = Site::new(instance.parent_namespace.clone(), &[], &location);
            for arg in &mut instance.arguments {
                walk_type(&mut arg.ty, &site, visit)?;
            }
        }
    }

    Ok(())
}
