//! Template instances: harvesting concrete bindings from use sites and
//! propagating them through method return types.

use super::{walk_class, walk_declarations, TypeIndex};
use crate::error::{ResolveError, SourceError, SourceErrorKind};
use crate::metadata::{
    Declarations, NamespacePath, PointerKind, SourceLocation, TemplateArgument, TemplateInstance,
    TypeDescriptor,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Deeper derived bindings are not propagated.
const MAX_TEMPLATE_DEPTH: usize = 8;

/// Signatures of the instances already registered, per template key.
fn registered(declarations: &Declarations) -> FxHashMap<String, FxHashSet<String>> {
    declarations
        .templates
        .iter()
        .map(|(key, t)| {
            let signatures = t.instances.iter().map(|i| i.signature.clone()).collect();
            (key.to_string(), signatures)
        })
        .collect()
}

fn undeclared(location: &SourceLocation, ty: &TypeDescriptor) -> ResolveError {
    SourceError::new(
        location.clone(),
        SourceErrorKind::UndeclaredTemplate { name: ty.key() },
    )
    .into()
}

fn check_arity(
    location: &SourceLocation,
    ty: &TypeDescriptor,
    expected: usize,
) -> Result<(), ResolveError> {
    let found = ty.template_arguments.len();
    if found != expected {
        return Err(SourceError::new(
            location.clone(),
            SourceErrorKind::TemplateArity {
                name: ty.key(),
                expected,
                found,
            },
        )
        .into());
    }
    Ok(())
}

fn instance_of(ty: &TypeDescriptor, parent_namespace: NamespacePath) -> TemplateInstance {
    TemplateInstance {
        parent_namespace,
        arguments: ty.template_arguments.clone(),
        full_safe_type_name: None,
        signature: ty.structural_signature(),
    }
}

/// Pass 1: records every concrete template binding used anywhere.
///
/// Bindings that still mention a template parameter are left to
/// [`propagate_instances`].
pub(super) fn harvest_instances(
    declarations: &mut Declarations,
    index: &TypeIndex,
) -> Result<(), ResolveError> {
    let mut seen = registered(declarations);
    let mut found: Vec<(String, TemplateInstance)> = Vec::new();

    walk_declarations(declarations, &mut |ty, site| {
        if ty.mentions_template_argument(&site.template_params) {
            return Ok(());
        }
        // Resolving first also catches typedefs that alias an instance.
        let mut concrete = ty.clone();
        index.resolve_tree(&mut concrete, site);
        if !concrete.is_template() {
            return Ok(());
        }

        let mut nodes = Vec::new();
        template_nodes(&concrete, &mut nodes);
        for node in nodes {
            let key = node.key();
            let Some(arity) = index.template_arity(&key) else {
                return Err(undeclared(&site.location, &node));
            };
            check_arity(&site.location, &node, arity)?;

            let instance = instance_of(&node, site.scope.clone());
            if seen.entry(key.clone()).or_default().insert(instance.signature.clone()) {
                tracing::debug!(instance = %instance.signature, "harvested template instance");
                found.push((key, instance));
            }
        }
        Ok(())
    })?;

    for (key, instance) in found {
        let template = declarations
            .templates
            .get_mut(&key)
            .ok_or_else(|| ResolveError::Internal(format!("template '{key}' vanished while harvesting")))?;
        template.instances.push(instance);
    }
    Ok(())
}

/// Pass 4: flags references to a template's own parameters inside its
/// definition.
pub(super) fn mark_template_parameters(declarations: &mut Declarations) -> Result<(), ResolveError> {
    for template in declarations.templates.values_mut() {
        let params = template.parameter_names();
        walk_class(&mut template.definition, &params, &mut |ty, site| {
            if site.is_template_param(ty) {
                ty.is_template_argument = true;
                ty.class = None;
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Replaces every parameter reference in `ty` with its bound argument.
fn substitute(ty: &mut TypeDescriptor, params: &[String], bindings: &[TemplateArgument]) {
    if ty.is_template_argument || (ty.namespace.is_empty() && params.contains(&ty.name)) {
        if let Some(i) = params.iter().position(|p| *p == ty.name) {
            if let Some(bound) = bindings.get(i) {
                let mut replacement = bound.ty.clone();
                if ty.pointer != PointerKind::None {
                    replacement.pointer = ty.pointer;
                }
                replacement.is_const |= ty.is_const;
                replacement.is_optional |= ty.is_optional;
                *ty = replacement;
                return;
            }
        }
    }
    for arg in &mut ty.template_arguments {
        substitute(&mut arg.ty, params, bindings);
    }
}

/// `ty` and every template-shaped type nested in its arguments, outermost first.
fn template_nodes(ty: &TypeDescriptor, out: &mut Vec<TypeDescriptor>) {
    if ty.is_template() {
        out.push(ty.clone());
    }
    for arg in &ty.template_arguments {
        template_nodes(&arg.ty, out);
    }
}

/// A derived binding discovered from one method of an instantiated template.
struct Derived {
    key: String,
    instance: TemplateInstance,
    location: SourceLocation,
    ty: TypeDescriptor,
}

/// Pass 5: a method of `Box<T>` returning `List<T>` makes every
/// `Box<X>` imply `List<X>`. Runs to a fixpoint over the instance tables.
pub(super) fn propagate_instances(declarations: &mut Declarations) -> Result<(), ResolveError> {
    let mut seen = registered(declarations);
    let mut worklist: Vec<(String, usize)> = declarations
        .templates
        .iter()
        .flat_map(|(key, t)| (0..t.instances.len()).map(move |i| (key.to_string(), i)))
        .collect();

    while let Some((key, position)) = worklist.pop() {
        let template = declarations
            .templates
            .get(&key)
            .ok_or_else(|| ResolveError::Internal(format!("instance of unknown template '{key}'")))?;
        let instance = template.instances.get(position).ok_or_else(|| {
            ResolveError::Internal(format!("instance {position} of '{key}' is out of range"))
        })?;
        let params = template.parameter_names();

        let mut derived = Vec::new();
        for method in &template.definition.methods {
            let Some(ret) = method.return_type.as_ref() else {
                continue;
            };
            if !ret.is_template() || !ret.mentions_template_argument(&params) {
                continue;
            }
            let mut concrete = ret.clone();
            substitute(&mut concrete, &params, &instance.arguments);
            if concrete.mentions_template_argument(&params) {
                tracing::debug!(method = %method.name, "skipping partial binding");
                continue;
            }
            if concrete.template_depth() > MAX_TEMPLATE_DEPTH {
                tracing::debug!(method = %method.name, "skipping deep binding");
                continue;
            }
            let mut nodes = Vec::new();
            template_nodes(&concrete, &mut nodes);
            derived.extend(nodes.into_iter().map(|ty| Derived {
                key: ty.key(),
                instance: instance_of(&ty, instance.parent_namespace.clone()),
                location: method.location.clone(),
                ty,
            }));
        }

        for Derived {
            key,
            instance,
            location,
            ty,
        } in derived
        {
            let Some(target) = declarations.templates.get_mut(&key) else {
                return Err(undeclared(&location, &ty));
            };
            check_arity(&location, &ty, target.parameters.len())?;
            if seen.entry(key.clone()).or_default().insert(instance.signature.clone()) {
                tracing::debug!(instance = %instance.signature, "derived template instance");
                target.instances.push(instance);
                worklist.push((key, target.instances.len() - 1));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser::parse_source;
    use crate::resolver::namespaces::{classify, resolve_namespaces};
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> Result<Declarations, ResolveError> {
        let mut decls = parse_source("test.h", source, &Config::default())
            .unwrap()
            .declarations;
        let index = TypeIndex::build(&decls);
        harvest_instances(&mut decls, &index)?;
        resolve_namespaces(&mut decls, &index)?;
        classify(&mut decls, &index)?;
        mark_template_parameters(&mut decls)?;
        propagate_instances(&mut decls)?;
        Ok(decls)
    }

    fn signatures(decls: &Declarations, key: &str) -> Vec<String> {
        decls
            .templates
            .get(key)
            .unwrap()
            .instances
            .iter()
            .map(|i| i.signature.clone())
            .collect()
    }

    const LIST: &str = "namespace common {\ntemplate <typename T>\nclass WRAP_API List {\npublic:\n  T Get(int i) const;\n};\n}\n";

    #[test]
    fn test_instances_are_harvested_once() {
        let decls = run(&format!(
            "{LIST}namespace common {{\nWRAP_API List<int> Numbers();\nWRAP_API void Take(const List<int>& n);\nWRAP_API List<List<bool>> Grid();\n}}"
        ))
        .unwrap();

        assert_eq!(
            signatures(&decls, "common::List"),
            vec![
                "common::List<int>",
                "common::List<common::List<bool>>",
                "common::List<bool>"
            ]
        );
        let instance = &decls.templates.get("common::List").unwrap().instances[0];
        assert_eq!(instance.parent_namespace.to_string(), "common");
    }

    #[test]
    fn test_typedef_arguments_are_substituted() {
        let decls = run(&format!(
            "{LIST}typedef unsigned int Id;\nWRAP_API common::List<Id> Ids();\nWRAP_API common::List<unsigned int> Raw();"
        ))
        .unwrap();

        assert_eq!(signatures(&decls, "common::List"), vec!["common::List<unsigned int>"]);
    }

    #[test]
    fn test_parameters_are_marked() {
        let decls = run(LIST).unwrap();
        let list = decls.templates.get("common::List").unwrap();
        let ret = list.definition.methods[0].return_type.as_ref().unwrap();
        assert!(ret.is_template_argument);
        assert_eq!(ret.class, None);
        assert!(list.instances.is_empty());
    }

    #[test]
    fn test_undeclared_template_is_an_error() {
        let err = run("WRAP_API std::vector<int> Values();").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Source(SourceError {
                kind: SourceErrorKind::UndeclaredTemplate { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_arity_is_an_error() {
        let err = run(&format!("{LIST}WRAP_API common::List<int, int> Pairs();")).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Source(SourceError {
                kind: SourceErrorKind::TemplateArity {
                    expected: 1,
                    found: 2,
                    ..
                },
                ..
            })
        ));
    }

    #[test]
    fn test_instances_propagate_through_return_types() {
        let decls = run(
            "template <typename T>\nclass WRAP_API List {\npublic:\n  T Get(int i) const;\n};\n\
             template <typename K, typename V>\nclass WRAP_API Map {\npublic:\n  List<K> Keys() const;\n  List<V> Values() const;\n};\n\
             WRAP_API Map<int, String> Lookup();",
        )
        .unwrap();

        assert_eq!(signatures(&decls, "Map"), vec!["Map<int,String>"]);
        let mut lists = signatures(&decls, "List");
        lists.sort();
        assert_eq!(lists, vec!["List<String>", "List<int>"]);
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let mut decls = run(
            "template <typename T>\nclass WRAP_API Node {\npublic:\n  Node<T> Next() const;\n};\nWRAP_API Node<int> Head();",
        )
        .unwrap();
        let before = decls.clone();

        propagate_instances(&mut decls).unwrap();
        assert_eq!(decls, before);
        assert_eq!(signatures(&decls, "Node"), vec!["Node<int>"]);
    }
}
