//! Builds class descriptors from parsed class binaries.
//!
//! Generic signatures win over erased descriptors whenever they parse; a malformed signature
//! falls back to the descriptor. Nullness annotations are mapped onto type attributes.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;

use javelin_classfile::{
    parse_class_signature, parse_field_descriptor, parse_field_signature, parse_method_descriptor,
    parse_method_signature, Annotation, BaseType, ClassFile, ClassMember, ClassTypeSignature,
    FieldType, ReturnType, TypeArgument, TypeParameter, TypeSignature, ACC_INTERFACE,
    ACC_SYNTHETIC, ACC_VARARGS,
};
use javelin_types::{
    ClassDecl, ClassOrigin, ClassRef, ClassSegment, FieldDecl, FunctionType, InnerClassDecl,
    MethodDecl, Modifiers, Nullness, PrimitiveType, ProvisionalClassDecl, ResolveError, Result,
    Type, TypeAttrs, TypeVar, Wildcard,
};

/// `ACC_SUPER` is a class-file artifact with no meaning for declarations.
const ACC_SUPER: u16 = 0x0020;

const STATIC_INITIALIZER: &str = "<clinit>";

/// Type variables visible while converting signatures.
#[derive(Default, Clone)]
struct Scope {
    vars: HashMap<String, TypeVar>,
}

impl Scope {
    fn var(&self, name: &str) -> Type {
        Type::TypeVar(
            self.vars
                .get(name)
                .cloned()
                .unwrap_or_else(|| TypeVar::new(name)),
        )
    }

    /// Declares `params` on top of `self`. Bounds see the new names without their bounds,
    /// so self-referential bounds (`T extends Comparable<T>`) terminate.
    fn declare(&self, params: &[TypeParameter]) -> (Scope, Vec<TypeVar>) {
        let mut unbounded = self.clone();
        for param in params {
            unbounded
                .vars
                .insert(param.name.clone(), TypeVar::new(&param.name));
        }

        let mut scope = self.clone();
        let mut declared = Vec::with_capacity(params.len());
        for param in params {
            let bound = param
                .class_bound
                .iter()
                .chain(&param.interface_bounds)
                .next()
                .map(|sig| type_signature(sig, &unbounded))
                .filter(|bound| !bound.is_object());
            let var = match bound {
                Some(bound) => TypeVar::bounded(&param.name, bound),
                None => TypeVar::new(&param.name),
            };
            scope.vars.insert(param.name.clone(), var.clone());
            declared.push(var);
        }
        (scope, declared)
    }
}

/// Parses `bytes` and converts the result with [`provisional_class_decl`].
pub fn read_class(bytes: &[u8], source: &Path) -> Result<ProvisionalClassDecl> {
    let class = ClassFile::parse(bytes).map_err(|err| {
        ResolveError::internal(format!("failed to read class from {}", source.display()), err)
    })?;
    provisional_class_decl(&class, source)
}

/// Converts `class` into a descriptor that still needs [`ProvisionalClassDecl::finalize`].
///
/// `source` is the file or archive the bytes were read from.
pub fn provisional_class_decl(class: &ClassFile, source: &Path) -> Result<ProvisionalClassDecl> {
    let name = &class.this_class;
    let is_interface = class.access_flags & ACC_INTERFACE != 0;

    let signature = class.signature.as_deref().and_then(|sig| {
        parse_class_signature(sig)
            .map_err(|err| {
                tracing::debug!(
                    target: "javelin.classpath",
                    class = %name,
                    error = %err,
                    "ignoring class signature"
                );
            })
            .ok()
    });

    let (scope, type_params, super_type, interfaces) = match &signature {
        Some(sig) => {
            let (scope, params) = Scope::default().declare(&sig.type_parameters);
            let interfaces = sig
                .interfaces
                .iter()
                .map(|iface| class_type_signature(iface, &scope))
                .collect();
            let super_type = class_type_signature(&sig.super_class, &scope);
            (scope, params, Some(super_type), interfaces)
        }
        None => (
            Scope::default(),
            Vec::new(),
            class.super_class.as_deref().map(ClassRef::from_internal_name),
            class
                .interfaces
                .iter()
                .map(|iface| ClassRef::from_internal_name(iface))
                .collect(),
        ),
    };

    let ty = ClassRef::from_internal_name(name)
        .with_args(type_params.into_iter().map(Type::TypeVar).collect());
    let super_type = match super_type {
        _ if ty.is_object() => None,
        _ if is_interface => Some(ClassRef::object()),
        other => other,
    };

    let fields = class
        .fields
        .iter()
        .filter(|field| field.access_flags & ACC_SYNTHETIC == 0)
        .map(|field| field_decl(name, field, &scope))
        .collect::<Result<Vec<_>>>()?;
    let methods = class
        .methods
        .iter()
        .filter(|method| {
            method.access_flags & ACC_SYNTHETIC == 0 && method.name != STATIC_INITIALIZER
        })
        .map(|method| method_decl(name, method, &scope))
        .collect::<Result<Vec<_>>>()?;

    let nested_prefix = format!("{name}$");
    let inner_classes = class
        .inner_classes
        .iter()
        .filter(|entry| {
            entry
                .inner_class
                .strip_prefix(&nested_prefix)
                .is_some_and(|rest| !rest.contains('$'))
        })
        .map(|entry| InnerClassDecl {
            ty: ClassRef::from_internal_name(&entry.inner_class),
            modifiers: Modifiers::from_bits(entry.access_flags),
            is_anonymous: entry.inner_name.is_none(),
        })
        .collect();

    let modifiers = match class.own_inner_class_entry() {
        Some(entry) => Modifiers::from_bits(entry.access_flags),
        None => Modifiers::from_bits(class.access_flags & !ACC_SUPER),
    };

    Ok(ProvisionalClassDecl::new(ClassDecl {
        ty,
        super_type,
        interfaces,
        fields,
        methods,
        inner_classes,
        modifiers,
        origin: ClassOrigin::Binary(source.to_path_buf()),
    }))
}

fn field_decl(owner: &str, field: &ClassMember, scope: &Scope) -> Result<FieldDecl> {
    let ty = match field.signature.as_deref().and_then(|sig| {
        parse_field_signature(sig)
            .map_err(|err| ignored_signature(owner, &field.name, &err))
            .ok()
    }) {
        Some(sig) => type_signature(&sig, scope),
        None => {
            let descriptor =
                parse_field_descriptor(&field.descriptor).map_err(|err| malformed(owner, err))?;
            field_type(&descriptor)
        }
    };

    Ok(FieldDecl {
        name: field.name.clone(),
        ty: with_nullness(ty, &field.annotations),
        modifiers: Modifiers::from_bits(field.access_flags),
    })
}

fn method_decl(owner: &str, method: &ClassMember, scope: &Scope) -> Result<MethodDecl> {
    let descriptor =
        parse_method_descriptor(&method.descriptor).map_err(|err| malformed(owner, err))?;
    let signature = method.signature.as_deref().and_then(|sig| {
        parse_method_signature(sig)
            .map_err(|err| ignored_signature(owner, &method.name, &err))
            .ok()
    });

    // Signatures of inner-class constructors omit the synthetic outer-instance parameter;
    // the descriptor is authoritative for arity.
    let (params, return_type, thrown) = match signature
        .filter(|sig| sig.parameters.len() == descriptor.params.len())
    {
        Some(sig) => {
            let (scope, _) = scope.declare(&sig.type_parameters);
            let params = sig
                .parameters
                .iter()
                .map(|p| type_signature(p, &scope))
                .collect();
            let return_type = sig
                .return_type
                .as_ref()
                .map_or(Type::VOID, |r| type_signature(r, &scope));
            let thrown = if sig.throws.is_empty() {
                exceptions(method)
            } else {
                sig.throws
                    .iter()
                    .filter_map(|t| match type_signature(t, &scope) {
                        Type::Class(class) => Some(class),
                        _ => None,
                    })
                    .collect()
            };
            (params, return_type, thrown)
        }
        None => {
            let params = descriptor.params.iter().map(field_type).collect();
            let return_type = match &descriptor.return_type {
                ReturnType::Void => Type::VOID,
                ReturnType::Type(ty) => field_type(ty),
            };
            (params, return_type, exceptions(method))
        }
    };

    Ok(MethodDecl {
        name: method.name.clone(),
        signature: FunctionType::new(params, with_nullness(return_type, &method.annotations)),
        modifiers: Modifiers::from_bits(method.access_flags),
        thrown,
        is_variable_arity: method.access_flags & ACC_VARARGS != 0,
    })
}

fn exceptions(method: &ClassMember) -> Vec<ClassRef> {
    method
        .exceptions
        .iter()
        .map(|name| ClassRef::from_internal_name(name))
        .collect()
}

/// Nullness declared by marker annotations, matched by simple name.
fn nullness(annotations: &[Annotation]) -> Nullness {
    annotations
        .iter()
        .filter_map(Annotation::simple_name)
        .find_map(|name| match name {
            "Nonnull" | "NotNull" | "NonNull" => Some(Nullness::NonNull),
            "Nullable" | "CheckForNull" => Some(Nullness::Nullable),
            _ => None,
        })
        .unwrap_or_default()
}

fn with_nullness(ty: Type, annotations: &[Annotation]) -> Type {
    match nullness(annotations) {
        Nullness::Unspecified => ty,
        nullness => ty.with_attrs(TypeAttrs { nullness }),
    }
}

fn base_type(base: BaseType) -> PrimitiveType {
    match base {
        BaseType::Byte => PrimitiveType::Byte,
        BaseType::Char => PrimitiveType::Char,
        BaseType::Double => PrimitiveType::Double,
        BaseType::Float => PrimitiveType::Float,
        BaseType::Int => PrimitiveType::Int,
        BaseType::Long => PrimitiveType::Long,
        BaseType::Short => PrimitiveType::Short,
        BaseType::Boolean => PrimitiveType::Boolean,
    }
}

fn field_type(ty: &FieldType) -> Type {
    match ty {
        FieldType::Base(base) => Type::Primitive(base_type(*base)),
        FieldType::Object(internal) => Type::Class(ClassRef::from_internal_name(internal)),
        FieldType::Array(elem) => Type::array(field_type(elem)),
    }
}

fn type_signature(sig: &TypeSignature, scope: &Scope) -> Type {
    match sig {
        TypeSignature::Base(base) => Type::Primitive(base_type(*base)),
        TypeSignature::Class(class) => Type::Class(class_type_signature(class, scope)),
        TypeSignature::TypeVariable(name) => scope.var(name),
        TypeSignature::Array(elem) => Type::array(type_signature(elem, scope)),
    }
}

fn class_type_signature(sig: &ClassTypeSignature, scope: &Scope) -> ClassRef {
    let path = sig
        .segments
        .iter()
        .map(|segment| ClassSegment {
            name: segment.name.clone(),
            args: segment
                .type_arguments
                .iter()
                .map(|arg| type_argument(arg, scope))
                .collect(),
        })
        .collect();
    ClassRef::new(sig.package.replace('/', "."), path)
}

fn type_argument(arg: &TypeArgument, scope: &Scope) -> Type {
    match arg {
        TypeArgument::Any => Type::Wildcard(Wildcard::unbounded()),
        TypeArgument::Extends(ty) => Type::Wildcard(Wildcard::extends(type_signature(ty, scope))),
        TypeArgument::Super(ty) => Type::Wildcard(Wildcard::super_of(type_signature(ty, scope))),
        TypeArgument::Exact(ty) => type_signature(ty, scope),
    }
}

fn ignored_signature(owner: &str, member: &str, err: &javelin_classfile::Error) {
    tracing::debug!(
        target: "javelin.classpath",
        class = %owner,
        member = %member,
        error = %err,
        "ignoring member signature"
    );
}

fn malformed(owner: &str, err: javelin_classfile::Error) -> ResolveError {
    ResolveError::internal(format!("malformed class {}", owner.replace('/', ".")), err)
}
