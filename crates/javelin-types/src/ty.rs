use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::attrs::TypeAttrs;

/// Binary name of the universal root type.
pub const OBJECT: &str = "java.lang.Object";

/// Type variable name -> concrete type.
pub type Binding = HashMap<String, Type>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Void,
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    const INT_RANK: u8 = 2;

    // byte < short < int < long < float < double; char joins the chain at int.
    fn numeric_rank(self) -> Option<u8> {
        match self {
            PrimitiveType::Byte => Some(0),
            PrimitiveType::Short => Some(1),
            PrimitiveType::Int => Some(2),
            PrimitiveType::Long => Some(3),
            PrimitiveType::Float => Some(4),
            PrimitiveType::Double => Some(5),
            PrimitiveType::Void | PrimitiveType::Boolean | PrimitiveType::Char => None,
        }
    }

    /// Identity or widening primitive conversion from `self` to `target`.
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            (PrimitiveType::Char, target) => target
                .numeric_rank()
                .is_some_and(|rank| rank >= Self::INT_RANK),
            (_, PrimitiveType::Char) => false,
            (from, to) => match (from.numeric_rank(), to.numeric_rank()) {
                (Some(from), Some(to)) => from <= to,
                _ => false,
            },
        }
    }

    /// Binary name of the reference type this primitive boxes to.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "java.lang.Void",
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }

    pub fn boxed(self) -> ClassRef {
        ClassRef::from_binary_name(self.boxed_name())
    }

    /// The primitive a boxed reference type unboxes to, if any.
    pub fn unboxed(class: &ClassRef) -> Option<PrimitiveType> {
        if class.package != "java.lang" || class.path.len() != 1 {
            return None;
        }
        let name = class.binary_name();
        Self::ALL
            .into_iter()
            .filter(|p| *p != PrimitiveType::Void)
            .find(|p| p.boxed_name() == name)
    }
}

/// One component of a (possibly nested) class path: `Map` and `Entry` in `Map.Entry<K, V>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassSegment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Type>,
}

impl ClassSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// A nominal reference to a class or interface.
///
/// Equality and hashing are structural over the package and the path (names and type
/// arguments). [`ClassRef::attrs`] is ignored unless [`ClassRef::eq_with_attrs`] is used.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassRef {
    /// Dotted package name; empty for the default package.
    pub package: String,
    /// Outermost class first.
    pub path: Vec<ClassSegment>,
    #[serde(default, skip_serializing_if = "TypeAttrs::is_default")]
    pub attrs: TypeAttrs,
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.package == other.package && self.path == other.path
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.package.hash(state);
        self.path.hash(state);
    }
}

impl ClassRef {
    pub fn new(package: impl Into<String>, path: Vec<ClassSegment>) -> Self {
        Self {
            package: package.into(),
            path,
            attrs: TypeAttrs::default(),
        }
    }

    pub fn top_level(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(package, vec![ClassSegment::new(name)])
    }

    /// Parse `java.util.Map$Entry` (binary name) into a reference without type arguments.
    pub fn from_binary_name(binary_name: &str) -> Self {
        let (package, simple) = match binary_name.rsplit_once('.') {
            Some((package, simple)) => (package, simple),
            None => ("", binary_name),
        };
        Self::new(package, simple.split('$').map(ClassSegment::new).collect())
    }

    /// Parse `java/util/Map$Entry` (internal name).
    pub fn from_internal_name(internal_name: &str) -> Self {
        Self::from_binary_name(&internal_name.replace('/', "."))
    }

    pub fn object() -> Self {
        Self::from_binary_name(OBJECT)
    }

    pub fn is_object(&self) -> bool {
        self.package == "java.lang" && self.path.len() == 1 && self.path[0].name == "Object"
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Type>) -> Self {
        if let Some(last) = self.path.last_mut() {
            last.args = args;
        }
        self
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: TypeAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// A member class of `self`.
    #[must_use]
    pub fn nested(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(ClassSegment::new(name));
        Self::new(self.package.clone(), path)
    }

    /// The immediately enclosing class, for nested classes.
    pub fn outer(&self) -> Option<ClassRef> {
        if self.path.len() < 2 {
            return None;
        }
        let mut path = self.path.clone();
        path.pop();
        Some(Self::new(self.package.clone(), path))
    }

    pub fn simple_name(&self) -> &str {
        self.path.last().map(|s| s.name.as_str()).unwrap_or_default()
    }

    /// Type arguments of the innermost segment.
    pub fn args(&self) -> &[Type] {
        self.path.last().map(|s| s.args.as_slice()).unwrap_or_default()
    }

    /// `Outer$Inner`, the name used by the package index.
    pub fn class_name(&self) -> String {
        self.path
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("$")
    }

    /// `java.util.Map$Entry`.
    pub fn binary_name(&self) -> String {
        if self.package.is_empty() {
            self.class_name()
        } else {
            format!("{}.{}", self.package, self.class_name())
        }
    }

    /// `java.util.Map.Entry`.
    pub fn qualified_name(&self) -> String {
        let names = self
            .path
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".");
        if self.package.is_empty() {
            names
        } else {
            format!("{}.{names}", self.package)
        }
    }

    pub fn is_raw(&self) -> bool {
        self.path.iter().all(|s| s.args.is_empty())
    }

    #[must_use]
    pub fn erasure(&self) -> ClassRef {
        ClassRef {
            package: self.package.clone(),
            path: self
                .path
                .iter()
                .map(|s| ClassSegment::new(s.name.clone()))
                .collect(),
            attrs: self.attrs,
        }
    }

    /// Same package and nested-class names, ignoring type arguments.
    pub fn same_erasure(&self, other: &ClassRef) -> bool {
        self.package == other.package
            && self.path.len() == other.path.len()
            && self
                .path
                .iter()
                .zip(&other.path)
                .all(|(a, b)| a.name == b.name)
    }

    pub fn eq_with_attrs(&self, other: &ClassRef) -> bool {
        self == other && self.attrs == other.attrs
    }

    #[must_use]
    pub fn substitute(&self, binding: &Binding) -> ClassRef {
        ClassRef {
            package: self.package.clone(),
            path: self
                .path
                .iter()
                .map(|s| ClassSegment {
                    name: s.name.clone(),
                    args: s.args.iter().map(|a| a.substitute(binding)).collect(),
                })
                .collect(),
            attrs: self.attrs,
        }
    }

    /// Populate `out` by matching `self` (the template) against `concrete`.
    pub fn bind(&self, concrete: &ClassRef, out: &mut Binding) {
        if !self.same_erasure(concrete) {
            return;
        }
        for (template, concrete) in self.path.iter().zip(&concrete.path) {
            if template.args.len() != concrete.args.len() {
                continue;
            }
            for (t, c) in template.args.iter().zip(&concrete.args) {
                t.bind(c, out);
            }
        }
    }

    /// Structural containment: same erasure, and every type argument of `self` contains
    /// the corresponding argument of `other`. A raw `self` contains any instantiation.
    pub fn supset_eq_of(&self, other: &ClassRef) -> bool {
        if !self.same_erasure(other) {
            return false;
        }
        self.path.iter().zip(&other.path).all(|(a, b)| {
            if a.args.is_empty() {
                return true;
            }
            a.args.len() == b.args.len()
                && a.args.iter().zip(&b.args).all(|(a, b)| type_arg_contains(a, b))
        })
    }

    #[must_use]
    pub fn union(&self, other: &ClassRef) -> ClassRef {
        if self != other {
            return self.clone();
        }
        ClassRef {
            package: self.package.clone(),
            path: self
                .path
                .iter()
                .zip(&other.path)
                .map(|(a, b)| ClassSegment {
                    name: a.name.clone(),
                    args: a.args.iter().zip(&b.args).map(|(a, b)| a.union(b)).collect(),
                })
                .collect(),
            attrs: self.attrs.union(other.attrs),
        }
    }
}

fn type_arg_contains(outer: &Type, inner: &Type) -> bool {
    match outer {
        Type::Wildcard(w) => w.contains(inner),
        _ => outer == inner,
    }
}

/// A type variable. Two variables with the same name but different bounds are distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<Box<Type>>,
}

impl TypeVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
        }
    }

    pub fn bounded(name: impl Into<String>, bound: Type) -> Self {
        Self {
            name: name.into(),
            bound: Some(Box::new(bound)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wildcard {
    /// `? super lower`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<Box<Type>>,
    /// `? extends upper`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Box<Type>>,
}

impl Wildcard {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `? extends upper`; `? extends Object` is normalized to `?`.
    pub fn extends(upper: Type) -> Self {
        if upper.is_object() {
            return Self::unbounded();
        }
        Self {
            lower: None,
            upper: Some(Box::new(upper)),
        }
    }

    pub fn super_of(lower: Type) -> Self {
        Self {
            lower: Some(Box::new(lower)),
            upper: None,
        }
    }

    /// Whether the set of types denoted by `self` contains `other`.
    pub fn contains(&self, other: &Type) -> bool {
        match other {
            Type::Wildcard(o) => {
                let upper_ok = match (&self.upper, &o.upper) {
                    (None, _) => true,
                    (Some(u), Some(ou)) => u.supset_eq_of(ou),
                    (Some(u), None) => u.is_object(),
                };
                let lower_ok = match (&self.lower, &o.lower) {
                    (None, _) => true,
                    (Some(l), Some(ol)) => ol.supset_eq_of(l),
                    (Some(_), None) => false,
                };
                upper_ok && lower_ok
            }
            other => {
                other.is_reference()
                    && self.upper.as_ref().map_or(true, |u| u.supset_eq_of(other))
                    && self.lower.as_ref().map_or(true, |l| other.supset_eq_of(l))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Type {
    Primitive(PrimitiveType),
    Array(Box<Type>),
    Class(ClassRef),
    TypeVar(TypeVar),
    Wildcard(Wildcard),
    Intersection(Vec<ClassRef>),
}

impl From<PrimitiveType> for Type {
    fn from(value: PrimitiveType) -> Self {
        Type::Primitive(value)
    }
}

impl From<ClassRef> for Type {
    fn from(value: ClassRef) -> Self {
        Type::Class(value)
    }
}

impl Type {
    pub const VOID: Type = Type::Primitive(PrimitiveType::Void);
    pub const BOOLEAN: Type = Type::Primitive(PrimitiveType::Boolean);
    pub const INT: Type = Type::Primitive(PrimitiveType::Int);

    pub fn object() -> Type {
        Type::Class(ClassRef::object())
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn type_var(name: impl Into<String>) -> Type {
        Type::TypeVar(TypeVar::new(name))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Class(c) if c.is_object())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive()
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Type::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Replace type variables by their bindings. Variables missing from `binding` are kept.
    #[must_use]
    pub fn substitute(&self, binding: &Binding) -> Type {
        if binding.is_empty() {
            return self.clone();
        }
        match self {
            Type::Primitive(_) => self.clone(),
            Type::Array(elem) => Type::Array(Box::new(elem.substitute(binding))),
            Type::Class(class) => Type::Class(class.substitute(binding)),
            // The bound-in type keeps its own attributes; the variable has none to offer.
            Type::TypeVar(var) => binding.get(&var.name).cloned().unwrap_or_else(|| self.clone()),
            Type::Wildcard(w) => Type::Wildcard(Wildcard {
                lower: w.lower.as_ref().map(|t| Box::new(t.substitute(binding))),
                upper: w.upper.as_ref().map(|t| Box::new(t.substitute(binding))),
            }),
            Type::Intersection(bounds) => {
                Type::Intersection(bounds.iter().map(|b| b.substitute(binding)).collect())
            }
        }
    }

    /// Unify `self` (a template that may mention type variables) with `concrete`, recording
    /// the first binding found for each variable. Mismatched shapes bind nothing.
    pub fn bind(&self, concrete: &Type, out: &mut Binding) {
        match (self, concrete) {
            (Type::TypeVar(var), concrete) => {
                out.entry(var.name.clone())
                    .or_insert_with(|| concrete.clone());
            }
            (Type::Array(t), Type::Array(c)) => t.bind(c, out),
            (Type::Class(t), Type::Class(c)) => t.bind(c, out),
            (Type::Wildcard(t), Type::Wildcard(c)) => {
                if let (Some(t), Some(c)) = (&t.upper, &c.upper) {
                    t.bind(c, out);
                }
                if let (Some(t), Some(c)) = (&t.lower, &c.lower) {
                    t.bind(c, out);
                }
            }
            (Type::Wildcard(t), concrete) => {
                if let Some(upper) = &t.upper {
                    upper.bind(concrete, out);
                }
                if let Some(lower) = &t.lower {
                    lower.bind(concrete, out);
                }
            }
            (Type::Intersection(bounds), Type::Class(c)) => {
                for bound in bounds {
                    bound.bind(c, out);
                }
            }
            _ => {}
        }
    }

    /// Replace every remaining type variable with the universal root type.
    #[must_use]
    pub fn erase_free_vars(&self) -> Type {
        match self {
            Type::Primitive(_) => self.clone(),
            Type::TypeVar(_) => Type::object(),
            Type::Array(elem) => Type::Array(Box::new(elem.erase_free_vars())),
            Type::Class(class) => Type::Class(ClassRef {
                package: class.package.clone(),
                path: class
                    .path
                    .iter()
                    .map(|s| ClassSegment {
                        name: s.name.clone(),
                        args: s.args.iter().map(Type::erase_free_vars).collect(),
                    })
                    .collect(),
                attrs: class.attrs,
            }),
            Type::Wildcard(w) => Type::Wildcard(Wildcard {
                lower: w.lower.as_ref().map(|t| Box::new(t.erase_free_vars())),
                upper: w.upper.as_ref().map(|t| Box::new(t.erase_free_vars())),
            }),
            Type::Intersection(bounds) => Type::Intersection(
                bounds
                    .iter()
                    .map(|b| match Type::Class(b.clone()).erase_free_vars() {
                        Type::Class(c) => c,
                        _ => b.clone(),
                    })
                    .collect(),
            ),
        }
    }

    /// Erasure as seen by the binary form: type arguments dropped, each type variable replaced
    /// by the erasure of its bound (or the root type when unbounded).
    #[must_use]
    pub fn erase_to_bounds(&self) -> Type {
        match self {
            Type::Primitive(_) => self.clone(),
            Type::Array(elem) => Type::Array(Box::new(elem.erase_to_bounds())),
            Type::Class(class) => Type::Class(class.erasure()),
            Type::TypeVar(var) => match &var.bound {
                Some(bound) => bound.erase_to_bounds(),
                None => Type::object(),
            },
            Type::Wildcard(w) => match &w.upper {
                Some(upper) => upper.erase_to_bounds(),
                None => Type::object(),
            },
            Type::Intersection(bounds) => match bounds.first() {
                Some(first) => Type::Class(first.erasure()),
                None => Type::object(),
            },
        }
    }

    pub fn has_type_vars(&self) -> bool {
        match self {
            Type::Primitive(_) => false,
            Type::TypeVar(_) => true,
            Type::Array(elem) => elem.has_type_vars(),
            Type::Class(class) => class
                .path
                .iter()
                .any(|s| s.args.iter().any(Type::has_type_vars)),
            Type::Wildcard(w) => {
                w.lower.as_ref().is_some_and(|t| t.has_type_vars())
                    || w.upper.as_ref().is_some_and(|t| t.has_type_vars())
            }
            Type::Intersection(bounds) => bounds
                .iter()
                .any(|b| b.path.iter().any(|s| s.args.iter().any(Type::has_type_vars))),
        }
    }

    /// `self ⊇ other`: `other` is usable where `self` is expected, without walking the
    /// class hierarchy.
    ///
    /// Primitives follow widening order, arrays are covariant over reference elements,
    /// class types need the same erasure plus contained type arguments.
    pub fn supset_eq_of(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Type::Primitive(a), Type::Primitive(b)) => b.widens_to(*a),
            (Type::Array(a), Type::Array(b)) => match (&**a, &**b) {
                (Type::Primitive(x), Type::Primitive(y)) => x == y,
                (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
                (a, b) => a.supset_eq_of(b),
            },
            (Type::Class(a), Type::Class(b)) => a.supset_eq_of(b),
            (Type::Wildcard(w), other) => w.contains(other),
            (_, Type::TypeVar(var)) => var
                .bound
                .as_ref()
                .is_some_and(|bound| self.supset_eq_of(bound)),
            (Type::Intersection(bounds), other) => bounds
                .iter()
                .all(|b| Type::Class(b.clone()).supset_eq_of(other)),
            (_, Type::Intersection(bounds)) => bounds
                .iter()
                .any(|b| self.supset_eq_of(&Type::Class(b.clone()))),
            _ => false,
        }
    }

    /// Pointwise lattice join of attributes. Types of different shape keep `self`.
    #[must_use]
    pub fn union(&self, other: &Type) -> Type {
        match (self, other) {
            (Type::Class(a), Type::Class(b)) => Type::Class(a.union(b)),
            (Type::Array(a), Type::Array(b)) => Type::Array(Box::new(a.union(b))),
            (Type::Wildcard(a), Type::Wildcard(b)) => Type::Wildcard(Wildcard {
                lower: union_opt(&a.lower, &b.lower),
                upper: union_opt(&a.upper, &b.upper),
            }),
            _ => self.clone(),
        }
    }

    pub fn attrs(&self) -> TypeAttrs {
        match self {
            Type::Class(class) => class.attrs,
            _ => TypeAttrs::default(),
        }
    }

    #[must_use]
    pub fn with_attrs(self, attrs: TypeAttrs) -> Type {
        match self {
            Type::Class(class) => Type::Class(class.with_attrs(attrs)),
            other => other,
        }
    }
}

fn union_opt(a: &Option<Box<Type>>, b: &Option<Box<Type>>) -> Option<Box<Type>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Box::new(a.union(b))),
        (a, _) => a.clone(),
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            write!(f, "{}.", self.package)?;
        }
        for (idx, segment) in self.path.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
            if !segment.args.is_empty() {
                f.write_str("<")?;
                for (i, arg) in segment.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.name()),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Class(class) => write!(f, "{class}"),
            Type::TypeVar(var) => f.write_str(&var.name),
            Type::Wildcard(w) => match (&w.lower, &w.upper) {
                (Some(lower), _) => write!(f, "? super {lower}"),
                (None, Some(upper)) => write!(f, "? extends {upper}"),
                (None, None) => f.write_str("?"),
            },
            Type::Intersection(bounds) => {
                for (i, bound) in bounds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{bound}")?;
                }
                Ok(())
            }
        }
    }
}
