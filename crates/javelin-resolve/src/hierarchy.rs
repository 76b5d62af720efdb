use std::collections::{HashSet, VecDeque};

use javelin_types::{ClassDecl, ClassRef, Result, SymbolProvider, Type};

use crate::ClassTable;

/// Reference types every array type is assignable to.
const ARRAY_SUPERTYPES: &[&str] = &[
    "java.lang.Object",
    "java.lang.Cloneable",
    "java.io.Serializable",
];

/// Supertypes of `decl` seen through `view`: substituted with the view's arguments, or erased
/// when `view` is the raw form of a generic class.
pub(crate) fn supertypes_of(decl: &ClassDecl, view: &ClassRef) -> Vec<ClassRef> {
    if is_raw_view(decl, view) {
        return decl.supertypes().map(ClassRef::erasure).collect();
    }
    let binding = decl.binding_for(view);
    decl.supertypes().map(|s| s.substitute(&binding)).collect()
}

pub(crate) fn superclass_of(decl: &ClassDecl, view: &ClassRef) -> Option<ClassRef> {
    let super_type = decl.super_type.as_ref()?;
    if is_raw_view(decl, view) {
        return Some(super_type.erasure());
    }
    Some(super_type.substitute(&decl.binding_for(view)))
}

pub(crate) fn is_raw_view(decl: &ClassDecl, view: &ClassRef) -> bool {
    view.is_raw() && !decl.ty.is_raw()
}

impl<P: SymbolProvider> ClassTable<P> {
    /// Direct supertypes of `ty`, superclass first.
    pub fn direct_supertypes(&mut self, ty: &ClassRef) -> Result<Vec<ClassRef>> {
        let decl = self.load(ty)?;
        Ok(supertypes_of(&decl, ty))
    }

    /// `ty` viewed as its supertype `target`, with type arguments carried along every hop.
    ///
    /// `ArrayList<String>` as `List` is `List<String>`. `None` if `target` is not a supertype.
    pub fn as_super_type(&mut self, ty: &ClassRef, target: &ClassRef) -> Result<Option<ClassRef>> {
        if target.is_object() {
            return Ok(Some(ClassRef::object()));
        }
        let mut queue = VecDeque::from([ty.clone()]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if current.same_erasure(target) {
                return Ok(Some(current));
            }
            if !seen.insert(current.erasure()) {
                continue;
            }
            queue.extend(self.direct_supertypes(&current)?);
        }
        Ok(None)
    }

    /// Every supertype reachable from `ty` (including `ty`), breadth first, one view per
    /// erased class.
    pub(crate) fn closure(&mut self, ty: &ClassRef) -> Result<Vec<ClassRef>> {
        let mut queue = VecDeque::from([ty.clone()]);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.erasure()) {
                continue;
            }
            queue.extend(self.direct_supertypes(&current)?);
            out.push(current);
        }
        Ok(out)
    }

    /// Whether a value of type `sub` may be used where `sup` is expected, walking the class
    /// hierarchy. No boxing; a raw supertype view is accepted where a parameterized one is
    /// expected (unchecked conversion).
    pub fn is_subtype(&mut self, sub: &Type, sup: &Type) -> Result<bool> {
        if sup.supset_eq_of(sub) {
            return Ok(true);
        }
        match (sub, sup) {
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => Ok(false),
            (_, sup) if sup.is_object() => Ok(true),
            (Type::Array(a), Type::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    return Ok(false);
                }
                self.is_subtype(a, b)
            }
            (Type::Array(_), Type::Class(class)) => {
                Ok(ARRAY_SUPERTYPES.contains(&class.binary_name().as_str()))
            }
            (Type::TypeVar(var), sup) => match &var.bound {
                Some(bound) => self.is_subtype(bound, sup),
                None => Ok(false),
            },
            (Type::Intersection(bounds), sup) => {
                for bound in bounds {
                    if self.is_subtype(&Type::Class(bound.clone()), sup)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            (sub, Type::Intersection(bounds)) => {
                for bound in bounds {
                    if !self.is_subtype(sub, &Type::Class(bound.clone()))? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (sub, Type::Wildcard(w)) => {
                if let Some(upper) = &w.upper {
                    if !self.is_subtype(sub, upper)? {
                        return Ok(false);
                    }
                }
                match &w.lower {
                    Some(lower) => self.is_subtype(lower, sub),
                    None => Ok(true),
                }
            }
            (Type::Class(a), Type::Class(b)) => match self.as_super_type(a, b)? {
                Some(view) => self.class_contains(b, &view),
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    /// `outer` and `inner` have the same erasure; compare their arguments segment by segment.
    fn class_contains(&mut self, outer: &ClassRef, inner: &ClassRef) -> Result<bool> {
        for (o, i) in outer.path.iter().zip(&inner.path) {
            if o.args.is_empty() || i.args.is_empty() {
                continue;
            }
            if o.args.len() != i.args.len() {
                return Ok(false);
            }
            for (o, i) in o.args.iter().zip(&i.args) {
                if !self.arg_contains(o, i)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Type argument containment: `? extends Number` contains `Integer` and `? extends Integer`.
    fn arg_contains(&mut self, outer: &Type, inner: &Type) -> Result<bool> {
        let Type::Wildcard(w) = outer else {
            return Ok(outer == inner);
        };
        let (inner_upper, inner_lower) = match inner {
            Type::Wildcard(i) => (i.upper.as_deref(), i.lower.as_deref()),
            other => (Some(other), Some(other)),
        };
        if let Some(upper) = &w.upper {
            match inner_upper {
                Some(inner_upper) if self.is_subtype(inner_upper, upper)? => {}
                _ => return Ok(false),
            }
        }
        if let Some(lower) = &w.lower {
            match inner_lower {
                Some(inner_lower) if self.is_subtype(lower, inner_lower)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
}
