use std::collections::HashMap;

use javelin_types::{ClassRef, ClassSegment, Result, SymbolProvider, Type, Wildcard};

use crate::hierarchy::superclass_of;
use crate::ClassTable;

impl<P: SymbolProvider> ClassTable<P> {
    /// Least upper bound of two class types.
    ///
    /// If either type is a supertype of the other, that supertype wins, with type arguments
    /// reconciled against the other side's view of it. Otherwise the result is the nearest
    /// class on `b`'s superclass chain that `a` also reaches. Attributes of both inputs are
    /// joined onto the result.
    pub fn common_super_type(&mut self, a: &ClassRef, b: &ClassRef) -> Result<ClassRef> {
        let attrs = a.attrs.union(b.attrs);
        let found = if let Some(view) = self.as_super_type(a, b)? {
            tracing::trace!(target: "javelin.resolve", %a, %b, "upper bound reached from first type");
            self.reconcile(&view, b)?
        } else if let Some(view) = self.as_super_type(b, a)? {
            tracing::trace!(target: "javelin.resolve", %a, %b, "upper bound reached from second type");
            self.reconcile(a, &view)?
        } else {
            self.common_superclass(a, b)?
        };
        Ok(found.with_attrs(attrs))
    }

    fn common_superclass(&mut self, a: &ClassRef, b: &ClassRef) -> Result<ClassRef> {
        let closure: HashMap<ClassRef, ClassRef> = self
            .closure(a)?
            .into_iter()
            .map(|view| (view.erasure(), view))
            .collect();

        let mut current = Some(b.clone());
        while let Some(view) = current {
            if let Some(from_a) = closure.get(&view.erasure()) {
                tracing::trace!(
                    target: "javelin.resolve",
                    %a,
                    %b,
                    meet = %view,
                    "upper bound found on superclass chain"
                );
                return self.reconcile(from_a, &view);
            }
            let decl = self.load(&view)?;
            current = superclass_of(&decl, &view);
        }
        Ok(ClassRef::object())
    }

    /// Merges two views of the same class. A raw side adopts the other's arguments; otherwise
    /// each argument is the more specific of the two, or `?` when neither contains the other.
    fn reconcile(&mut self, x: &ClassRef, y: &ClassRef) -> Result<ClassRef> {
        if x.is_raw() {
            return Ok(y.clone());
        }
        if y.is_raw() {
            return Ok(x.clone());
        }
        let mut path = Vec::with_capacity(x.path.len());
        for (xs, ys) in x.path.iter().zip(&y.path) {
            let args = if xs.args.is_empty() || xs.args.len() != ys.args.len() {
                ys.args.clone()
            } else if ys.args.is_empty() {
                xs.args.clone()
            } else {
                let mut args = Vec::with_capacity(xs.args.len());
                for (xa, ya) in xs.args.iter().zip(&ys.args) {
                    args.push(self.reconcile_arg(xa, ya)?);
                }
                args
            };
            path.push(ClassSegment {
                name: xs.name.clone(),
                args,
            });
        }
        Ok(ClassRef::new(x.package.clone(), path))
    }

    fn reconcile_arg(&mut self, x: &Type, y: &Type) -> Result<Type> {
        if x == y {
            return Ok(x.clone());
        }
        if self.is_subtype(x, y)? {
            return Ok(x.clone());
        }
        if self.is_subtype(y, x)? {
            return Ok(y.clone());
        }
        Ok(Type::Wildcard(Wildcard::unbounded()))
    }
}
