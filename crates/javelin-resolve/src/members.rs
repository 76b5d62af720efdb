use std::collections::{HashSet, VecDeque};

use javelin_types::{ClassRef, FieldDecl, ResolveError, Result, SymbolProvider, Type};

use crate::hierarchy::{is_raw_view, supertypes_of};
use crate::ClassTable;

/// A field found by [`ClassTable::resolve_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// The declaring class, instantiated as seen from the queried owner.
    pub owner: ClassRef,
    pub field: FieldDecl,
    /// The field's type with the owner's type arguments substituted in.
    pub ty: Type,
}

impl<P: SymbolProvider> ClassTable<P> {
    /// Finds field `name` on `owner` or the nearest supertype declaring it.
    pub fn resolve_field(&mut self, owner: &ClassRef, name: &str) -> Result<ResolvedField> {
        let mut queue = VecDeque::from([owner.clone()]);
        let mut seen = HashSet::new();
        while let Some(view) = queue.pop_front() {
            if !seen.insert(view.erasure()) {
                continue;
            }
            let decl = self.load(&view)?;
            if let Some(field) = decl.field(name) {
                let ty = if is_raw_view(&decl, &view) {
                    field.ty.erase_free_vars()
                } else {
                    field.ty.substitute(&decl.binding_for(&view))
                };
                tracing::trace!(
                    target: "javelin.resolve",
                    owner = %owner,
                    field = name,
                    declared_in = %view,
                    "resolved field"
                );
                return Ok(ResolvedField {
                    owner: view,
                    field: field.clone(),
                    ty,
                });
            }
            queue.extend(supertypes_of(&decl, &view));
        }
        Err(ResolveError::FieldNotFound {
            owner: owner.qualified_name(),
            name: name.to_string(),
        })
    }
}
