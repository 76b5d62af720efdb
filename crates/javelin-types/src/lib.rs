//! Resolved type descriptors and class descriptors shared across javelin crates.
//!
//! This crate is deliberately free of any IO. The class loader
//! (`javelin-classpath`) owns descriptors and hands them out as `Arc`s; the
//! resolver (`javelin-resolve`) only ever sees them through [`SymbolProvider`].

#![forbid(unsafe_code)]

mod attrs;
mod decl;
mod error;
mod modifiers;
mod ty;

use std::sync::Arc;

pub use crate::attrs::{Nullness, TypeAttrs};
pub use crate::decl::{
    ClassDecl, ClassOrigin, FieldDecl, FunctionType, InnerClassDecl, MethodDecl,
    ProvisionalClassDecl, CONSTRUCTOR_NAME,
};
pub use crate::error::{ResolveError, Result};
pub use crate::modifiers::Modifiers;
pub use crate::ty::{
    Binding, ClassRef, ClassSegment, PrimitiveType, Type, TypeVar, Wildcard, OBJECT,
};

/// Capability used by the resolver to materialize class descriptors on demand.
///
/// Implementations may load, read or compile classes lazily; a call for a
/// class that was already materialized must return the same descriptor.
pub trait SymbolProvider {
    /// Materialize the descriptor for the erasure of `ty`.
    fn load_class(&mut self, ty: &ClassRef) -> Result<Arc<ClassDecl>>;
}

impl<P: SymbolProvider + ?Sized> SymbolProvider for &mut P {
    fn load_class(&mut self, ty: &ClassRef) -> Result<Arc<ClassDecl>> {
        (**self).load_class(ty)
    }
}
