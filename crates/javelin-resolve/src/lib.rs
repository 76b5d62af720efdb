//! Member lookup and type relations over class descriptors.
//!
//! [`ClassTable`] answers field, method and constructor queries and computes least upper
//! bounds. It never owns descriptors: every class it needs is requested from a
//! [`SymbolProvider`], which may load or compile it on demand.

#![forbid(unsafe_code)]

mod hierarchy;
mod lub;
mod members;
mod overload;

use std::sync::Arc;

use javelin_types::{ClassDecl, ClassRef, Result, SymbolProvider};

pub use crate::members::ResolvedField;
pub use crate::overload::{Phase, ResolvedMethod};

/// Resolution queries scoped to one symbol provider.
///
/// Pass `&mut loader` to borrow an existing provider for the duration of a pass.
#[derive(Debug)]
pub struct ClassTable<P> {
    provider: P,
}

impl<P: SymbolProvider> ClassTable<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    fn load(&mut self, ty: &ClassRef) -> Result<Arc<ClassDecl>> {
        self.provider.load_class(ty)
    }
}
