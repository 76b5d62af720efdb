//! The symbol index: finds, reads and compiles class descriptors along an ordered search path.
//!
//! Package membership is indexed eagerly when the [`ClassLoader`] is built. Descriptors are
//! materialized on first request and cached for the lifetime of the loader; a source file
//! newer than its binary (or without one) is handed to a [`SourceCompiler`].

#![forbid(unsafe_code)]

mod compiler;
mod imports;
mod index;
mod loader;

pub use crate::compiler::{CommandCompiler, CompileRequest, SourceCompiler};
pub use crate::imports::ImportList;
pub use crate::index::PackageInfo;
pub use crate::loader::{ClassLoader, CompileState};
pub use javelin_config::SearchLocation;
