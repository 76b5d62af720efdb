//! Utilities shared by javelin tests.
//!
//! Class binaries are produced by [`ClassFileBuilder`] so most tests run without a JDK.
//! Tests that shell out to a real compiler check [`javac_available`] first and return early
//! when it is missing.

mod classfile;
mod decl;
mod fs;
mod javac;

pub use classfile::{ClassFileBuilder, MemberBuilder};
pub use decl::{DeclBuilder, MemoryProvider};
pub use fs::{set_mtime, write_file, write_jar};
pub use javac::javac_available;

use std::sync::Once;

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// Honors `RUST_LOG`; output goes through the libtest capture.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("javelin=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
