use std::process::{Command, Stdio};
use std::sync::OnceLock;

/// Whether a `javac` executable is on `PATH`.
pub fn javac_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let available = Command::new("javac")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        if !available {
            tracing::warn!(target: "javelin.test", "javac not found; skipping compiler tests");
        }
        available
    })
}
