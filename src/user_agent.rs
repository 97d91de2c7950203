//! User-Agent header sent by the REST transport.

use std::sync::OnceLock;

/// SDK name used in the User-Agent string.
const SDK_NAME: &str = "eta-rust";

/// SDK version from Cargo.toml.
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

static USER_AGENT: OnceLock<String> = OnceLock::new();

/// Returns the User-Agent string for SDK requests.
///
/// Format: `eta-rust/0.1.0 (rust/1.85; darwin/aarch64)`
///
/// The string is computed once and cached for subsequent calls.
pub fn user_agent() -> &'static str {
    USER_AGENT.get_or_init(|| {
        format!(
            "{}/{} ({}; {}/{})",
            SDK_NAME,
            SDK_VERSION,
            rust_version(),
            os_name(),
            std::env::consts::ARCH,
        )
    })
}

/// Returns the minimum supported Rust version the SDK was built for.
fn rust_version() -> &'static str {
    concat!("rust/", env!("CARGO_PKG_RUST_VERSION"))
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}
