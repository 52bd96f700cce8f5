//! Parameter name validation and collision handling.
//!
//! Names are dot-separated hierarchical strings ("top.module.rate"). The
//! broker never rejects a duplicate name; it derives a fresh one by
//! appending a numeric suffix and warns. An empty name is the one
//! unrecoverable misuse and panics at the registration site.

use tracing::warn;

/// Panics if `name` is empty. Called on every registration path before
/// any state is touched.
pub fn validate(name: &str) {
    if name.is_empty() {
        panic!("parameter name must not be empty");
    }
}

/// Return `requested` if free, otherwise the first `requested_N` (N from 0
/// upward) that `taken` does not claim. Deterministic for a given set of
/// existing names.
pub fn uniquify(requested: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(requested) {
        return requested.to_string();
    }
    let mut n = 0u64;
    loop {
        let candidate = format!("{}_{}", requested, n);
        if !taken(&candidate) {
            warn!(
                "[BROKER] Name '{}' already in use, registering as '{}'",
                requested, candidate
            );
            return candidate;
        }
        n += 1;
    }
}

/// Join a parent scope and a relative name. An empty scope yields the
/// relative name unchanged.
pub fn scoped(scope: &str, relative: &str) -> String {
    if scope.is_empty() {
        relative.to_string()
    } else {
        format!("{}.{}", scope, relative)
    }
}
