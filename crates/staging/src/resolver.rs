//! Location resolution against a configuration origin
//!
//! Jobs configured from a file may declare outputs and inputs relative to
//! that file's own location. Resolution is pure string/path manipulation:
//! no I/O, total for well-formed inputs, deterministic.

use job_core::Location;

/// Resolve a possibly-relative target against an optional config origin
///
/// - an absolute target (scheme or absolute path) passes through unchanged
/// - with no origin, the target passes through unchanged and is interpreted
///   by the caller relative to its working context
/// - a local origin joins the target onto its parent directory with
///   filesystem rules; a remote origin joins by string prefix up to and
///   including the last `/`
pub fn resolve(target: &str, origin: Option<&Location>) -> Location {
    let candidate = Location::new(target);
    if candidate.is_absolute() {
        return candidate;
    }
    match origin {
        None => candidate,
        Some(origin) => origin.parent_join(target),
    }
}

/// Resolve a sequence of targets elementwise, preserving order
pub fn resolve_all<S: AsRef<str>>(targets: &[S], origin: Option<&Location>) -> Vec<Location> {
    targets
        .iter()
        .map(|t| resolve(t.as_ref(), origin))
        .collect()
}
