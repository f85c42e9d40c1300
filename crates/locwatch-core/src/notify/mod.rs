//! User-facing notification dispatch.
//!
//! Best-effort: failures are logged but never propagate. Backends implement
//! [`Notifier`] and are grouped in a [`NotifierRegistry`].

pub mod backends;
pub mod errors;
pub mod registry;
pub mod traits;

pub use backends::{DesktopNotifier, LogNotifier, StdoutNotifier};
pub use errors::NotifyError;
pub use registry::NotifierRegistry;
pub use traits::Notifier;

/// `"1 code location"` / `"3 code locations"`.
pub fn pluralize_locations(count: usize) -> String {
    if count == 1 {
        "1 code location".to_string()
    } else {
        format!("{} code locations", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize_locations() {
        assert_eq!(pluralize_locations(1), "1 code location");
        assert_eq!(pluralize_locations(0), "0 code locations");
        assert_eq!(pluralize_locations(4), "4 code locations");
    }
}
