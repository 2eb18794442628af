/*!
 * HDC Core
 *
 * Shared infrastructure for the HDC client crates: configuration,
 * logging setup, the core error type and async helpers.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

/// HDC core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
