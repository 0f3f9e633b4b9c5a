//! Shared types used across the simulation core crates.

mod types;

pub use types::{EntityId, EntityPoint, Priority};

pub fn crate_info() -> &'static str {
    "simcore-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
