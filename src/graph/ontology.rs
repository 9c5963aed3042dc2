//! Well-known property keys
//!
//! A process-wide, immutable table initialised on first use.

use indexmap::IndexSet;
use std::sync::OnceLock;

pub const ID_KEY: &str = "Id";
pub const REV_ID_KEY: &str = "RevId";
pub const LABEL_KEY: &str = "Label";
pub const NAME_KEY: &str = "Name";
pub const DESCRIPTION_KEY: &str = "Description";
pub const CREATED_AT_KEY: &str = "CreatedAt";

static WELL_KNOWN_KEYS: OnceLock<IndexSet<&'static str>> = OnceLock::new();

/// All well-known keys in declaration order
pub fn well_known_keys() -> &'static IndexSet<&'static str> {
    WELL_KNOWN_KEYS.get_or_init(|| {
        [
            ID_KEY,
            REV_ID_KEY,
            LABEL_KEY,
            NAME_KEY,
            DESCRIPTION_KEY,
            CREATED_AT_KEY,
        ]
        .into_iter()
        .collect()
    })
}

pub fn is_well_known(key: &str) -> bool {
    well_known_keys().contains(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_stable() {
        let first = well_known_keys();
        let second = well_known_keys();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.get_index(0), Some(&ID_KEY));
        assert!(is_well_known("RevId"));
        assert!(!is_well_known("age"));
    }
}
