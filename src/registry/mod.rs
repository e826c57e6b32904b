//! User-scoped registries over paddocks and devices.
//!
//! Every operation takes the requesting user's id and folds ownership into its lookups.

pub mod devices;
pub mod paddocks;

/// Column width of paddock and device names.
pub const MAX_NAME_LEN: usize = 45;

/// Trims a user-supplied name; blank names count as absent.
pub(crate) fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_absent() {
        assert_eq!(normalize_name(None), None);
        assert_eq!(normalize_name(Some("   ".into())), None);
        assert_eq!(normalize_name(Some(" North ".into())), Some("North".into()));
    }
}
