use crate::types::Entity;

/// Separator between the name and label parts of a canonical key.
///
/// ASCII unit separator; keeps `("foo", "bar")` and `("foob", "ar")` apart.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Case-insensitive exact-match key for an entity.
///
/// Names and labels are lowercased but otherwise taken as-is: empty or
/// padded names are keyed verbatim, not repaired.
pub fn canonical_key(entity: &Entity) -> String {
    let mut key = String::with_capacity(entity.name.len() + entity.label.len() + 1);
    key.push_str(&entity.name.to_lowercase());
    key.push(KEY_SEPARATOR);
    key.push_str(&entity.label.to_lowercase());
    key
}

/// Block key used to restrict fuzzy and embedding comparisons to one label.
pub fn label_key(entity: &Entity) -> String {
    entity.label.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            canonical_key(&Entity::new("Paris", "City")),
            canonical_key(&Entity::new("paris", "city"))
        );
        assert_eq!(
            canonical_key(&Entity::new("ÉCOLE", "Org")),
            canonical_key(&Entity::new("école", "org"))
        );
    }

    #[test]
    fn test_name_label_boundary_does_not_collide() {
        let a = canonical_key(&Entity::new("foo", "bar"));
        let b = canonical_key(&Entity::new("foob", "ar"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_label_participates() {
        assert_ne!(
            canonical_key(&Entity::new("Paris", "City")),
            canonical_key(&Entity::new("Paris", "Person"))
        );
    }

    #[test]
    fn test_malformed_names_are_not_repaired() {
        assert_ne!(
            canonical_key(&Entity::new("Paris ", "City")),
            canonical_key(&Entity::new("Paris", "City"))
        );
        assert_eq!(canonical_key(&Entity::new("", "")), KEY_SEPARATOR.to_string());
    }

    #[test]
    fn test_stable() {
        let e = Entity::new("Ada Lovelace", "Person");
        assert_eq!(canonical_key(&e), canonical_key(&e.clone()));
    }
}
