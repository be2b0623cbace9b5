//! Conventions for API input: partial-update fields, basic validation,
//! and envelope-aware extractors.

pub mod extract;

pub use extract::{Json, Path, Query};

use serde::{Deserialize, Deserializer};

/// A field in a partial-update request. Distinguishes "not provided" from
/// "provided as null" so that absent fields retain their previous value
/// while an explicit null clears an optional field.
///
/// Use with `#[serde(default)]` so absent fields deserialize to `Missing`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// Basic email shape check: one '@' with non-empty local and domain parts,
/// and a dot somewhere in the domain.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        name: Patch<String>,
        #[serde(default)]
        phone: Patch<String>,
    }

    #[test]
    fn absent_field_is_missing() {
        let p: Payload = serde_json::from_str(r#"{}"#).unwrap();
        assert!(p.name.is_missing());
        assert!(p.phone.is_missing());
    }

    #[test]
    fn null_is_distinct_from_missing() {
        let p: Payload = serde_json::from_str(r#"{"phone": null}"#).unwrap();
        assert!(p.name.is_missing());
        assert_eq!(p.phone, Patch::Null);
    }

    #[test]
    fn provided_value_is_kept() {
        let p: Payload = serde_json::from_str(r#"{"name": "", "phone": "123"}"#).unwrap();
        assert_eq!(p.name, Patch::Value(String::new()));
        assert_eq!(p.phone.value().map(String::as_str), Some("123"));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("bob@acme.test"));
        assert!(!is_valid_email("bob"));
        assert!(!is_valid_email("@acme.test"));
        assert!(!is_valid_email("bob@"));
        assert!(!is_valid_email("bob@acme"));
        assert!(!is_valid_email("bob@a@b.test"));
    }
}
