use serde::{Deserialize, Serialize};

/// A request field that accepts either a single value or an array of values.
///
/// ```json
/// { "userIds": "6f1c..." }
/// { "userIds": ["6f1c...", "0b2d..."] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OneOrMany::Many(values) if values.is_empty())
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn accepts_a_single_id() {
        let id = Uuid::new_v4();
        let parsed: OneOrMany<Uuid> = serde_json::from_value(serde_json::json!(id)).unwrap();

        assert_eq!(parsed.into_vec(), vec![id]);
    }

    #[test]
    fn accepts_an_array() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let parsed: OneOrMany<Uuid> = serde_json::from_value(serde_json::json!(ids)).unwrap();

        assert!(!parsed.is_empty());
        assert_eq!(parsed.into_vec(), ids);
    }

    #[test]
    fn empty_array_is_empty() {
        let parsed: OneOrMany<Uuid> = serde_json::from_str("[]").unwrap();
        assert!(parsed.is_empty());
    }
}
