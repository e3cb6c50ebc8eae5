use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered JSON object holding exactly the fields declared for one tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Representation(Map<String, Value>);

impl Representation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only `fields`, in their given order. Absent fields are skipped.
    pub fn project(&self, fields: &[&str]) -> Representation {
        let mut projected = Map::with_capacity(fields.len());
        for field in fields {
            if let Some(value) = self.0.get(*field) {
                projected.insert((*field).to_string(), value.clone());
            }
        }
        Representation(projected)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Representation> for Value {
    fn from(representation: Representation) -> Self {
        representation.into_value()
    }
}

/// Convert a list of representations into a JSON array.
pub fn array(items: Vec<Representation>) -> Value {
    Value::Array(items.into_iter().map(Representation::into_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_follows_requested_order_and_drops_the_rest() {
        let rich = Representation::new()
            .with("id", 7)
            .with("composer", Value::Null)
            .with("title", "Missa")
            .with("url", "https://elvis.test/api/pieces/7");

        let min = rich.project(&["title", "url", "id"]);
        let names: Vec<&str> = min.field_names().collect();
        assert_eq!(names, vec!["title", "url", "id"]);
        assert!(!min.contains("composer"));
        assert_eq!(rich.len(), 4, "source left untouched");
    }

    #[test]
    fn serializes_as_plain_object() {
        let rep = Representation::new().with("title", "Kyrie").with("id", 1);
        let json = serde_json::to_string(&rep).expect("serializes");
        assert_eq!(json, r#"{"title":"Kyrie","id":1}"#);
    }
}
