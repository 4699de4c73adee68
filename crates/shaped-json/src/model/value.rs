//! JSON-like value tree consumed by the encoder and produced by the decoder.

/// A JSON-like value.
///
/// Objects keep their members as an ordered list of pairs. Keys are expected
/// to be unique; the encoder rejects duplicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Builds an object from key/value pairs.
    pub fn object<K, I>(members: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the kind name used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Looks up an object member by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Sorts the members of every object in the tree by key.
    ///
    /// Object member order is not preserved by shaping, so two trees are
    /// compared after sorting both.
    pub fn sort_members(&mut self) {
        match self {
            Value::List(items) => items.iter_mut().for_each(Value::sort_members),
            Value::Object(members) => {
                members.sort_by(|a, b| a.0.cmp(&b.0));
                for (_, v) in members.iter_mut() {
                    v.sort_members();
                }
            }
            _ => {}
        }
    }

    /// Returns a copy with every object's members sorted by key.
    pub fn sorted(&self) -> Value {
        let mut v = self.clone();
        v.sort_members();
        v
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_and_get() {
        let v = Value::object([("a", Value::from(1)), ("b", Value::from("x"))]);
        assert_eq!(v.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(v.get("b").and_then(Value::as_str), Some("x"));
        assert_eq!(v.get("c"), None);
        assert_eq!(Value::Null.get("a"), None);
    }

    #[test]
    fn test_sorted_is_recursive() {
        let v = Value::object([
            ("z", Value::List(vec![Value::object([("y", Value::Null), ("x", Value::Null)])])),
            ("a", Value::Bool(true)),
        ]);
        let expected = Value::object([
            ("a", Value::Bool(true)),
            ("z", Value::List(vec![Value::object([("x", Value::Null), ("y", Value::Null)])])),
        ]);
        assert_eq!(v.sorted(), expected);
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(Value::List(vec![]).kind_name(), "list");
        assert_eq!(Value::default().kind_name(), "null");
    }
}
