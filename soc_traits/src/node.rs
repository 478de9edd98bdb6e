use std::collections::BTreeMap;

/// Top-level variables of one measurement file, keyed by variable name.
pub type Variables = BTreeMap<String, Node>;

/// Decoded measurement tree shared by every raw file reader.
///
/// Instrument formats wrap scalars and arrays in redundant single-element
/// containers; readers keep that nesting and leave unwrapping to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Text(String),
    /// Numeric leaf array, flattened in storage order.
    Array(Vec<f64>),
    /// Heterogeneous sequence (cell arrays, struct arrays, JSON arrays).
    List(Vec<Node>),
    /// Named fields (MATLAB struct element, JSON object).
    Record(BTreeMap<String, Node>),
}

impl Node {
    /// Field lookup; `None` for non-record nodes.
    pub fn field(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Field names of a record, sorted. Empty for non-record nodes.
    pub fn field_names(&self) -> Vec<String> {
        match self {
            Node::Record(fields) => fields.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of direct children (1 for scalars and text).
    pub fn len(&self) -> usize {
        match self {
            Node::Number(_) | Node::Text(_) | Node::Record(_) => 1,
            Node::Array(values) => values.len(),
            Node::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Number(_) => "number",
            Node::Text(_) => "text",
            Node::Array(_) => "array",
            Node::List(_) => "list",
            Node::Record(_) => "record",
        }
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Number(v)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<Vec<f64>> for Node {
    fn from(v: Vec<f64>) -> Self {
        Node::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_only_on_records() {
        let mut fields = BTreeMap::new();
        fields.insert("type".to_string(), Node::from("charge"));
        let rec = Node::Record(fields);
        assert_eq!(rec.field("type"), Some(&Node::Text("charge".into())));
        assert!(rec.field("data").is_none());
        assert!(Node::Number(1.0).field("type").is_none());
        assert_eq!(rec.field_names(), vec!["type".to_string()]);
    }

    #[test]
    fn len_counts_direct_children() {
        assert_eq!(Node::Array(vec![1.0, 2.0, 3.0]).len(), 3);
        assert_eq!(Node::List(vec![]).len(), 0);
        assert!(Node::List(vec![]).is_empty());
        assert_eq!(Node::Text(String::new()).len(), 1);
    }
}
