//! JSON mirror of a measurement file.
//!
//! The document is an object of top-level variables, nested the same way the
//! instrument export nests them. Arrays holding only numbers (or nulls) become
//! numeric leaf arrays; `null` decodes to NaN.
use serde_json::Value;
use soc_traits::{Node, Variables};

use crate::error::{ReadError, Result};
use crate::mat::MAX_NESTING;

pub fn parse(text: &str) -> Result<Variables> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| Ok((name, to_node(value, 0)?)))
            .collect(),
        other => Err(ReadError::Malformed {
            offset: 0,
            reason: format!("top-level JSON value must be an object, got {}", kind(&other)),
        }),
    }
}

fn to_node(value: Value, depth: usize) -> Result<Node> {
    if depth > MAX_NESTING {
        return Err(ReadError::TooDeep(MAX_NESTING));
    }
    Ok(match value {
        Value::Null => Node::Number(f64::NAN),
        Value::Bool(b) => Node::Number(if b { 1.0 } else { 0.0 }),
        Value::Number(n) => Node::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Node::Text(s),
        Value::Array(items) => {
            if items.iter().all(|v| v.is_number() || v.is_null()) {
                Node::Array(
                    items
                        .iter()
                        .map(|v| v.as_f64().unwrap_or(f64::NAN))
                        .collect(),
                )
            } else {
                Node::List(
                    items
                        .into_iter()
                        .map(|v| to_node(v, depth + 1))
                        .collect::<Result<_>>()?,
                )
            }
        }
        Value::Object(map) => Node::Record(
            map.into_iter()
                .map(|(k, v)| Ok((k, to_node(v, depth + 1)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_arrays_become_leaf_arrays() {
        let vars = parse(r#"{"B0005": {"v": [4.1, null, 3.9], "t": ["charge"]}}"#).unwrap();
        let rec = &vars["B0005"];
        match rec.field("v") {
            Some(Node::Array(v)) => {
                assert_eq!(v.len(), 3);
                assert!(v[1].is_nan());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            rec.field("t"),
            Some(&Node::List(vec![Node::Text("charge".into())]))
        );
    }

    #[test]
    fn non_object_document_is_rejected() {
        let err = parse("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }
}
