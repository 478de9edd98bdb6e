#![allow(dead_code)]
use std::collections::BTreeMap;

use soc_core::FEATURE_NAMES;
use soc_config::{Metrics, ModelInfo};
use soc_traits::{Node, Variables};

pub fn record(fields: Vec<(&str, Node)>) -> Node {
    Node::Record(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// MATLAB-style wrapping: every value sits inside a one-element list.
pub fn wrap(node: Node) -> Node {
    Node::List(vec![node])
}

/// A well-formed cycle with a voltage ramp around `volts`.
pub fn cycle(kind: &str, volts: f64) -> Node {
    record(vec![
        ("type", wrap(Node::Text(kind.into()))),
        ("ambient_temperature", wrap(Node::Array(vec![24.0]))),
        (
            "data",
            wrap(record(vec![
                (
                    "Voltage_measured",
                    Node::Array(vec![volts - 0.1, volts, volts + 0.1]),
                ),
                ("Current_measured", Node::Array(vec![-2.0, -2.0, -2.0])),
                ("Temperature_measured", Node::Array(vec![24.0, 25.0, 26.0])),
                ("Time", Node::Array(vec![0.0, 10.0, 20.0])),
            ])),
        ),
    ])
}

pub fn battery(key: &str, cycles: Vec<Node>) -> Variables {
    let mut vars = Variables::new();
    vars.insert(key.to_string(), wrap(record(vec![("cycle", Node::List(cycles))])));
    vars
}

pub fn info() -> ModelInfo {
    ModelInfo {
        best_model_name: "RandomForest".into(),
        feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
        feature_importances: BTreeMap::new(),
        metrics: Metrics {
            r2: 0.9,
            rmse: 4.0,
            mae: 3.0,
        },
    }
}
