//! Result printing: one JSON object per command in `--json` mode, text otherwise.

use serde_json::Value;

use crate::cli::JSON_MODE;

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

/// Print `value` as a single JSON line, or the text from `human`.
pub fn emit(value: &Value, human: impl FnOnce() -> String) {
    if json_mode() {
        println!("{value}");
    } else {
        println!("{}", human());
    }
}
