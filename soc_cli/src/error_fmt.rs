//! Human-readable error descriptions and structured JSON error formatting.

use soc_core::SocError;

/// Stable short name for JSON output.
pub fn reason_name(e: &SocError) -> &'static str {
    match e {
        SocError::SourceFileMissing(_) => "SourceFileMissing",
        SocError::KeyNotFound { .. } => "KeyNotFound",
        SocError::MalformedRecord(_) => "MalformedRecord",
        SocError::CycleProcessing { .. } => "CycleProcessingFailure",
        SocError::UnwrapDepthExceeded(_) => "UnwrapDepthExceeded",
        SocError::Read(_) => "ReadError",
        SocError::ModelArtifactMissing(_) => "ModelArtifactMissing",
        SocError::InvalidArtifact(_) => "InvalidArtifact",
        SocError::FeatureCountMismatch { .. } => "FeatureCountMismatch",
        SocError::ModelUnavailable => "ModelUnavailable",
        SocError::Model(_) => "ModelError",
        SocError::InsufficientData { .. } => "InsufficientData",
        SocError::Io(_) => "Io",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(se) = err.downcast_ref::<SocError>() {
        return match se {
            SocError::SourceFileMissing(path) => format!(
                "What happened: Input file not found ({path}).\nLikely causes: Wrong path, or the previous pipeline step has not run yet.\nHow to fix: Check paths.raw_file / paths.processed_csv in the config or pass --input."
            ),
            SocError::KeyNotFound { key, available } => format!(
                "What happened: Key '{key}' not found in the raw file.\nLikely causes: The battery variable is named differently than the file.\nHow to fix: Pass --variable with one of: {}.",
                if available.is_empty() {
                    "(no keys found)".to_string()
                } else {
                    available.join(", ")
                }
            ),
            SocError::ModelArtifactMissing(path) => format!(
                "What happened: Model artifact not found ({path}).\nLikely causes: No model has been trained into this directory.\nHow to fix: Run `soc train` first, or point --model-dir at a trained model."
            ),
            SocError::FeatureCountMismatch { expected, received } => format!(
                "What happened: Expected {expected} features, got {received}.\nLikely causes: Missing or extra values in --features.\nHow to fix: Pass values in model order: voltage_mean,current_mean,temperature_mean,time_max."
            ),
            SocError::ModelUnavailable => {
                "What happened: No model is loaded.\nLikely causes: The model directory is empty or unreadable.\nHow to fix: Run `soc train`, then retry.".to_string()
            }
            SocError::InvalidArtifact(msg) => format!(
                "What happened: The model artifact is invalid ({msg}).\nLikely causes: Files from different training runs, or hand-edited metadata.\nHow to fix: Retrain with `soc train`."
            ),
            SocError::InsufficientData {
                required,
                available,
            } => format!(
                "What happened: Not enough rows to train ({available} available, {required} required).\nLikely causes: Extraction skipped most cycles, or the wrong CSV was given.\nHow to fix: Check the `soc extract` warnings or lower training.min_rows."
            ),
            SocError::Read(msg) => format!(
                "What happened: The raw file could not be decoded ({msg}).\nLikely causes: Corrupt file, or a MATLAB v7.3 (HDF5) file.\nHow to fix: Re-save the file as MATLAB v5/v7 (`save -v7`) or convert it to JSON."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or CSV loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("processed csv must have headers") {
        return format!(
            "Invalid headers in processed CSV. Expected '{}'.",
            soc_config::PROCESSED_HEADERS.join(",")
        );
    }

    if lower.contains("invalid csv row") {
        return format!(
            "What happened: The processed CSV has a malformed row ({msg}).\nLikely causes: The file was edited by hand or truncated.\nHow to fix: Regenerate it with `soc extract`."
        );
    }

    if lower.contains("invalid configuration") || lower.contains("config file") {
        return format!(
            "What happened: Configuration is invalid or unreadable ({msg}).\nLikely causes: TOML syntax error or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map domain errors to stable exit codes; everything else is 1 (clap usage errors exit 2).
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<SocError>() {
        Some(SocError::SourceFileMissing(_)) => 3,
        Some(SocError::KeyNotFound { .. }) => 4,
        Some(SocError::ModelArtifactMissing(_)) => 5,
        Some(SocError::FeatureCountMismatch { .. }) => 6,
        Some(SocError::ModelUnavailable) => 7,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(se) = err.downcast_ref::<SocError>() {
        let msg = humanize(err);
        let details = match se {
            SocError::KeyNotFound { key, available } => {
                Some(json!({ "key": key, "available": available }))
            }
            SocError::FeatureCountMismatch { expected, received } => {
                Some(json!({ "expected": expected, "received": received }))
            }
            SocError::SourceFileMissing(path) | SocError::ModelArtifactMissing(path) => {
                Some(json!({ "path": path }))
            }
            _ => None,
        };

        let obj = if let Some(d) = details {
            json!({ "reason": reason_name(se), "details": d, "message": msg })
        } else {
            json!({ "reason": reason_name(se), "message": msg })
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
