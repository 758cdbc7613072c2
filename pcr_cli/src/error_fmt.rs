//! Human-readable error descriptions and structured JSON error formatting.

use pcr_core::PcrError;

/// Stable process exit codes.
pub mod exit {
    pub const GENERIC: i32 = 1;
    // 2 is clap's usage error
    pub const INIT_FAILURE: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const DUPLICATE: i32 = 5;
    pub const INVALID_DATA: i32 = 6;
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(pe) = err.downcast_ref::<PcrError>() {
        return match pe {
            PcrError::InitializationFailure(msg) => format!(
                "What happened: The light sensor could not be initialized ({msg}).\nLikely causes: BH1750 not wired to the configured I2C bus, wrong hardware.sensor_addr, or the PWM channel is not enabled.\nHow to fix: Check wiring and power, confirm the address with i2cdetect, and verify [hardware] in the config."
            ),
            PcrError::NotFound(name) => format!(
                "What happened: No experiment named {name:?}.\nLikely causes: Typo, or the document was deleted from the resource directory.\nHow to fix: Run `pcr list` to see the available experiments."
            ),
            PcrError::DuplicateName(name) => format!(
                "What happened: An experiment named {name:?} already exists.\nLikely causes: The name was used before.\nHow to fix: Pick another name or remove the existing experiment first."
            ),
            PcrError::InvalidName(name) => format!(
                "What happened: {name:?} cannot be used as an experiment name.\nLikely causes: Empty name, leading dot or whitespace, a path separator, or the reserved name `template`.\nHow to fix: Use a plain file-name-safe name such as `run-2024-05-01`."
            ),
            PcrError::InvalidData(msg) => format!(
                "What happened: Invalid experiment data ({msg}).\nLikely causes: A value outside its allowed range, or a hand-edited document with negative intensities.\nHow to fix: Correct the value and retry; see `pcr show` for the current settings."
            ),
            PcrError::State(msg) => format!(
                "What happened: Operation not allowed right now ({msg}).\nLikely causes: An acquisition run is in progress.\nHow to fix: Wait for the run to finish or stop it with Ctrl-C."
            ),
            PcrError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            PcrError::Document(msg) | PcrError::Io(msg) => format!(
                "What happened: Could not read or write an experiment document ({msg}).\nLikely causes: Wrong --resources directory, missing permissions, or malformed YAML.\nHow to fix: Check storage.resource_dir and the file permissions."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or CSV parsing
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("standard curve csv must have headers") {
        return "Invalid headers in standard curve CSV. Expected 'log_dilution,ct'.".to_string();
    }

    if lower.contains("acquisition.") || lower.contains("hardware.") || lower.contains("logging.") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file and try again."
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

pub fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<PcrError>() {
        Some(PcrError::InitializationFailure(_)) => "InitializationFailure",
        Some(PcrError::NotFound(_)) => "NotFound",
        Some(PcrError::DuplicateName(_)) => "DuplicateName",
        Some(PcrError::InvalidName(_)) => "InvalidName",
        Some(PcrError::InvalidData(_)) => "InvalidData",
        Some(PcrError::OutOfRange { .. }) => "OutOfRange",
        Some(PcrError::ReadError(_)) => "ReadError",
        Some(PcrError::State(_)) => "State",
        Some(PcrError::Config(_)) => "Config",
        Some(PcrError::Document(_)) => "Document",
        Some(PcrError::Io(_)) => "Io",
        None => "Error",
    }
}

/// Map typed core errors to stable exit codes; everything else is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<PcrError>() {
        Some(PcrError::InitializationFailure(_)) => exit::INIT_FAILURE,
        Some(PcrError::NotFound(_)) => exit::NOT_FOUND,
        Some(PcrError::DuplicateName(_)) => exit::DUPLICATE,
        Some(PcrError::InvalidData(_) | PcrError::InvalidName(_)) => exit::INVALID_DATA,
        _ => exit::GENERIC,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_get_stable_codes() {
        let e = eyre::Report::new(PcrError::NotFound("x".into()));
        assert_eq!(exit_code_for_error(&e), 4);
        let e = eyre::Report::new(PcrError::DuplicateName("x".into()));
        assert_eq!(exit_code_for_error(&e), 5);
        let e = eyre::Report::new(PcrError::InitializationFailure("nack".into()));
        assert_eq!(exit_code_for_error(&e), 3);
        assert!(humanize(&e).contains("How to fix"));
        let e = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&e), 1);
    }

    #[test]
    fn json_error_names_the_reason() {
        let e = eyre::Report::new(PcrError::InvalidData("max_cycle".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "InvalidData");
        assert_eq!(v["exit_code"], 6);
    }
}
