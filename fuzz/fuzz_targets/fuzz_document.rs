#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any YAML that parses must either load as a record or be rejected cleanly.
    let Ok(doc) = pcr_config::parse_document(data) else {
        return;
    };
    if let Ok(mut rec) = pcr_core::ExperimentRecord::from_document("fuzz", &doc) {
        let _ = rec.recompute_standard_curve();
        let _ = rec.compute_cycle_threshold(rec.intensity_threshold());
        let _ = pcr_config::to_yaml(&rec.to_document());
    }
});
