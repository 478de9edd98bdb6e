#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail with an error, never panic or loop.
    let Ok(vars) = soc_reader::mat::parse(data) else {
        return;
    };
    // Whatever decodes must also survive extraction under every variable name.
    let opts = soc_core::ExtractOptions::default();
    for key in vars.keys() {
        let _ = soc_core::extract_cycles(&vars, key, &opts);
    }
});
