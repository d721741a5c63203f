#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Tokens are built from input text, so none can outgrow it
    let tokens = mediaidx::utils::split_options(data);
    for token in &tokens {
        assert!(data.len() >= token.len());
    }
    let _ = mediaidx::utils::option_value(data, "--input-range");
});
