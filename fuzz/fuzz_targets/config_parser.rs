//! Fuzz target for the `formwright.toml` parser.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use formwright_schema::FormwrightConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(config) = FormwrightConfig::from_str(input) {
            let _ = config.with_environment("production");
        }
    }
});
