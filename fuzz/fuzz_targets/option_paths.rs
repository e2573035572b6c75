//! Fuzz target for `optionsPath` expressions and endpoint templates.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_option_paths
//! ```

#![no_main]

use arbitrary::Arbitrary;
use formwright_options::path::{
    OptionsPath, expand, field_key, matches_pattern, scope_of, value_at,
};
use formwright_options::template::{flatten, placeholders, substitute};
use indexmap::IndexMap;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

#[derive(Debug, Arbitrary)]
struct Input {
    expression: String,
    field_path: String,
    endpoint: String,
    levels: u8,
    values: Vec<(String, String)>,
}

fuzz_target!(|input: Input| {
    if let Some(parsed) = OptionsPath::parse(&input.expression, "$root") {
        let _ = parsed.source_path(&input.field_path);
        let _ = parsed.rest_segments();
    }
    let _ = scope_of(&input.field_path, usize::from(input.levels));
    let key = field_key(&input.field_path);

    let form: Value = input
        .values
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect::<serde_json::Map<_, _>>()
        .into();
    let _ = value_at(&form, &key);
    for path in expand(&input.expression, &form) {
        assert!(matches_pattern(&input.expression, &path));
    }

    let flat: IndexMap<String, Value> = flatten(&form);
    let _ = placeholders(&input.endpoint);
    let _ = substitute(&input.endpoint, &flat);
});
