//! Fuzz target for schema documents.
//!
//! Feeds arbitrary JSON to the document parser, lints whatever parses and
//! compiles every schema in it. None of these steps may panic, whatever
//! the references look like.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_schema_document
//! ```

#![no_main]

use std::sync::Arc;

use formwright_compiler::{CompileOptions, SchemaFormCompiler};
use formwright_schema::{SchemaDocument, StaticSchemaProvider, lint_document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(document) = SchemaDocument::from_json(input) else {
        return;
    };
    let _ = lint_document(&document);

    let names: Vec<String> = document.names().map(str::to_string).collect();
    let compiler = SchemaFormCompiler::from_provider(Arc::new(StaticSchemaProvider::new(document)));
    let options = CompileOptions::new().with_label_prefix("fuzz");
    for name in names {
        if let Ok(root) = futures::executor::block_on(compiler.compile(&name, &options)) {
            root.walk(&mut |_, field| {
                let _ = field.failing_validators(&serde_json::Value::Null);
            });
        }
    }
});
