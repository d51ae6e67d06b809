//! Compile a JSON grammar manifest into a descriptor and load it
//!
//! Run: `cargo run --example compile_manifest`

use kql_grammar_tools::{Error, GrammarManifest};

const MANIFEST: &str = r#"{
    "name": "mini-kql",
    "symbols": [
        { "name": "end" },
        { "name": "identifier" },
        { "name": "pipe" },
        { "name": "take" },
        { "name": "number_literal" },
        { "name": "source_file", "kind": "non_terminal" }
    ],
    "states": 5,
    "transitions": [
        { "state": 0, "symbol": "identifier", "action": "shift", "target": 1 },
        { "state": 1, "symbol": "pipe", "action": "shift", "target": 2 },
        { "state": 2, "symbol": "take", "action": "shift", "target": 3 },
        { "state": 3, "symbol": "number_literal", "action": "shift", "target": 4 },
        { "state": 4, "symbol": "end", "action": "reduce", "produces": "source_file" }
    ]
}"#;

fn main() -> Result<(), Error> {
    env_logger::init();

    let manifest = GrammarManifest::from_json(MANIFEST)?;
    let descriptor = manifest.compile()?;
    println!("Compiled '{}' to {} descriptor bytes", manifest.name, descriptor.len());

    let language = manifest.compile_language()?;
    println!(
        "Loaded: {} symbols, {} states, {} transitions",
        language.symbol_count(),
        language.state_count(),
        language.transition_count()
    );

    Ok(())
}
