//! Load the built-in KQL grammar and print a summary
//!
//! Run: `cargo run --example load_builtin`

use kql_grammar_tools::{kql, Error};

fn main() -> Result<(), Error> {
    env_logger::init();

    let language = kql::language()?;

    println!("Loaded grammar '{}'", language.name());
    println!("  ABI version: {}", language.abi_version());
    println!("  Symbols:     {}", language.symbol_count());
    println!("  States:      {}", language.state_count());
    println!("  Transitions: {}", language.transition_count());
    println!(
        "  Descriptor:  {} bytes",
        kql::descriptor().len()
    );

    Ok(())
}
