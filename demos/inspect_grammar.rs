//! Dump the symbol and transition tables of the built-in KQL grammar
//!
//! Run: `cargo run --example inspect_grammar`

use kql_grammar_tools::{kql, Error, ParseAction};

fn main() -> Result<(), Error> {
    env_logger::init();

    let language = kql::language()?;

    println!("Symbols:");
    for (id, symbol) in language.symbols().enumerate() {
        println!("  {id:3}  {:?}  {}", symbol.kind, symbol.name);
    }

    println!("\nTransitions:");
    for state in 0..language.state_count() {
        for symbol in 0..language.symbol_count() {
            let Some(action) = language.action(state, symbol) else {
                continue;
            };
            let symbol_name = language.symbol_name(symbol).unwrap_or("?");
            match action {
                ParseAction::Shift { state: target } => {
                    println!("  state {state:2} on {symbol_name:20} -> shift to {target}");
                }
                ParseAction::Reduce { symbol: produced } => {
                    let produced = language.symbol_name(produced).unwrap_or("?");
                    println!("  state {state:2} on {symbol_name:20} -> reduce {produced}");
                }
                ParseAction::Accept => {
                    println!("  state {state:2} on {symbol_name:20} -> accept");
                }
            }
        }
    }

    Ok(())
}
