//! End-to-end checks against the public crate surface

use kql_grammar_tools::{kql, load, Error, GrammarBuilder};

#[test]
fn grammar_can_be_loaded() {
    let language = load(kql::descriptor()).expect("error loading KQL grammar");
    assert_eq!(language.name(), "kql");
}

#[test]
fn repeated_loads_are_behaviorally_identical() {
    let first = load(kql::descriptor()).unwrap();
    let second = load(kql::descriptor()).unwrap();
    assert_eq!(first, second);
    for state in 0..first.state_count() {
        for symbol in 0..first.symbol_count() {
            assert_eq!(first.action(state, symbol), second.action(state, symbol));
        }
    }
}

#[test]
fn version_zero_descriptor_is_rejected() {
    let mut grammar = GrammarBuilder::new("ancient");
    let word = grammar.terminal("word");
    let s0 = grammar.state();
    grammar.shift(s0, word, s0);
    grammar.abi_version(0);

    match load(&grammar.build()) {
        Err(Error::VersionMismatch { found: 0, .. }) => {}
        other => panic!("expected VersionMismatch, got {other:?}"),
    }
}

#[test]
fn empty_descriptor_is_rejected() {
    assert!(matches!(load(&[]), Err(Error::NullOrEmptyDescriptor)));
}

#[test]
fn corrupted_transition_table_is_rejected() {
    let mut grammar = GrammarBuilder::new("corrupt");
    let word = grammar.terminal("word");
    let doc = grammar.non_terminal("document");
    let s0 = grammar.state();
    // Transition references symbol id = symbol_count + 1.
    grammar.shift(s0, doc + 2, s0);
    grammar.shift(s0, word, s0);
    grammar.start_state(s0);

    match load(&grammar.build()) {
        Err(Error::MalformedDescriptor { .. }) => {}
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }
}

#[test]
fn handle_is_usable_across_threads() {
    let language = kql::language().unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let language = language.clone();
            std::thread::spawn(move || {
                let identifier = language.symbol_for_name("identifier").unwrap();
                language.action(language.start_state(), identifier)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_some());
    }
}
