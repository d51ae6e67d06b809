//! The built-in compiled KQL grammar
//!
//! This module embeds the compiled parse table for the KQL pipeline subset
//! (table source, `where`, `project` and `take` operators, identifier and
//! literal operands) and exposes it through an explicit factory. Every call
//! to [`language`] returns an owned handle loaded from the same descriptor
//! bytes; there is no shared handle singleton.

use once_cell::sync::Lazy;

use crate::builder::GrammarBuilder;
use crate::error::Error;
use crate::language::Language;
use crate::loader;

/// Compiled descriptor bytes, built once on first use
static DESCRIPTOR: Lazy<Vec<u8>> = Lazy::new(build_descriptor);

/// The compiled KQL grammar descriptor
///
/// The bytes are immutable and shared; loading them repeatedly yields
/// behaviorally identical handles.
#[must_use]
pub fn descriptor() -> &'static [u8] {
    &DESCRIPTOR
}

/// Load the built-in KQL grammar, returning an owned [`Language`]
pub fn language() -> Result<Language, Error> {
    loader::load(descriptor())
}

/// Serialize the KQL parse table
#[allow(clippy::too_many_lines)]
fn build_descriptor() -> Vec<u8> {
    let mut grammar = GrammarBuilder::new("kql");

    // Terminals
    let end = grammar.terminal("end");
    let identifier = grammar.terminal("identifier");
    let pipe = grammar.terminal("pipe");
    let kw_where = grammar.terminal("where");
    let kw_project = grammar.terminal("project");
    let kw_take = grammar.terminal("take");
    let comma = grammar.terminal("comma");
    let comparison = grammar.terminal("comparison_operator");
    let number = grammar.terminal("number_literal");
    let string = grammar.terminal("string_literal");

    // Non-terminals, named after the grammar's rules
    let source_file = grammar.non_terminal("source_file");
    let query_statement = grammar.non_terminal("query_statement");
    let pipe_expression = grammar.non_terminal("pipe_expression");
    let table_name = grammar.non_terminal("table_name");
    let operator_clause = grammar.non_terminal("operator_clause");
    let where_clause = grammar.non_terminal("where_clause");
    let project_clause = grammar.non_terminal("project_clause");
    let take_clause = grammar.non_terminal("take_clause");
    let predicate = grammar.non_terminal("predicate");
    let column_list = grammar.non_terminal("column_list");

    // Extras, skipped by the lexer
    let _line_comment = grammar.auxiliary("line_comment");

    // Parse states
    let start = grammar.state();
    let after_table_ident = grammar.state();
    let after_table_name = grammar.state();
    let after_pipe = grammar.state();
    let in_where = grammar.state();
    let after_where_ident = grammar.state();
    let in_project = grammar.state();
    let in_take = grammar.state();
    let after_comparison = grammar.state();
    let after_operand = grammar.state();
    let clause_done = grammar.state();
    let after_operator_clause = grammar.state();
    let statement_done = grammar.state();
    let accepted = grammar.state();
    let after_column = grammar.state();
    let after_column_list = grammar.state();
    let after_predicate = grammar.state();
    let after_row_count = grammar.state();

    grammar.start_state(start);

    // Query source: a bare table reference
    grammar.shift(start, identifier, after_table_ident);
    grammar.shift(start, table_name, after_table_name);
    grammar.shift(start, query_statement, statement_done);
    grammar.shift(start, source_file, accepted);
    grammar.reduce(after_table_ident, pipe, table_name);
    grammar.reduce(after_table_ident, end, table_name);
    grammar.shift(after_table_name, pipe, after_pipe);
    grammar.reduce(after_table_name, end, query_statement);
    grammar.shift(after_table_name, pipe_expression, after_operator_clause);

    // Pipe operators
    grammar.shift(after_pipe, kw_where, in_where);
    grammar.shift(after_pipe, kw_project, in_project);
    grammar.shift(after_pipe, kw_take, in_take);
    grammar.shift(after_pipe, where_clause, clause_done);
    grammar.shift(after_pipe, project_clause, clause_done);
    grammar.shift(after_pipe, take_clause, clause_done);
    grammar.shift(after_pipe, operator_clause, after_operator_clause);
    grammar.reduce(clause_done, pipe, operator_clause);
    grammar.reduce(clause_done, end, operator_clause);
    grammar.shift(after_operator_clause, pipe, after_pipe);
    grammar.reduce(after_operator_clause, end, pipe_expression);

    // where <identifier> <op> <operand>
    grammar.shift(in_where, identifier, after_where_ident);
    grammar.shift(in_where, predicate, after_predicate);
    grammar.shift(after_where_ident, comparison, after_comparison);
    grammar.shift(after_comparison, identifier, after_operand);
    grammar.shift(after_comparison, number, after_operand);
    grammar.shift(after_comparison, string, after_operand);
    grammar.reduce(after_operand, pipe, predicate);
    grammar.reduce(after_operand, end, predicate);
    grammar.reduce(after_predicate, pipe, where_clause);
    grammar.reduce(after_predicate, end, where_clause);

    // project <column>[, <column>]*
    grammar.shift(in_project, identifier, after_column);
    grammar.shift(in_project, column_list, after_column_list);
    grammar.shift(after_column, comma, in_project);
    grammar.reduce(after_column, pipe, column_list);
    grammar.reduce(after_column, end, column_list);
    grammar.reduce(after_column_list, pipe, project_clause);
    grammar.reduce(after_column_list, end, project_clause);

    // take <count>
    grammar.shift(in_take, number, after_row_count);
    grammar.reduce(after_row_count, pipe, take_clause);
    grammar.reduce(after_row_count, end, take_clause);

    // Wrap-up
    grammar.reduce(statement_done, end, source_file);
    grammar.accept(accepted, end);

    grammar.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ABI_VERSION;
    use crate::language::{ParseAction, SymbolKind};

    #[test]
    fn test_grammar_can_be_loaded() {
        let language = language().expect("built-in KQL grammar should load");
        assert_eq!(language.name(), "kql");
        assert_eq!(language.abi_version(), ABI_VERSION);
        assert!(language.symbol_count() > 0);
        assert!(language.state_count() > 0);
    }

    #[test]
    fn test_factory_returns_equivalent_owned_handles() {
        let first = language().unwrap();
        let second = language().unwrap();
        assert_eq!(first, second);
        drop(first);
        // The second handle stays usable after the first is gone.
        assert_eq!(second.name(), "kql");
    }

    #[test]
    fn test_expected_rules_present() {
        let language = language().unwrap();
        for rule in [
            "source_file",
            "query_statement",
            "pipe_expression",
            "table_name",
            "where_clause",
            "project_clause",
            "take_clause",
        ] {
            let id = language
                .symbol_for_name(rule)
                .unwrap_or_else(|| panic!("missing rule '{rule}'"));
            assert_eq!(language.symbol_kind(id), Some(SymbolKind::NonTerminal));
        }
        let identifier = language.symbol_for_name("identifier").unwrap();
        assert_eq!(language.symbol_kind(identifier), Some(SymbolKind::Terminal));
    }

    #[test]
    fn test_query_prefix_drives_the_table() {
        // "StormEvents | take 10" as a token walk through shift actions.
        let language = language().unwrap();
        let identifier = language.symbol_for_name("identifier").unwrap();
        let pipe = language.symbol_for_name("pipe").unwrap();
        let take = language.symbol_for_name("take").unwrap();
        let number = language.symbol_for_name("number_literal").unwrap();

        let mut state = language.start_state();
        for token in [identifier, pipe, take, number] {
            match language.action(state, token) {
                Some(ParseAction::Shift { state: next }) => state = next,
                // table_name reduction happens between identifier and pipe;
                // follow the goto afterwards.
                Some(ParseAction::Reduce { symbol }) => {
                    let Some(ParseAction::Shift { state: next }) =
                        language.action(language.start_state(), symbol)
                    else {
                        panic!("no goto for reduced symbol {symbol}");
                    };
                    state = next;
                    let Some(ParseAction::Shift { state: next }) = language.action(state, token)
                    else {
                        panic!("no action after goto for token {token}");
                    };
                    state = next;
                }
                other => panic!("unexpected action {other:?} in state {state}"),
            }
        }
    }

    #[test]
    fn test_descriptor_bytes_are_stable() {
        assert_eq!(descriptor(), descriptor());
        assert!(!descriptor().is_empty());
    }
}
