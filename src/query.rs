//! # Full-Text Query Compiler
//!
//! Transforms a raw query string into a `{primary, fallback?}` pair safe for
//! the Store's SQLite FTS5 backend. FTS5's `MATCH` syntax treats `"`, `^`,
//! `*`, `:`, `(`, `)`, `-` as syntactically meaningful; tokens containing
//! them are quoted so they become literal phrase matches instead of
//! triggering a parse error.

use unicode_normalization::UnicodeNormalization;

/// Compiled full-text expressions for a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub primary: String,
    pub fallback: Option<String>,
}

const RESERVED: &[char] = &['"', '^', '*', ':', '(', ')', '-', '+'];

fn needs_quoting(token: &str) -> bool {
    token.chars().any(|c| RESERVED.contains(&c))
}

fn quote_literal(token: &str) -> String {
    let stripped: String = token.chars().filter(|c| *c != '"').collect();
    format!("\"{stripped}\"")
}

fn escape_token(token: &str) -> String {
    if needs_quoting(token) {
        quote_literal(token)
    } else {
        token.to_string()
    }
}

/// Tokenizes input NFC-normalized and whitespace-split, stripping bare
/// double quotes (spec §4.4: "double quotes stripped").
fn tokenize(input: &str) -> Vec<String> {
    let normalized: String = input.nfc().collect();
    normalized
        .split_whitespace()
        .map(|t| t.replace('"', ""))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Compiles a raw free-text query into primary (AND of prefix matches) and,
/// for multi-token input, a fallback (OR of prefix matches) expression.
pub fn compile(input: &str) -> CompiledQuery {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return CompiledQuery {
            primary: String::new(),
            fallback: None,
        };
    }

    let prefix_tokens: Vec<String> = tokens
        .iter()
        .map(|t| format!("{}*", escape_token(t)))
        .collect();

    let primary = prefix_tokens.join(" AND ");

    let fallback = if tokens.len() > 1 {
        Some(prefix_tokens.join(" OR "))
    } else {
        None
    };

    CompiledQuery { primary, fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_primary() {
        let compiled = compile("");
        assert_eq!(compiled.primary, "");
        assert!(compiled.fallback.is_none());
    }

    #[test]
    fn single_token_has_no_fallback() {
        let compiled = compile("BDSG");
        assert_eq!(compiled.primary, "BDSG*");
        assert!(compiled.fallback.is_none());
    }

    #[test]
    fn multi_token_uses_and_primary_or_fallback() {
        let compiled = compile("data protection");
        assert_eq!(compiled.primary, "data* AND protection*");
        assert_eq!(compiled.fallback.unwrap(), "data* OR protection*");
    }

    #[test]
    fn reserved_characters_are_quoted() {
        let compiled = compile("foo(bar) baz");
        assert!(compiled.primary.contains("\"foo(bar)\""));
    }

    #[test]
    fn output_never_has_unmatched_quote() {
        let compiled = compile("weird \"quoted\" text");
        let count = compiled.primary.chars().filter(|c| *c == '"').count();
        assert_eq!(count % 2, 0);
    }

    #[test]
    fn is_deterministic() {
        let a = compile("data protection law");
        let b = compile("data protection law");
        assert_eq!(a, b);
    }
}
