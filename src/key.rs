//! Cache key derivation and URL template expansion.
//!
//! Cache entries are addressed by an ordered sequence of identifiers. The
//! derived key is injective over the identifiers' count, order and string
//! forms: `[1,2]`, `[2,1]` and `[1,2,3]` are all distinct keys.

use std::fmt;

/// A single identifying value: an opaque scalar addressing one cache entry
/// and filling one positional slot of a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Textual identifier (names, tokens, the `!` self alias).
    Str(String),
    /// Numeric identifier (database ids).
    Int(i64),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Str(s) => f.write_str(s),
            Identifier::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Str(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Str(value)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Int(value)
    }
}

impl From<i32> for Identifier {
    fn from(value: i32) -> Self {
        Identifier::Int(value.into())
    }
}

impl From<u32> for Identifier {
    fn from(value: u32) -> Self {
        Identifier::Int(value.into())
    }
}

/// Derive the cache key for an identifier sequence: `[id1,id2,...]`.
pub fn cache_key(identifiers: &[Identifier]) -> String {
    let joined = identifiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("[{joined}]")
}

/// Expand positional `{0}`, `{1}`, ... placeholders in a URL template.
///
/// Identifiers are substituted by position in a single pass; a placeholder
/// with no corresponding identifier is left literally in the output, as is
/// anything brace-like that does not parse as an index.
pub fn expand_template(template: &str, identifiers: &[Identifier]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        match tail.find('}') {
            Some(close) => {
                let placeholder = &tail[1..close];
                match placeholder.parse::<usize>() {
                    Ok(index) if index < identifiers.len() => {
                        out.push_str(&identifiers[index].to_string());
                    }
                    _ => out.push_str(&tail[..=close]),
                }
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
