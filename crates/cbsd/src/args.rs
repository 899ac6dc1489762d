//! Marshaling of creation configurations into `name=value` CLI tokens.
//!
//! `cbsd` subcommands take their options as `key=value` words rather than
//! flags. Each creation configuration lists its fields, in declaration
//! order, into an [`ArgList`]; unset fields are skipped so the tool falls
//! back to its own defaults.

/// Characters that never need quoting on a shell command line.
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Shell-quote a single value.
///
/// Values made entirely of safe characters pass through verbatim; anything
/// else is wrapped in single quotes with embedded single quotes escaped as
/// `'"'"'`. The empty string becomes `''`.
pub fn quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(is_safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}

/// Conversion of a creation configuration into ordered CLI tokens.
///
/// Implementations push their fields into an [`ArgList`] in declaration
/// order, which keeps the produced command line deterministic.
pub trait ToArgs {
    /// Marshal the set fields into `tag=value` tokens.
    fn to_args(&self) -> Vec<String>;
}

/// Ordered accumulator for `tag=value` tokens.
#[derive(Debug, Default)]
pub struct ArgList {
    args: Vec<String>,
}

impl ArgList {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Append `tag=value` with shell quoting. Empty values are skipped,
    /// leaving the choice to the tool.
    pub fn string(&mut self, tag: &str, value: &str) {
        if !value.is_empty() {
            self.args.push(format!("{}={}", tag, quote(value)));
        }
    }

    /// Append `tag=1` or `tag=0` for a tri-state flag. `None` is skipped.
    pub fn flag(&mut self, tag: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.args.push(format!("{}={}", tag, u8::from(v)));
        }
    }

    /// Consume the accumulator, yielding the tokens in insertion order.
    pub fn into_vec(self) -> Vec<String> {
        self.args
    }
}
