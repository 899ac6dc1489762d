//! Scraping of `cbsd`'s semi-structured text output.
//!
//! Listings come back one resource per line with whitespace-separated
//! columns; action subcommands print freeform status text in which logical
//! failures only show up as a sentinel substring, never as an exit code.

/// Marker `cbsd` prints when an action targets a domain that does not exist.
pub(crate) const NO_SUCH_DOMAIN: &str = "No such domain";

/// Lines of a listing that can hold data. Headers, blank lines, and other
/// noise come through as lines of length <= 2 and are dropped.
pub(crate) fn data_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|line| line.len() > 2)
}

/// Positional column access; a missing column reads as empty.
pub(crate) fn field<'a>(fields: &[&'a str], idx: usize) -> &'a str {
    fields.get(idx).copied().unwrap_or_default()
}

/// Numeric columns parse leniently: anything missing or malformed becomes 0.
/// The tool's output is loosely structured and a bad cell should not fail
/// the whole listing.
pub(crate) fn numeric(fields: &[&str], idx: usize) -> u32 {
    field(fields, idx).parse().unwrap_or_default()
}

/// Whether action output reports a missing domain anywhere in its text.
pub(crate) fn contains_sentinel(output: &str) -> bool {
    output.contains(NO_SUCH_DOMAIN)
}

/// First line carrying the sentinel marker, for errors that should quote
/// only the offending line rather than the full output.
pub(crate) fn sentinel_line(output: &str) -> Option<&str> {
    output.lines().find(|line| line.contains(NO_SUCH_DOMAIN))
}
