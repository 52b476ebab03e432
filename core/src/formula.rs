//! Filter formulas and query-string encoding.
//!
//! Airtable filters records server-side with its own formula language. Only
//! two shapes are produced here: a substring lookup on the id column, and an
//! equality conjunction over several columns. Neither the id nor the values
//! are escaped inside the formula; a `'` in a value ends the string literal.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is in query values: ASCII alphanumerics plus `-._~`.
/// Space is handled separately and becomes `+`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Form-encode one query value (`application/x-www-form-urlencoded` style).
pub fn encode_query_value(value: &str) -> String {
    // A literal "%20" in the input is encoded as "%2520", so this only
    // touches encoded spaces.
    utf8_percent_encode(value, QUERY_VALUE)
        .to_string()
        .replace("%20", "+")
}

/// Join `(name, value)` pairs into `name=value&...`, encoding each value.
pub fn query_string<S: AsRef<str>>(params: &[(&str, S)]) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{name}={}", encode_query_value(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Formula matching records whose `id_column` contains `id`.
pub fn find_by_id(id: &str, id_column: &str) -> String {
    format!("FIND('{id}', {{{id_column}}}) != 0")
}

/// Formula matching records where every listed column equals its value.
///
/// Columns are taken in key order. Entries whose value is `None` or empty
/// are left out of the formula altogether.
pub fn match_fields(fields: &BTreeMap<String, Option<String>>) -> String {
    let clauses: Vec<String> = fields
        .iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some(format!("{{{key}}}='{v}'")),
            _ => None,
        })
        .collect();
    format!("AND({})", clauses.join(","))
}
