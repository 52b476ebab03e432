//! Evaluation of the filter formulas the client sends.
//!
//! Only two shapes are understood:
//! - `FIND('<needle>', {<column>}) != 0` — the column's text contains needle
//! - `AND({<col>}='<value>',...)` — every listed column equals its value
//!
//! Anything else is rejected so tests notice when the client starts
//! emitting something new.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Contains { column: String, needle: String },
    AllEqual(Vec<(String, String)>),
}

impl Filter {
    pub fn parse(formula: &str) -> Result<Self, String> {
        let mut p = Cursor {
            rest: formula.trim(),
        };
        if p.eat("FIND('") {
            let needle = p.until('\'')?;
            p.expect(", {")?;
            let column = p.until('}')?;
            p.expect(") != 0")?;
            p.finish()?;
            return Ok(Filter::Contains { column, needle });
        }
        if p.eat("AND(") {
            let mut clauses = Vec::new();
            while !p.eat(")") {
                if !clauses.is_empty() {
                    p.expect(",")?;
                }
                p.expect("{")?;
                let column = p.until('}')?;
                p.expect("='")?;
                let value = p.until('\'')?;
                clauses.push((column, value));
            }
            p.finish()?;
            return Ok(Filter::AllEqual(clauses));
        }
        Err(format!("unsupported formula: {formula}"))
    }

    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        let text = |column: &str| fields.get(column).map(cell_text).unwrap_or_default();
        match self {
            Filter::Contains { column, needle } => text(column).contains(needle.as_str()),
            Filter::AllEqual(clauses) => clauses.iter().all(|(column, value)| text(column) == *value),
        }
    }
}

/// How a cell reads when treated as text by a formula or `cellFormat=string`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    fn eat(&mut self, literal: &str) -> bool {
        match self.rest.strip_prefix(literal) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, literal: &str) -> Result<(), String> {
        if self.eat(literal) {
            Ok(())
        } else {
            Err(format!("expected `{literal}` at `{}`", self.rest))
        }
    }

    /// Text up to `end`, consuming the delimiter.
    fn until(&mut self, end: char) -> Result<String, String> {
        let idx = self
            .rest
            .find(end)
            .ok_or_else(|| format!("unterminated, expected `{end}`"))?;
        let taken = self.rest[..idx].to_string();
        self.rest = &self.rest[idx + end.len_utf8()..];
        Ok(taken)
    }

    fn finish(&self) -> Result<(), String> {
        if self.rest.trim().is_empty() {
            Ok(())
        } else {
            Err(format!("trailing input `{}`", self.rest))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn parses_find() {
        let filter = Filter::parse("FIND('id123', {Identifier}) != 0").unwrap();
        assert_eq!(
            filter,
            Filter::Contains {
                column: "Identifier".to_string(),
                needle: "id123".to_string()
            }
        );
        assert!(filter.matches(&fields(json!({"Identifier": "xid1234"}))));
        assert!(!filter.matches(&fields(json!({"Identifier": "id12"}))));
        assert!(!filter.matches(&fields(json!({}))));
    }

    #[test]
    fn parses_and_with_special_characters() {
        let filter = Filter::parse(
            "AND({Coverage [Web: Link]}='http://www.baayaga.narod.ru',{Subject [ISO Code]}='sah')",
        )
        .unwrap();
        assert_eq!(
            filter,
            Filter::AllEqual(vec![
                ("Coverage [Web: Link]".to_string(), "http://www.baayaga.narod.ru".to_string()),
                ("Subject [ISO Code]".to_string(), "sah".to_string()),
            ])
        );
        assert!(filter.matches(&fields(json!({
            "Subject [ISO Code]": "sah",
            "Coverage [Web: Link]": "http://www.baayaga.narod.ru",
            "Other": 1
        }))));
        assert!(!filter.matches(&fields(json!({"Subject [ISO Code]": "sah"}))));
    }

    #[test]
    fn empty_and_matches_everything() {
        let filter = Filter::parse("AND()").unwrap();
        assert!(filter.matches(&fields(json!({}))));
    }

    #[test]
    fn non_string_cells_compare_as_text() {
        let filter = Filter::parse("AND({Count}='3')").unwrap();
        assert!(filter.matches(&fields(json!({"Count": 3}))));
    }

    #[test]
    fn rejects_unknown_formulas() {
        for formula in [
            "OR({a}='1')",
            "AND({a}='1'",
            "AND({a}='1')x",
            "FIND('x', {a}) > 0",
            "AND({a}='1'{b}='2')",
        ] {
            assert!(Filter::parse(formula).is_err(), "{formula}");
        }
    }

    #[test]
    fn cell_text_joins_arrays() {
        assert_eq!(cell_text(&json!(["a", "b"])), "a, b");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(null)), "");
    }
}
