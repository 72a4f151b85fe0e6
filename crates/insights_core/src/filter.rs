//! Filter composition for patent lookups.
//!
//! Callers describe what they want with a [`FilterSpec`]; [`build`] turns it
//! into a [`PatentQuery`] that the store executes. All pattern escaping happens
//! here, so the store only ever sees literal-safe patterns.

use serde::{Deserialize, Serialize};

/// Hard cap on rows returned by a lookup.
pub const MAX_QUERY_ROWS: u64 = 50;

/// Escape character declared on every generated pattern match.
pub const LIKE_ESCAPE: char = '\\';

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub year: Option<i32>,
    pub assignee: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// `publication_year = year`
    YearEquals(i32),
    /// Case-insensitive match of `assignee` against an escaped pattern that
    /// already carries its surrounding wildcards.
    AssigneeContains { pattern: String },
}

/// A composed, not yet executed lookup. Predicates are AND-ed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatentQuery {
    predicates: Vec<Predicate>,
    limit: u64,
}

impl PatentQuery {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

pub fn build(filter: &FilterSpec) -> PatentQuery {
    let mut predicates = Vec::new();
    if let Some(year) = filter.year {
        predicates.push(Predicate::YearEquals(year));
    }
    if let Some(assignee) = &filter.assignee {
        predicates.push(Predicate::AssigneeContains {
            pattern: format!("%{}%", escape_like(assignee)),
        });
    }
    PatentQuery {
        predicates,
        limit: MAX_QUERY_ROWS,
    }
}

/// Neutralize `%`, `_` and the escape character itself so user text matches
/// literally inside a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_') || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_only_caps_rows() {
        let query = build(&FilterSpec::default());
        assert!(query.predicates().is_empty());
        assert_eq!(query.limit(), MAX_QUERY_ROWS);
    }

    #[test]
    fn year_and_assignee_compose_in_order() {
        let query = build(&FilterSpec {
            year: Some(2020),
            assignee: Some("acme".to_string()),
        });
        assert_eq!(
            query.predicates(),
            &[
                Predicate::YearEquals(2020),
                Predicate::AssigneeContains {
                    pattern: "%acme%".to_string()
                },
            ]
        );
        assert_eq!(query.limit(), 50);
    }

    #[test]
    fn wildcards_in_assignee_are_escaped() {
        let query = build(&FilterSpec {
            year: None,
            assignee: Some("%acme_".to_string()),
        });
        assert_eq!(
            query.predicates(),
            &[Predicate::AssigneeContains {
                pattern: r"%\%acme\_%".to_string()
            }]
        );
    }

    #[test]
    fn escape_character_is_doubled() {
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain text"), "plain text");
        assert_eq!(escape_like("100%_"), r"100\%\_");
    }

    #[test]
    fn quotes_are_left_to_parameter_binding() {
        assert_eq!(escape_like("O'Brien"), "O'Brien");
    }
}
