use sea_orm::sea_query::{Expr, SimpleExpr};

/// Target the composed query is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Executed by the relational store through Sea-ORM.
    #[default]
    Relational,
    /// Rendered to SQL text for a full-text search backend. `contains` on a
    /// base-table column becomes a `MATCH()` keyword query.
    KeywordSearch,
}

impl Dialect {
    #[must_use]
    pub fn is_keyword_search(self) -> bool {
        matches!(self, Self::KeywordSearch)
    }
}

/// Characters with a meaning in the extended match syntax.
const MATCH_SPECIAL: &[char] = &[
    '\\', '(', ')', '|', '-', '!', '@', '~', '"', '&', '/', '^', '$', '=', '<',
];

pub(crate) fn escape_match_text(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if MATCH_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `MATCH('@field text')`, or `MATCH('@(a,b) text')` for several fields, or a
/// whole-document `MATCH('text')` when `fields` is empty.
pub(crate) fn keyword_match(fields: &[&str], text: &str) -> SimpleExpr {
    let text = escape_match_text(text.trim());
    let query = match fields {
        [] => text,
        [field] => format!("@{field} {text}"),
        _ => format!("@({}) {text}", fields.join(",")),
    };
    Expr::cust_with_values("MATCH(?)", [query])
}
