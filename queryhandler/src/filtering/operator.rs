use sea_orm::sea_query::{BinOper, ColumnType, Expr, LikeExpr, SimpleExpr};

use super::value::coerce;

/// Comparison operators, written as the last `__` segment of a filter key.
///
/// A key without an operator segment compares with [`Operator::Eq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `col = value`
    Eq,
    /// `col IN (a, b, ...)`
    In,
    /// `col NOT IN (a, b, ...)`
    Exclude,
    /// `col LIKE '%value%'`
    Contains,
    /// `col LIKE 'value%'`
    StartsWith,
    /// `col LIKE '%value'`
    EndsWith,
    /// `col SOUNDS LIKE 'value'` (`MySQL`)
    Soundex,
    /// `col >= value`
    Gte,
    /// `col > value`
    Gt,
    /// `col <= value`
    Lte,
    /// `col < value`
    Lt,
}

impl Operator {
    /// Parse an operator token. `eq` is implicit and never written in a key.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "in" => Some(Self::In),
            "exclude" => Some(Self::Exclude),
            "contains" => Some(Self::Contains),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "soundex" => Some(Self::Soundex),
            "gte" => Some(Self::Gte),
            "gt" => Some(Self::Gt),
            "lte" => Some(Self::Lte),
            "lt" => Some(Self::Lt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::In => "in",
            Self::Exclude => "exclude",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Soundex => "soundex",
            Self::Gte => "gte",
            Self::Gt => "gt",
            Self::Lte => "lte",
            Self::Lt => "lt",
        }
    }

    /// Build the predicate `column <op> raw`.
    ///
    /// Scalar values are coerced to `column_type` where they parse; list
    /// operators split `raw` with [`split_list`]. Pattern operators escape
    /// `%` and `_` in the user value.
    #[must_use]
    pub fn predicate(self, column: Expr, column_type: &ColumnType, raw: &str) -> SimpleExpr {
        match self {
            Self::Eq => column.eq(coerce(column_type, raw)),
            Self::In => column.is_in(split_list(raw).iter().map(|v| coerce(column_type, v))),
            Self::Exclude => {
                column.is_not_in(split_list(raw).iter().map(|v| coerce(column_type, v)))
            }
            Self::Contains => column.like(like_pattern("%", raw, "%")),
            Self::StartsWith => column.like(like_pattern("", raw, "%")),
            Self::EndsWith => column.like(like_pattern("%", raw, "")),
            Self::Soundex => column.binary(BinOper::Custom("SOUNDS LIKE"), raw.to_owned()),
            Self::Gte => column.gte(coerce(column_type, raw)),
            Self::Gt => column.gt(coerce(column_type, raw)),
            Self::Lte => column.lte(coerce(column_type, raw)),
            Self::Lt => column.lt(coerce(column_type, raw)),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a comma separated list and percent-decode every element.
///
/// An empty value is an empty list, so `col__in=` matches nothing.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|part| {
            urlencoding::decode(part).map_or_else(|_| part.to_owned(), std::borrow::Cow::into_owned)
        })
        .collect()
}

/// Escape LIKE wildcards so user input matches literally.
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub(crate) fn like_pattern(prefix: &str, raw: &str, suffix: &str) -> LikeExpr {
    LikeExpr::new(format!("{prefix}{}{suffix}", escape_like_wildcards(raw))).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Alias, MysqlQueryBuilder, Query, SqliteQueryBuilder};

    fn render(expr: SimpleExpr) -> String {
        Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("post"))
            .and_where(expr)
            .to_string(SqliteQueryBuilder)
    }

    fn col() -> Expr {
        Expr::col(Alias::new("views"))
    }

    #[test]
    fn test_parse_known_tokens() {
        for token in [
            "in", "exclude", "contains", "startswith", "endswith", "soundex", "gte", "gt", "lte",
            "lt",
        ] {
            let op = Operator::parse(token).expect("token should parse");
            assert_eq!(op.as_str(), token);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_implicit_eq() {
        assert_eq!(Operator::parse("between"), None);
        assert_eq!(Operator::parse("eq"), None);
        assert_eq!(Operator::parse("IN"), None);
    }

    #[test]
    fn test_split_list() {
        assert!(split_list("").is_empty());
        assert_eq!(split_list("draft"), vec!["draft"]);
        assert_eq!(split_list("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_list("new%20york,paris"), vec!["new york", "paris"]);
        assert_eq!(split_list("a%2Cb"), vec!["a,b"]);
    }

    #[test]
    fn test_wildcard_escaping() {
        assert_eq!(escape_like_wildcards("plain"), "plain");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("snake_case"), "snake\\_case");
        assert_eq!(escape_like_wildcards("\\"), "\\\\");
    }

    #[test]
    fn test_integer_column_binds_integer() {
        let sql = render(Operator::Gte.predicate(col(), &ColumnType::Integer, "80"));
        assert!(sql.ends_with("\"views\" >= 80"), "{sql}");
    }

    #[test]
    fn test_unparseable_value_falls_back_to_text() {
        let sql = render(Operator::Eq.predicate(col(), &ColumnType::Integer, "lots"));
        assert!(sql.ends_with("\"views\" = 'lots'"), "{sql}");
    }

    #[test]
    fn test_in_and_exclude() {
        let sql = render(Operator::In.predicate(col(), &ColumnType::Integer, "1,2,3"));
        assert!(sql.contains("\"views\" IN (1, 2, 3)"), "{sql}");
        let sql = render(Operator::Exclude.predicate(col(), &ColumnType::Text, "a,b"));
        assert!(sql.contains("\"views\" NOT IN ('a', 'b')"), "{sql}");
    }

    #[test]
    fn test_like_patterns() {
        let sql = render(Operator::Contains.predicate(col(), &ColumnType::Text, "rust"));
        assert!(sql.contains("LIKE '%rust%'"), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");
        let sql = render(Operator::StartsWith.predicate(col(), &ColumnType::Text, "ru"));
        assert!(sql.contains("LIKE 'ru%'"), "{sql}");
        let sql = render(Operator::EndsWith.predicate(col(), &ColumnType::Text, "st"));
        assert!(sql.contains("LIKE '%st'"), "{sql}");
    }

    #[test]
    fn test_soundex_uses_sounds_like() {
        let expr = Operator::Soundex.predicate(col(), &ColumnType::Text, "robert");
        let sql = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("author"))
            .and_where(expr)
            .to_string(MysqlQueryBuilder);
        assert!(sql.contains("`views` SOUNDS LIKE 'robert'"), "{sql}");
    }
}
