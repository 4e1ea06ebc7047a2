use sea_orm::{Value, sea_query::ColumnType};
use uuid::Uuid;

/// Coerce a raw query-string value to the SQL type of the column it is
/// compared with. Anything that does not parse is bound as text and left to
/// the database.
pub(crate) fn coerce(column_type: &ColumnType, raw: &str) -> Value {
    let trimmed = raw.trim();
    match column_type {
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned
        | ColumnType::Unsigned
        | ColumnType::BigUnsigned => trimmed
            .parse::<i64>()
            .map_or_else(|_| text(raw), Value::from),
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => trimmed
            .parse::<f64>()
            .map_or_else(|_| text(raw), Value::from),
        ColumnType::Boolean => parse_bool(trimmed).map_or_else(|| text(raw), Value::from),
        ColumnType::Uuid => Uuid::parse_str(trimmed).map_or_else(|_| text(raw), Value::from),
        _ => text(raw),
    }
}

fn text(raw: &str) -> Value {
    Value::from(raw.to_owned())
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") || raw == "1" {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
        Some(false)
    } else {
        None
    }
}
