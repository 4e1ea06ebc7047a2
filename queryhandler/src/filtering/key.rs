//! Filter-key splitting and column lookup shared by every filter shape.

use std::str::FromStr;

use sea_orm::{
    ColumnTrait, EntityTrait,
    sea_query::{Alias, ColumnType, Expr},
};

use super::Operator;
use crate::errors::FilterError;

/// Separates relation, column and operator segments: `owner__email__contains`.
pub const KEY_SEPARATOR: &str = "__";

/// Separates alternative columns of an OR filter: `title_or_status`.
pub const OR_SEPARATOR: &str = "_or_";

#[must_use]
pub fn segments(key: &str) -> Vec<&str> {
    key.split(KEY_SEPARATOR).collect()
}

/// `column[__operator]` for filters on the base table. Unknown operators and
/// extra segments are errors.
pub(crate) fn parse_column_key(key: &str) -> Result<(String, Operator), FilterError> {
    match segments(key).as_slice() {
        [column] => Ok(((*column).to_owned(), Operator::Eq)),
        [column, token] => Operator::parse(token)
            .map(|op| ((*column).to_owned(), op))
            .ok_or_else(|| FilterError::UnknownOperator {
                key: key.to_owned(),
                operator: (*token).to_owned(),
            }),
        _ => Err(FilterError::MalformedKey {
            key: key.to_owned(),
        }),
    }
}

/// Operator at `index` for join filters, which compare with equality when the
/// segment is missing or not an operator.
pub(crate) fn lenient_operator(segments: &[&str], index: usize, len: usize) -> Operator {
    if segments.len() == len {
        segments
            .get(index)
            .and_then(|token| Operator::parse(token))
            .unwrap_or(Operator::Eq)
    } else {
        Operator::Eq
    }
}

/// Name of the table alias a join filter uses: `{table}_{filter_key}`, then
/// `{table}_{filter_key}_{occurrence}` for later filters repeating the key.
#[must_use]
pub fn join_alias(table: &str, key: &str, occurrence: usize) -> String {
    if occurrence == 0 {
        format!("{table}_{key}")
    } else {
        format!("{table}_{key}_{occurrence}")
    }
}

pub(crate) fn table_name<T: EntityTrait>() -> String {
    T::default().table_name().to_owned()
}

pub(crate) fn resolve_column<T: EntityTrait>(name: &str) -> Result<T::Column, FilterError> {
    T::Column::from_str(name).map_err(|_| FilterError::UnknownColumn {
        table: table_name::<T>(),
        column: name.to_owned(),
    })
}

/// Column of the base table, qualified with the table name.
pub(crate) fn base_column<T: EntityTrait>(name: &str) -> Result<(Expr, ColumnType), FilterError> {
    let column = resolve_column::<T>(name)?;
    let column_type = column.def().get_column_type().clone();
    Ok((Expr::col(column.as_column_ref()), column_type))
}

/// Column of `T` reached through a join alias.
pub(crate) fn aliased_column<T: EntityTrait>(
    alias: &str,
    name: &str,
) -> Result<(Expr, ColumnType), FilterError> {
    let column = resolve_column::<T>(name)?;
    let column_type = column.def().get_column_type().clone();
    Ok((Expr::col((Alias::new(alias), column)), column_type))
}
