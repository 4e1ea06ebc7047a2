use axum::{
    Json,
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::IntoParams;

use crate::{errors::QueryError, handler::MAX_ROWS};

/// Query parameters shaping a listing. Every other parameter is a filter.
///
/// ```text
/// GET /posts?fields=title,status&order_by=views&order_dir=desc&limit=10&status=published
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryOptions {
    /// Comma separated fields to return. Defaults to every field.
    #[param(example = "title,status")]
    pub fields: Option<String>,
    /// Comma separated related objects to nest into each record.
    #[param(example = "owner,tags")]
    pub hydrates: Option<String>,
    /// Field to sort by. Defaults to `id`.
    #[param(example = "views")]
    pub order_by: Option<String>,
    /// `asc` or `desc`. Defaults to `asc`.
    #[param(example = "desc")]
    pub order_dir: Option<String>,
    /// Number of records to skip.
    #[param(example = 0)]
    pub offset: Option<u64>,
    /// Maximum number of records to return. Defaults to 30.
    #[param(example = 30)]
    pub limit: Option<u64>,
    /// Group records into `{value: [records]}` by this field.
    #[param(example = "status")]
    pub response_key: Option<String>,
}

impl QueryOptions {
    /// Names of the parameters that shape the listing rather than filter it.
    pub const RESERVED: [&'static str; 7] = [
        "fields",
        "hydrates",
        "order_by",
        "order_dir",
        "offset",
        "limit",
        "response_key",
    ];

    /// Split raw query-string pairs into options and filter pairs.
    ///
    /// Empty option values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns a bad request when `offset` or `limit` is not a number or is
    /// above [`MAX_ROWS`].
    pub fn from_pairs<I>(pairs: I) -> Result<(Self, Vec<(String, String)>), QueryError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut options = Self::default();
        let mut filters = Vec::new();
        for (key, value) in pairs {
            if !Self::RESERVED.contains(&key.as_str()) {
                filters.push((key, value));
                continue;
            }
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "fields" => options.fields = Some(value),
                "hydrates" => options.hydrates = Some(value),
                "order_by" => options.order_by = Some(value),
                "order_dir" => options.order_dir = Some(value),
                "offset" => options.offset = Some(parse_number(&key, &value)?),
                "limit" => options.limit = Some(parse_number(&key, &value)?),
                _ => options.response_key = Some(value),
            }
        }
        Ok((options, filters))
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, QueryError> {
    let number: u64 = value
        .parse()
        .map_err(|_| QueryError::bad_request(format!("'{key}' must be a non-negative integer")))?;
    if number > MAX_ROWS {
        return Err(QueryError::bad_request(format!(
            "'{key}' must be at most {MAX_ROWS}"
        )));
    }
    Ok(number)
}

/// Records of a listing, either flat or grouped by a response key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Records {
    List(Vec<JsonValue>),
    /// Keyed by the record's response-key value, in first-seen order.
    Grouped(IndexMap<String, Vec<JsonValue>>),
}

impl Records {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(records) => records.len(),
            Self::Grouped(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group `records` by the value of `key`; records without it share the
    /// `null` group.
    #[must_use]
    pub fn group_by(records: Vec<JsonValue>, key: &str) -> Self {
        let mut groups: IndexMap<String, Vec<JsonValue>> = IndexMap::new();
        for record in records {
            let group = match record.get(key) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => JsonValue::Null.to_string(),
            };
            groups.entry(group).or_default().push(record);
        }
        Self::Grouped(groups)
    }

    /// First record of a flat list.
    #[must_use]
    pub fn into_first(self) -> Option<JsonValue> {
        match self {
            Self::List(records) => records.into_iter().next(),
            Self::Grouped(groups) => groups.into_values().flatten().next(),
        }
    }
}

/// What a listing endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// A lookup by primary key: the record itself.
    Single(JsonValue),
    Page { total_count: u64, records: Records },
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
