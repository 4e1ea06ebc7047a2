//! The two answer shapes of the search backend, flattened into records.
//!
//! Raw SQL mode returns one result set per statement:
//!
//! ```json
//! [{"columns": [{"id": {"type": "long long"}}], "data": [{"id": 1}], "total": 1, "error": ""}]
//! ```
//!
//! The JSON search API wraps documents in a hits envelope:
//!
//! ```json
//! {"hits": {"total": 1, "hits": [{"_id": 1, "_score": 1, "_source": {"title": "x"}}]}}
//! ```

use serde_json::{Map, Value as JsonValue};

use super::error::{SearchError, SearchResult};

/// Turn any known response body into a list of records.
///
/// # Errors
///
/// [`SearchError::Backend`] when the body reports an error,
/// [`SearchError::InvalidResponse`] when it has neither shape.
pub fn normalize(body: JsonValue) -> SearchResult<Vec<JsonValue>> {
    match body {
        JsonValue::Array(result_sets) => {
            let mut records = Vec::new();
            for result_set in result_sets {
                records.extend(result_set_records(result_set)?);
            }
            Ok(records)
        }
        JsonValue::Object(mut envelope) => {
            if let Some(message) = error_message(envelope.get("error")) {
                return Err(SearchError::Backend { message });
            }
            if let Some(hits) = envelope.remove("hits") {
                return hit_records(hits);
            }
            if envelope.contains_key("data") {
                return result_set_records(JsonValue::Object(envelope));
            }
            Err(invalid("expected a result set or a hits envelope"))
        }
        other => Err(invalid(&format!("unexpected body: {other}"))),
    }
}

/// Read a `COUNT(...)` answer: the `count` column of the first record, or its
/// only value.
///
/// # Errors
///
/// [`SearchError::InvalidResponse`] when no count is present.
pub fn count_from(records: &[JsonValue]) -> SearchResult<u64> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let value = match first {
        JsonValue::Object(fields) => fields
            .get("count")
            .or_else(|| (fields.len() == 1).then(|| fields.values().next()).flatten()),
        other => Some(other),
    };
    value
        .and_then(as_count)
        .ok_or_else(|| invalid("count query returned no count"))
}

fn as_count(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn invalid(message: &str) -> SearchError {
    SearchError::InvalidResponse {
        message: message.to_string(),
    }
}

fn error_message(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Null | JsonValue::String(_) => None,
        JsonValue::Object(obj) => Some(
            obj.get("reason")
                .or_else(|| obj.get("type"))
                .and_then(JsonValue::as_str)
                .map_or_else(|| JsonValue::Object(obj.clone()).to_string(), str::to_owned),
        ),
        other => Some(other.to_string()),
    }
}

fn column_names(columns: Option<&JsonValue>) -> Vec<String> {
    columns
        .and_then(JsonValue::as_array)
        .map(|columns| {
            columns
                .iter()
                .filter_map(|column| match column {
                    JsonValue::Object(obj) => obj.keys().next().cloned(),
                    JsonValue::String(name) => Some(name.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn result_set_records(result_set: JsonValue) -> SearchResult<Vec<JsonValue>> {
    let JsonValue::Object(mut result_set) = result_set else {
        return Err(invalid("result set is not an object"));
    };
    if let Some(message) = error_message(result_set.get("error")) {
        return Err(SearchError::Backend { message });
    }
    let names = column_names(result_set.get("columns"));
    let rows = match result_set.remove("data") {
        Some(JsonValue::Array(rows)) => rows,
        Some(JsonValue::Null) | None => Vec::new(),
        Some(_) => return Err(invalid("result set data is not a list")),
    };
    Ok(rows
        .into_iter()
        .map(|row| match row {
            // positional rows are zipped with the column list
            JsonValue::Array(values) => JsonValue::Object(
                names.iter().cloned().zip(values).collect::<Map<_, _>>(),
            ),
            row => row,
        })
        .collect())
}

fn hit_records(hits: JsonValue) -> SearchResult<Vec<JsonValue>> {
    let hits = match hits {
        JsonValue::Object(mut obj) => obj.remove("hits").unwrap_or(JsonValue::Array(Vec::new())),
        other => other,
    };
    let JsonValue::Array(hits) = hits else {
        return Err(invalid("hits is not a list"));
    };
    Ok(hits
        .into_iter()
        .map(|hit| {
            let JsonValue::Object(mut hit) = hit else {
                return hit;
            };
            let mut record = match hit.remove("_source") {
                Some(JsonValue::Object(source)) => source,
                _ => Map::new(),
            };
            if let Some(id) = hit.remove("_id") {
                record.entry("id").or_insert(id);
            }
            JsonValue::Object(record)
        })
        .collect())
}
