//! Response envelope handling
//!
//! Every data endpoint wraps its records in a JSON object whose `Data` key
//! holds the record array. A missing `Data` key means the window had nothing
//! to report and yields an empty batch; any other shape is malformed and
//! fatal.

use crate::fetcher::{FetchError, FetchResult};
use crate::Record;
use serde_json::Value;

/// Key under which the API nests the record array.
const RECORDS_KEY: &str = "Data";

/// Extract the records from a response body.
pub fn extract_records(body: Value) -> FetchResult<Vec<Record>> {
    let mut object = match body {
        Value::Object(object) => object,
        other => {
            return Err(FetchError::Envelope(format!(
                "expected JSON object body, got {}",
                json_kind(&other)
            )))
        }
    };

    let data = match object.remove(RECORDS_KEY) {
        // Absent records array: an empty window, not an error.
        None => return Ok(Vec::new()),
        Some(data) => data,
    };

    let items = match data {
        Value::Array(items) => items,
        other => {
            return Err(FetchError::Envelope(format!(
                "expected '{RECORDS_KEY}' to be an array, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(fields) => Ok(Record(fields)),
            other => Err(FetchError::Envelope(format!(
                "expected record object in '{RECORDS_KEY}', got {}",
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
