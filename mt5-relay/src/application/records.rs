use serde::Serialize;
use serde_json::Value;

use super::errors::DispatchError;

/// Flatten one terminal record into a field-name keyed mapping
pub fn to_record<T: Serialize>(record: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(record)
        .map_err(|e| DispatchError::Internal(format!("failed to serialize record: {}", e)))
}

/// Flatten a record sequence, preserving source order. An empty sequence
/// stays an empty list.
pub fn to_records<T: Serialize>(records: &[T]) -> Result<Value, DispatchError> {
    records
        .iter()
        .map(to_record)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
