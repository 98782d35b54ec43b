//! JSON rendering of results for callers that forward them to a front end.

use serde::Serialize;
use tracing::error;

/// Serialize `value` to a JSON string.
///
/// A value that cannot be represented is reported through `tracing` and yields `None`
/// instead of an error.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(err) => {
            error!(error = %err, "could not convert value to JSON");
            None
        }
    }
}

/// Like [`to_json`], but `None` in gives `None` out, the way an absent row or result does.
pub fn optional_to_json<T: Serialize>(value: Option<&T>) -> Option<String> {
    value.and_then(to_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Record;
    use crate::types::RowValues;

    #[test]
    fn non_finite_floats_convert_to_null_json() {
        let record: Record = [("x", RowValues::Float(f64::NAN))].into_iter().collect();
        assert_eq!(to_json(&record).as_deref(), Some(r#"{"x":null}"#));
    }

    #[test]
    fn unrepresentable_values_yield_none() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert_eq!(to_json(&map), None);
    }

    #[test]
    fn absent_rows_stay_absent() {
        assert_eq!(optional_to_json::<Vec<Record>>(None), None);
        let rows: Vec<Record> = vec![[("a", RowValues::Int(1))].into_iter().collect()];
        assert_eq!(optional_to_json(Some(&rows)).as_deref(), Some(r#"[{"a":1}]"#));
    }
}
