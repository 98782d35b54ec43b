use rusqlite::Statement;
use rusqlite::types::Value;

use crate::command::Parameter;
use crate::error::SqlCurryError;
use crate::types::{RowValues, SqlType};

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

fn parameter_value(param: &Parameter) -> Value {
    let value = param.bound_value();
    match (param.sql_type, &value) {
        (Some(SqlType::Bit), RowValues::Bool(b)) => Value::Integer(i64::from(*b)),
        _ => row_value_to_sqlite_value(&value),
    }
}

/// Find the statement index for a parameter name. Names written without a prefix also
/// match `@name`, `:name` and `$name`.
fn parameter_index(
    stmt: &Statement<'_>,
    name: &str,
) -> Result<Option<usize>, SqlCurryError> {
    if let Some(idx) = stmt.parameter_index(name)? {
        return Ok(Some(idx));
    }
    if name.starts_with(['@', ':', '$']) {
        return Ok(None);
    }
    for prefix in ['@', ':', '$'] {
        if let Some(idx) = stmt.parameter_index(&format!("{prefix}{name}"))? {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

/// Bind every parameter in order.
///
/// Unnamed parameters bind to their position (1-based). Binding the same name twice
/// leaves the later value in place.
///
/// # Errors
/// Returns [`SqlCurryError::ParameterError`] when a named parameter matches no placeholder,
/// or when a placeholder is left without a value. Returns the rusqlite error raised by
/// binding.
pub fn bind_parameters(stmt: &mut Statement<'_>, params: &[Parameter]) -> Result<(), SqlCurryError> {
    let placeholders = stmt.parameter_count();
    let mut bound = vec![false; placeholders];
    for (position, param) in params.iter().enumerate() {
        let idx = if param.name.is_empty() {
            position + 1
        } else {
            parameter_index(stmt, &param.name)?.ok_or_else(|| {
                SqlCurryError::ParameterError(format!(
                    "parameter `{}` is not referenced by the statement",
                    param.name
                ))
            })?
        };
        if idx > placeholders {
            return Err(SqlCurryError::ParameterError(format!(
                "parameter {idx} is out of range: the statement has {placeholders} placeholder(s)"
            )));
        }
        stmt.raw_bind_parameter(idx, parameter_value(param))?;
        bound[idx - 1] = true;
    }

    let missing: Vec<String> = bound
        .iter()
        .enumerate()
        .filter(|(_, is_bound)| !**is_bound)
        .map(|(i, _)| {
            stmt.parameter_name(i + 1)
                .map_or_else(|| format!("?{}", i + 1), str::to_string)
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SqlCurryError::ParameterError(format!(
            "no value supplied for {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::sqlite::sqlite_extract_value_sync;

    fn bind(sql: &str, params: &[Parameter]) -> Result<Option<RowValues>, SqlCurryError> {
        let conn = Connection::open_in_memory()?;
        let mut stmt = conn.prepare(sql)?;
        bind_parameters(&mut stmt, params)?;
        let mut rows = stmt.raw_query();
        match rows.next()? {
            Some(row) => Ok(Some(sqlite_extract_value_sync(row, 0)?)),
            None => Ok(None),
        }
    }

    #[test]
    fn bare_names_match_any_prefix() {
        let value = bind("SELECT :who", &[Parameter::new("who", "ann")]).unwrap();
        assert_eq!(value, Some(RowValues::Text("ann".into())));
    }

    #[test]
    fn misspelled_name_is_rejected() {
        let err = bind("SELECT @name", &[Parameter::new("@nmae", "ann")]).unwrap_err();
        assert!(matches!(err, SqlCurryError::ParameterError(msg) if msg.contains("@nmae")));
    }

    #[test]
    fn explicit_prefix_must_match_exactly() {
        let err = bind("SELECT @name", &[Parameter::new(":name", "ann")]).unwrap_err();
        assert!(matches!(err, SqlCurryError::ParameterError(_)));
    }

    #[test]
    fn unbound_placeholder_is_rejected() {
        let err = bind("SELECT @a, @b", &[Parameter::new("@a", 1)]).unwrap_err();
        assert!(matches!(err, SqlCurryError::ParameterError(msg) if msg.contains("@b")));
    }

    #[test]
    fn extra_positional_value_is_rejected() {
        let params = [Parameter::new("", 1), Parameter::new("", 2)];
        let err = bind("SELECT ?1", &params).unwrap_err();
        assert!(matches!(err, SqlCurryError::ParameterError(_)));
    }

    #[test]
    fn repeated_placeholder_binds_once() {
        let value = bind("SELECT @a + @a", &[Parameter::new("@a", 2)]).unwrap();
        assert_eq!(value, Some(RowValues::Int(4)));
    }
}
