use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use tiberius::numeric::Numeric;
use tiberius::{Query, QueryItem, QueryStream, Uuid};
use tracing::debug;

use crate::command::{CommandSpec, Parameter};
use crate::error::SqlCurryError;
use crate::types::{CommandKind, RowValues, SqlType};

/// Parameter name as T-SQL expects it: `@`-prefixed, or `@P<n>` when unnamed.
fn declared_name(param: &Parameter, position: usize) -> String {
    if param.name.is_empty() {
        format!("@P{}", position + 1)
    } else if param.name.starts_with('@') {
        param.name.clone()
    } else {
        format!("@{}", param.name)
    }
}

fn quote_unicode_literal(text: &str) -> String {
    format!("N'{}'", text.replace('\'', "''"))
}

/// Build the T-SQL batch for a command.
///
/// tiberius binds positionally as `@P1..@Pn`. Text commands keep their own parameter
/// names by running inside `sp_executesql` with a generated declaration list; stored
/// procedures are called with `@name = @Pn` arguments. Both follow bind order.
#[must_use]
pub fn command_text(spec: &CommandSpec) -> String {
    match spec.kind {
        CommandKind::Text if spec.params.is_empty() => spec.text.clone(),
        CommandKind::Text => {
            let declarations: Vec<String> = spec
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    format!(
                        "{} {}",
                        declared_name(p, i),
                        p.effective_type().declaration(p.size)
                    )
                })
                .collect();
            let assignments: Vec<String> = spec
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{} = @P{}", declared_name(p, i), i + 1))
                .collect();
            format!(
                "EXEC sp_executesql {}, {}, {}",
                quote_unicode_literal(&spec.text),
                quote_unicode_literal(&declarations.join(", ")),
                assignments.join(", ")
            )
        }
        CommandKind::StoredProcedure => {
            let arguments: Vec<String> = spec
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    if p.name.is_empty() {
                        format!("@P{}", i + 1)
                    } else {
                        format!("{} = @P{}", declared_name(p, i), i + 1)
                    }
                })
                .collect();
            if arguments.is_empty() {
                format!("EXEC {}", spec.text)
            } else {
                format!("EXEC {} {}", spec.text, arguments.join(", "))
            }
        }
    }
}

fn bind_null(query: &mut Query<'_>, sql_type: SqlType) {
    match sql_type {
        SqlType::Bit => query.bind(Option::<bool>::None),
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt => {
            query.bind(Option::<i64>::None);
        }
        SqlType::Float | SqlType::Real | SqlType::Decimal => query.bind(Option::<f64>::None),
        SqlType::Date | SqlType::DateTime | SqlType::DateTime2 => {
            query.bind(Option::<NaiveDateTime>::None);
        }
        SqlType::Binary | SqlType::VarBinary => query.bind(Option::<Vec<u8>>::None),
        _ => query.bind(Option::<String>::None),
    }
}

/// Bind parameters directly to the query, in order.
#[must_use]
pub fn bind_query_params<'a>(text: &'a str, params: &[Parameter]) -> Query<'a> {
    let mut query = Query::new(text);
    for param in params {
        match param.bound_value() {
            RowValues::Int(i) => query.bind(i),
            RowValues::Float(f) => query.bind(f),
            RowValues::Text(s) => query.bind(s),
            RowValues::Bool(b) => query.bind(b),
            RowValues::Timestamp(dt) => query.bind(dt),
            RowValues::Null => bind_null(&mut query, param.effective_type()),
            RowValues::Blob(bytes) => query.bind(bytes),
        }
    }
    query
}

/// Extract a value from a row at a specific index.
///
/// tiberius exposes typed getters only, so the column is probed type by type; a NULL of
/// any type ends up as `RowValues::Null`.
fn extract_value(row: &tiberius::Row, idx: usize) -> RowValues {
    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return RowValues::Int(val);
    }
    if let Ok(Some(val)) = row.try_get::<i16, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<u8, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return RowValues::Float(f64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return RowValues::Float(val);
    }
    if let Ok(Some(val)) = row.try_get::<Numeric, _>(idx) {
        return val
            .to_string()
            .parse::<f64>()
            .map_or_else(|_| RowValues::Text(val.to_string()), RowValues::Float);
    }
    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return RowValues::Bool(val);
    }
    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        return RowValues::Text(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return RowValues::Timestamp(val);
    }
    if let Ok(Some(val)) = row.try_get::<DateTime<FixedOffset>, _>(idx) {
        return RowValues::Timestamp(val.naive_utc());
    }
    if let Ok(Some(val)) = row.try_get::<NaiveDate, _>(idx) {
        return val
            .and_hms_opt(0, 0, 0)
            .map_or(RowValues::Null, RowValues::Timestamp);
    }
    if let Ok(Some(val)) = row.try_get::<Uuid, _>(idx) {
        return RowValues::Text(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return RowValues::Blob(val.to_vec());
    }
    if let Ok(Some(val)) = row.try_get::<NaiveTime, _>(idx) {
        return time_value(val);
    }
    debug!(
        column = idx,
        column_type = ?row.columns().get(idx).map(|c| c.column_type()),
        "column read as NULL"
    );
    RowValues::Null
}

/// `time` columns have no `RowValues` variant; they are read as `HH:MM:SS[.fffffff]` text.
fn time_value(time: NaiveTime) -> RowValues {
    RowValues::Text(time.format("%H:%M:%S%.f").to_string())
}

/// One result set read off the wire.
#[derive(Debug, Default)]
pub struct FetchedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RowValues>>,
}

/// Drain a query stream into its result sets, in order.
///
/// # Errors
/// Returns the tiberius error raised while reading the stream.
pub async fn collect_tables(mut stream: QueryStream<'_>) -> Result<Vec<FetchedTable>, SqlCurryError> {
    let mut tables: Vec<FetchedTable> = Vec::new();
    while let Some(item) = stream.try_next().await? {
        match item {
            QueryItem::Metadata(meta) => tables.push(FetchedTable {
                columns: meta.columns().iter().map(|c| c.name().to_string()).collect(),
                rows: Vec::new(),
            }),
            QueryItem::Row(row) => {
                let Some(table) = tables.last_mut() else {
                    return Err(SqlCurryError::ExecutionError(
                        "SQL Server sent a row before its column metadata".to_string(),
                    ));
                };
                let values = (0..table.columns.len())
                    .map(|i| extract_value(&row, i))
                    .collect();
                table.rows.push(values);
            }
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: CommandKind, text: &str, params: Vec<Parameter>) -> CommandSpec {
        CommandSpec {
            text: text.to_string(),
            kind,
            params,
        }
    }

    #[test]
    fn time_columns_read_as_text() {
        let t = NaiveTime::from_hms_milli_opt(13, 5, 9, 250).unwrap();
        assert_eq!(time_value(t), RowValues::Text("13:05:09.250".into()));
        let whole = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        assert_eq!(time_value(whole), RowValues::Text("07:00:00".into()));
    }

    #[test]
    fn text_without_params_is_sent_verbatim() {
        let s = spec(CommandKind::Text, "SELECT 1", vec![]);
        assert_eq!(command_text(&s), "SELECT 1");
    }

    #[test]
    fn text_params_are_declared_in_bind_order() {
        let mut typed = Parameter::new("name", "o'brien");
        typed.sql_type = Some(SqlType::NVarChar);
        typed.size = Some(40);
        let s = spec(
            CommandKind::Text,
            "SELECT * FROM t WHERE id = @id AND name = @name AND n = 'x'",
            vec![Parameter::new("@id", 7), typed, Parameter::new("", true)],
        );
        assert_eq!(
            command_text(&s),
            "EXEC sp_executesql N'SELECT * FROM t WHERE id = @id AND name = @name AND n = ''x''', \
             N'@id bigint, @name nvarchar(40), @P3 bit', @id = @P1, @name = @P2, @P3 = @P3"
        );
    }

    #[test]
    fn procedure_arguments_follow_bind_order() {
        let s = spec(
            CommandKind::StoredProcedure,
            "dbo.usp_echo_order",
            vec![
                Parameter::new("@p1", 1),
                Parameter::new("@p2", 2),
                Parameter::new("@p3", 3),
            ],
        );
        assert_eq!(
            command_text(&s),
            "EXEC dbo.usp_echo_order @p1 = @P1, @p2 = @P2, @p3 = @P3"
        );
        let bare = spec(CommandKind::StoredProcedure, "dbo.usp_ping", vec![]);
        assert_eq!(command_text(&bare), "EXEC dbo.usp_ping");
    }
}
