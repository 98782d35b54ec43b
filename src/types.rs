use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Serialize, Serializer};

/// Values that can be stored in a database row or bound as command parameters.
///
/// The same closed set of variants is used by every backend, so records keep one shape
/// regardless of the driver that produced them:
/// ```rust
/// use sql_curry::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Serializes to the column's native JSON scalar: numbers, strings, booleans or `null`.
/// Timestamps use ISO-8601 without offset; blobs become an array of bytes.
impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Timestamp(dt) => {
                serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            RowValues::Null => serializer.serialize_unit(),
            RowValues::Blob(bytes) => bytes.serialize(serializer),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// The database type behind a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `SQLite` database
    Sqlite,
    /// SQL Server database
    Mssql,
}

/// How the command text is interpreted by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    /// Free-form SQL text.
    #[default]
    Text,
    /// The text names a stored procedure.
    StoredProcedure,
}

/// Declared parameter type, mirroring the SQL Server type names.
///
/// SQL Server uses it to build the parameter declaration list; `SQLite` binds by value and
/// only honors it for `Bit` (stored as 0/1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Real,
    Decimal,
    Char,
    VarChar,
    NChar,
    NVarChar,
    Text,
    Date,
    DateTime,
    DateTime2,
    Binary,
    VarBinary,
    UniqueIdentifier,
}

impl SqlType {
    /// Render the type as a T-SQL declaration, applying `size` to the sized types.
    #[must_use]
    pub fn declaration(self, size: Option<usize>) -> String {
        let sized = |name: &str| match size {
            Some(n) if n > 0 => format!("{name}({n})"),
            _ => format!("{name}(max)"),
        };
        match self {
            SqlType::Bit => "bit".into(),
            SqlType::TinyInt => "tinyint".into(),
            SqlType::SmallInt => "smallint".into(),
            SqlType::Int => "int".into(),
            SqlType::BigInt => "bigint".into(),
            SqlType::Float => "float".into(),
            SqlType::Real => "real".into(),
            SqlType::Decimal => "decimal(38, 10)".into(),
            SqlType::Char => format!("char({})", size.unwrap_or(1)),
            SqlType::NChar => format!("nchar({})", size.unwrap_or(1)),
            SqlType::VarChar => sized("varchar"),
            SqlType::NVarChar => sized("nvarchar"),
            SqlType::Text => "nvarchar(max)".into(),
            SqlType::Date => "date".into(),
            SqlType::DateTime => "datetime".into(),
            SqlType::DateTime2 => "datetime2".into(),
            SqlType::Binary => format!("binary({})", size.unwrap_or(1)),
            SqlType::VarBinary => sized("varbinary"),
            SqlType::UniqueIdentifier => "uniqueidentifier".into(),
        }
    }

    /// Infer the declared type from a value when the caller did not name one.
    #[must_use]
    pub fn infer(value: &RowValues) -> SqlType {
        match value {
            RowValues::Int(_) => SqlType::BigInt,
            RowValues::Float(_) => SqlType::Float,
            RowValues::Bool(_) => SqlType::Bit,
            RowValues::Timestamp(_) => SqlType::DateTime2,
            RowValues::Blob(_) => SqlType::VarBinary,
            RowValues::Text(_) | RowValues::Null => SqlType::NVarChar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_becomes_null() {
        let v: RowValues = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: RowValues = Some("x").into();
        assert_eq!(v.as_text(), Some("x"));
    }

    #[test]
    fn serializes_native_scalars() {
        let dt = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let values = vec![
            RowValues::Int(7),
            RowValues::Text("a".into()),
            RowValues::Null,
            RowValues::Bool(false),
            RowValues::Timestamp(dt),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[7,"a",null,false,"2024-01-02T03:04:05"]"#);
    }

    #[test]
    fn declarations_apply_size() {
        assert_eq!(SqlType::NVarChar.declaration(Some(50)), "nvarchar(50)");
        assert_eq!(SqlType::NVarChar.declaration(None), "nvarchar(max)");
        assert_eq!(SqlType::Int.declaration(Some(4)), "int");
        assert_eq!(SqlType::infer(&RowValues::Bool(true)), SqlType::Bit);
    }
}
