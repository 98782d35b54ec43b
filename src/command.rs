//! Command construction: the middle stage of the connection curry.
//!
//! A [`CommandBuilder`] borrows its [`Target`] and accumulates the command text, its kind,
//! and an ordered parameter list. Terminal methods live in [`crate::executor`].

use crate::target::Target;
use crate::types::{CommandKind, RowValues, SqlType};

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name as written in the command (`@id`, `:id`, ...). Empty binds positionally.
    pub name: String,
    pub sql_type: Option<SqlType>,
    pub size: Option<usize>,
    pub value: RowValues,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<RowValues>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            size: None,
            value: value.into(),
        }
    }

    /// Declared type, falling back to one inferred from the value.
    #[must_use]
    pub fn effective_type(&self) -> SqlType {
        self.sql_type.unwrap_or_else(|| SqlType::infer(&self.value))
    }

    /// The value handed to the driver.
    ///
    /// A declared size truncates text (in characters) and binary values, and a declared
    /// `Bit` turns integers into booleans.
    #[must_use]
    pub fn bound_value(&self) -> RowValues {
        match (&self.value, self.size, self.sql_type) {
            (RowValues::Text(s), Some(n), _) if n > 0 && s.chars().count() > n => {
                RowValues::Text(s.chars().take(n).collect())
            }
            (RowValues::Blob(b), Some(n), _) if n > 0 && b.len() > n => {
                RowValues::Blob(b[..n].to_vec())
            }
            (RowValues::Int(i), _, Some(SqlType::Bit)) => RowValues::Bool(*i != 0),
            (value, _, _) => value.clone(),
        }
    }
}

/// The command a builder has accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub text: String,
    pub kind: CommandKind,
    pub params: Vec<Parameter>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(text: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            text: text.into(),
            kind,
            params: Vec::new(),
        }
    }
}

/// Fluent builder for one command against one target.
///
/// Each terminal method opens its own connection, so executing the same builder twice runs
/// the command twice.
///
/// ```rust,no_run
/// use sql_curry::prelude::*;
///
/// # fn demo(target: &Target) -> Result<(), SqlCurryError> {
/// let rows = target
///     .command("SELECT id, name FROM person WHERE team = @team AND active = @active")
///     .param("@team", "blue")
///     .typed_param("@active", SqlType::Bit, 1)
///     .rows()?;
/// # let _ = rows;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct CommandBuilder<'t> {
    pub(crate) target: &'t Target,
    pub(crate) spec: CommandSpec,
}

impl<'t> CommandBuilder<'t> {
    pub(crate) fn new(target: &'t Target, text: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            target,
            spec: CommandSpec::new(text, kind),
        }
    }

    /// Append a parameter with its type inferred from the value.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.spec.params.push(Parameter::new(name, value));
        self
    }

    /// Append a parameter with a declared type.
    #[must_use]
    pub fn typed_param(
        mut self,
        name: impl Into<String>,
        sql_type: SqlType,
        value: impl Into<RowValues>,
    ) -> Self {
        let mut param = Parameter::new(name, value);
        param.sql_type = Some(sql_type);
        self.spec.params.push(param);
        self
    }

    /// Append a parameter with a declared type and size.
    #[must_use]
    pub fn sized_param(
        mut self,
        name: impl Into<String>,
        sql_type: SqlType,
        size: usize,
        value: impl Into<RowValues>,
    ) -> Self {
        let mut param = Parameter::new(name, value);
        param.sql_type = Some(sql_type);
        param.size = Some(size);
        self.spec.params.push(param);
        self
    }

    #[must_use]
    pub fn target(&self) -> &'t Target {
        self.target
    }

    #[must_use]
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }
}

impl Target {
    /// Start a plain-text command against this target.
    #[must_use]
    pub fn command(&self, text: impl Into<String>) -> CommandBuilder<'_> {
        CommandBuilder::new(self, text, CommandKind::Text)
    }

    /// Start a command whose text is interpreted according to `kind`.
    #[must_use]
    pub fn command_of_kind(&self, text: impl Into<String>, kind: CommandKind) -> CommandBuilder<'_> {
        CommandBuilder::new(self, text, kind)
    }

    /// Start a stored-procedure call against this target.
    #[must_use]
    pub fn procedure(&self, name: impl Into<String>) -> CommandBuilder<'_> {
        CommandBuilder::new(self, name, CommandKind::StoredProcedure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatabaseType;

    #[test]
    fn params_keep_insertion_order_and_duplicates() {
        let target = Target::new("t", Some(":memory:".into()), DatabaseType::Sqlite);
        let builder = target
            .command("SELECT 1")
            .param("@b", 2)
            .param("@a", 1)
            .param("@b", 3);
        let names: Vec<&str> = builder.spec().params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["@b", "@a", "@b"]);
        assert_eq!(builder.spec().params[2].value, RowValues::Int(3));
    }

    #[test]
    fn procedure_sets_kind() {
        let target = Target::new("t", None, DatabaseType::Mssql);
        let builder = target.procedure("dbo.usp_thing");
        assert_eq!(builder.spec().kind, CommandKind::StoredProcedure);
        assert_eq!(builder.spec().text, "dbo.usp_thing");
    }

    #[test]
    fn size_truncates_text_and_bit_coerces() {
        let mut p = Parameter::new("@s", "abcdef");
        p.sql_type = Some(SqlType::NVarChar);
        p.size = Some(3);
        assert_eq!(p.bound_value(), RowValues::Text("abc".into()));

        let mut b = Parameter::new("@b", 5);
        b.sql_type = Some(SqlType::Bit);
        assert_eq!(b.bound_value(), RowValues::Bool(true));
        assert_eq!(Parameter::new("@n", 5).effective_type(), SqlType::BigInt);
    }
}
