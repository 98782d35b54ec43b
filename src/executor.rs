//! Terminal execution: the last stage of the connection curry.
//!
//! Every terminal call runs the same protocol: resolve the target, open a fresh
//! connection, prepare and bind the command, execute, map the result, and close the
//! connection on every exit path. A [`ConnectionLease`] keeps the per-target open count
//! honest even when the call panics.

mod dispatch;
mod terminal;

use std::sync::Arc;

use tracing::{debug, info_span};
use uuid::Uuid;

use crate::command::CommandSpec;
use crate::error::SqlCurryError;
use crate::mapper::RowCursor;
use crate::target::{ConnectionStats, Target};

pub(crate) use dispatch::Connection;

/// Counts one open connection for its target until dropped.
///
/// Held next to the `Connection` in [`run`]; on unwind both are dropped, and the drivers
/// close their handles on drop.
pub(crate) struct ConnectionLease {
    stats: Arc<ConnectionStats>,
}

impl ConnectionLease {
    fn acquire(target: &Target) -> Self {
        target.stats().opened();
        Self {
            stats: Arc::clone(target.stats()),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.stats.closed();
        debug!("connection closed");
    }
}

/// Run `op` against a fresh connection to `target` as one unit of work.
///
/// An unresolved target fails before anything is opened. Any other failure is wrapped once
/// in [`SqlCurryError::Execution`] carrying the unit-of-work id that also tags this call's
/// `tracing` span.
pub(crate) fn run<R>(
    target: &Target,
    spec: &CommandSpec,
    mode: &'static str,
    op: impl FnOnce(&mut Connection, &CommandSpec) -> Result<R, SqlCurryError>,
) -> Result<R, SqlCurryError> {
    let connection_string = target.connection_string()?;
    let unit_of_work = Uuid::new_v4();
    let span = info_span!(
        "unit_of_work",
        id = %unit_of_work,
        db = target.name(),
        mode,
        kind = ?spec.kind,
        params = spec.params.len()
    );
    let _entered = span.enter();

    let result = Connection::open(target, connection_string).and_then(|mut conn| {
        let _lease = ConnectionLease::acquire(target);
        debug!(command = %spec.text, "executing");
        let outcome = op(&mut conn, spec);
        conn.close();
        outcome
    });

    result.map_err(|source| {
        debug!(error = %source, "unit of work failed");
        SqlCurryError::Execution {
            unit_of_work,
            target: target.name().to_string(),
            source: Box::new(source),
        }
    })
}

/// Run `spec` and hand its first result to `f` as a cursor.
///
/// # Errors
/// See [`run`].
pub(crate) fn with_cursor<R>(
    target: &Target,
    spec: &CommandSpec,
    f: impl FnOnce(&mut dyn RowCursor) -> Result<R, SqlCurryError>,
) -> Result<R, SqlCurryError> {
    run(target, spec, "cursor", |conn, spec| conn.with_cursor(spec, f))
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::types::{CommandKind, DatabaseType};

    #[test]
    fn panic_inside_unit_of_work_still_closes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panic.db");
        let target = Target::new(
            "panicky",
            Some(path.to_string_lossy().into_owned()),
            DatabaseType::Sqlite,
        );
        let spec = CommandSpec::new("SELECT 1", CommandKind::Text);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            run(&target, &spec, "test", |_, _| -> Result<(), SqlCurryError> {
                panic!("mapper blew up")
            })
        }));

        assert!(outcome.is_err());
        assert_eq!(target.open_connections(), 0);
        assert_eq!(target.total_connections(), 1);
    }

    #[test]
    fn lease_counts_while_the_op_runs() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::new(
            "leased",
            Some(dir.path().join("lease.db").to_string_lossy().into_owned()),
            DatabaseType::Sqlite,
        );
        let spec = CommandSpec::new("SELECT 1", CommandKind::Text);

        let during = run(&target, &spec, "test", |conn, spec| {
            let open = target.open_connections();
            conn.with_cursor(spec, |cursor| cursor.next_row().map(|_| open))
        })
        .unwrap();

        assert_eq!(during, 1);
        assert_eq!(target.open_connections(), 0);
        assert_eq!(target.total_connections(), 1);
    }

    #[test]
    fn unresolved_target_opens_nothing() {
        let target = Target::new("irb", None, DatabaseType::Sqlite);
        let spec = CommandSpec::new("SELECT 1", CommandKind::Text);
        let err = run(&target, &spec, "test", |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, SqlCurryError::UnresolvedTarget { .. }));
        assert_eq!(target.total_connections(), 0);
    }
}
