/*!
 * Write Transaction Helpers
 *
 * SQLite admits one writer at a time. Every mutating service operation opens
 * its transaction through [`begin_write`], whose first statement bumps the
 * single `write_lock` row. That write makes SQLite take the RESERVED lock
 * before the operation issues any read, which is what `BEGIN IMMEDIATE` would
 * do, so the ledger read, the capacity comparison and the insert that consumes
 * the capacity cannot interleave with another writer. Other writers wait on
 * the connection's busy timeout.
 *
 * The same statement takes a row lock on engines with row locking, so the
 * serialization point survives a backend change, at the cost of throughput:
 * all writers queue behind one row.
 */

use crate::errors::ServiceError;
use metrics::{counter, histogram};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, Statement, TransactionTrait,
};
use std::time::Instant;
use tracing::{debug, error, warn};

const ACQUIRE_WRITE_LOCK_SQL: &str = "UPDATE write_lock SET epoch = epoch + 1 WHERE id = 1";

/// An open write transaction holding the database writer lock.
pub struct WriteTxn {
    txn: DatabaseTransaction,
    operation: &'static str,
    started: Instant,
}

impl WriteTxn {
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }
}

impl std::ops::Deref for WriteTxn {
    type Target = DatabaseTransaction;

    fn deref(&self) -> &Self::Target {
        &self.txn
    }
}

/// Opens a transaction and takes the writer lock before returning it.
pub async fn begin_write(
    db: &DatabaseConnection,
    operation: &'static str,
) -> Result<WriteTxn, ServiceError> {
    let started = Instant::now();
    let txn = db.begin().await?;

    let backend = txn.get_database_backend();
    let result = txn
        .execute(Statement::from_string(backend, ACQUIRE_WRITE_LOCK_SQL))
        .await?;

    if result.rows_affected() != 1 {
        // Dropping the transaction rolls it back.
        return Err(ServiceError::InternalError(
            "write_lock row is missing; run migrations".to_string(),
        ));
    }

    histogram!("po_fulfillment_db.write_lock.wait", started.elapsed());
    debug!(operation, "write lock acquired");
    counter!("po_fulfillment_db.transaction.started", 1);

    Ok(WriteTxn {
        txn,
        operation,
        started,
    })
}

/// Commits when `result` is `Ok`, otherwise rolls back and returns the
/// original error untouched.
pub async fn finish_write<T>(
    txn: WriteTxn,
    result: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let WriteTxn {
        txn,
        operation,
        started,
    } = txn;

    match result {
        Ok(value) => {
            txn.commit().await.map_err(|e| {
                error!(operation, error = %e, "commit failed");
                ServiceError::db_error(e)
            })?;
            counter!("po_fulfillment_db.transaction.committed", 1);
            histogram!("po_fulfillment_db.transaction.duration", started.elapsed());
            debug!(operation, elapsed = ?started.elapsed(), "transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(operation, error = %rollback_err, "rollback failed");
            }
            counter!("po_fulfillment_db.transaction.rolled_back", 1);
            if err.is_internal() {
                error!(operation, error = %err, "transaction rolled back");
            } else {
                warn!(operation, error = %err, "write rejected, transaction rolled back");
            }
            Err(err)
        }
    }
}
