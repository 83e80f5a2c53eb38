//! All writes run on one dedicated thread, each job in its own transaction.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use carehome_core::errors::{DatabaseError, Error, Result};

use super::DbPool;
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Either diesel aborted the transaction or the job returned an error.
enum TxError {
    Diesel(diesel::result::Error),
    App(Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Runs `job` inside a transaction on the writer thread. An `Err` from
    /// the job rolls the transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel::<Result<T>>();
        let wrapped: Job = Box::new(move |conn: &mut SqliteConnection| {
            let result = conn
                .transaction::<T, TxError, _>(|conn| job(conn).map_err(TxError::App))
                .map_err(|err| match err {
                    TxError::App(e) => e,
                    TxError::Diesel(e) => StorageError::from(e).into(),
                });
            let _ = reply_tx.send(result);
        });

        self.tx.send(wrapped).map_err(|_| writer_stopped())?;
        reply_rx.await.map_err(|_| writer_stopped())?
    }
}

fn writer_stopped() -> Error {
    Error::Database(DatabaseError::Internal(
        "Database writer is not running".to_string(),
    ))
}

pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    let spawned = std::thread::Builder::new()
        .name("carehome-db-writer".to_string())
        .spawn(move || {
            let mut conn = match pool.get() {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Database writer could not acquire a connection: {}", e);
                    return;
                }
            };
            debug!("Database writer started");
            while let Some(job) = rx.blocking_recv() {
                job(&mut *conn);
            }
            debug!("Database writer stopped");
        });
    if let Err(e) = spawned {
        error!("Failed to spawn database writer thread: {}", e);
    }

    WriteHandle { tx }
}
