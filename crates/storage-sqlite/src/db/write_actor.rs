use log::{debug, error};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

use super::{get_connection, DbConnection, DbPool};
use crate::errors::StorageError;
use diesel::SqliteConnection;
use spotprice_core::errors::Result;

// A job takes the writer's connection and returns a core Result. The return
// type is erased to `Box<dyn Any + Send>` so one channel carries every job.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type AnyResult = Result<Box<dyn Any + Send + 'static>>;
type Envelope = (Job<Box<dyn Any + Send + 'static>>, oneshot::Sender<AnyResult>);

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Executes a job on the writer actor's connection inside an immediate
    /// transaction. Either the whole job commits or nothing does.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| StorageError::WriterUnavailable("writer actor has stopped".into()))?;

        let boxed = ret_rx.await.map_err(|_| {
            StorageError::WriterUnavailable("writer actor dropped the reply".into())
        })??;

        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| StorageError::CoreError("unexpected writer result type".into()).into())
    }
}

/// Spawns a background Tokio task that acts as the single writer to the database.
///
/// The actor holds one pooled connection and processes jobs serially. If the
/// connection cannot be acquired the job fails and the next job tries again.
pub fn spawn_writer(pool: std::sync::Arc<DbPool>) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(1024);

    tokio::spawn(async move {
        let mut conn: Option<DbConnection> = None;

        while let Some((job, reply_tx)) = rx.recv().await {
            if conn.is_none() {
                match get_connection(&pool) {
                    Ok(c) => conn = Some(c),
                    Err(e) => {
                        error!("Writer actor could not acquire a connection: {}", e);
                        let _ = reply_tx.send(Err(e));
                        continue;
                    }
                }
            }
            let Some(c) = conn.as_mut() else {
                continue;
            };

            let result: AnyResult = c
                .immediate_transaction::<_, StorageError, _>(|tx| job(tx).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // The requester may have timed out and dropped the receiver.
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped");
    });

    WriteHandle { tx }
}
