use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;

use carehome_core::signatures::{EncryptedSignature, SignatureRepositoryTrait};
use carehome_core::sync::NewSyncQueueItem;
use carehome_core::Result;

use super::model::SignatureDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::signatures;
use crate::sync_queue::enqueue_sync_item;

/// Signatures are insert-only; only ciphertext reaches the database.
pub struct SignatureRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SignatureRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SignatureRepository { pool, writer }
    }
}

#[async_trait]
impl SignatureRepositoryTrait for SignatureRepository {
    fn get_signature(&self, signature_id: &str) -> Result<Option<EncryptedSignature>> {
        let mut conn = get_connection(&self.pool)?;
        signatures::table
            .find(signature_id)
            .first::<SignatureDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SignatureDB::into_domain)
            .transpose()
    }

    async fn insert_signature(
        &self,
        signature: EncryptedSignature,
        sync_item: NewSyncQueueItem,
    ) -> Result<EncryptedSignature> {
        let row = SignatureDB::from_domain(&signature);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<EncryptedSignature> {
                let stored = diesel::insert_into(signatures::table)
                    .values(&row)
                    .returning(SignatureDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                enqueue_sync_item(conn, sync_item)?;
                stored.into_domain()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use crate::sync_queue::SyncQueueRepository;
    use carehome_core::security::RootKey;
    use carehome_core::signatures::{SignatureInput, SignatureService, SignatureServiceTrait};
    use carehome_core::sync::{
        OfflineSyncService, SyncAcknowledgement, SyncItemType, SyncQueueItem,
        SyncQueueRepositoryTrait, SyncTransport,
    };
    use chrono::Utc;
    use tempfile::tempdir;

    struct NoTransport;

    #[async_trait]
    impl SyncTransport for NoTransport {
        async fn push(&self, _item: &SyncQueueItem) -> Result<SyncAcknowledgement> {
            Ok(SyncAcknowledgement::default())
        }
    }

    fn setup() -> (Arc<SignatureRepository>, Arc<SyncQueueRepository>) {
        let dir = tempdir().expect("tempdir").keep();
        let db_path = init(&dir.to_string_lossy()).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (
            Arc::new(SignatureRepository::new(pool.clone(), writer.clone())),
            Arc::new(SyncQueueRepository::new(pool, writer)),
        )
    }

    #[tokio::test]
    async fn signature_survives_storage_encrypted() {
        let (repo, queue) = setup();
        let sync = Arc::new(OfflineSyncService::new(queue.clone(), Arc::new(NoTransport)));
        let service =
            SignatureService::new(repo.clone(), sync, &RootKey::generate()).expect("service");

        let data = "data:image/png;base64,c3Ryb2tlLWRhdGE=";
        let id = service
            .store_signature(SignatureInput {
                signer_id: "staff-1".to_string(),
                signer_name: "A. Mensah".to_string(),
                reference_id: None,
                signature_data: Some(data.to_string()),
            })
            .await
            .expect("store");

        assert_eq!(service.get_signature(&id).unwrap().signature_data, data);
        let raw = repo.get_signature(&id).unwrap().expect("row");
        assert_ne!(raw.encrypted_data, data);

        let queued = queue.list_items().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].item_type, SyncItemType::Signature);
    }

    #[tokio::test]
    async fn duplicate_id_rolls_back_queue_item() {
        let (repo, queue) = setup();
        let signature = EncryptedSignature {
            id: "sig-1".to_string(),
            signer_id: "staff-1".to_string(),
            signer_name: "A. Mensah".to_string(),
            reference_id: None,
            encrypted_data: "AAAA".to_string(),
            key_version: 1,
            created_at: Utc::now(),
        };
        let item = || NewSyncQueueItem::new(SyncItemType::Signature, serde_json::json!({}));
        repo.insert_signature(signature.clone(), item())
            .await
            .expect("first insert");
        assert!(repo.insert_signature(signature, item()).await.is_err());
        assert_eq!(queue.list_items().unwrap().len(), 1);
    }
}
