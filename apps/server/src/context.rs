//! Services built once at start-up and shared by every handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use carehome_core::clinical::{
    ClinicalDecisionSupportService, ClinicalDecisionSupportServiceTrait,
    InteractionRepositoryTrait,
};
use carehome_core::consents::{ConsentService, ConsentServiceTrait};
use carehome_core::errors::SyncError;
use carehome_core::events::DomainEventSink;
use carehome_core::medications::{MedicationService, MedicationServiceTrait, SafetyPolicy};
use carehome_core::residents::ResidentRepositoryTrait;
use carehome_core::security::{StaffPinService, StaffPinServiceTrait};
use carehome_core::signatures::{SignatureService, SignatureServiceTrait};
use carehome_core::stock::{StockService, StockServiceTrait};
use carehome_core::sync::{
    OfflineSyncService, SyncAcknowledgement, SyncQueueItem, SyncTransport,
};
use carehome_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, ConsentRepository, InteractionRepository,
    MedicationRepository, ResidentRepository, SignatureRepository, StaffCredentialRepository,
    StockRepository, SyncQueueRepository,
};
use carehome_sync_client::SyncApiClient;

use crate::config::Config;

/// Stand-in transport while no central server is configured. The worker is
/// not started in that case, so items stay PENDING.
struct UnconfiguredTransport;

#[async_trait]
impl SyncTransport for UnconfiguredTransport {
    async fn push(&self, _item: &SyncQueueItem) -> carehome_core::Result<SyncAcknowledgement> {
        Err(SyncError::NotConfigured.into())
    }
}

pub struct ServiceContext {
    pub resident_repository: Arc<dyn ResidentRepositoryTrait>,
    pub interaction_repository: Arc<dyn InteractionRepositoryTrait>,
    pub medication_service: Arc<dyn MedicationServiceTrait>,
    pub clinical_service: Arc<dyn ClinicalDecisionSupportServiceTrait>,
    pub stock_service: Arc<dyn StockServiceTrait>,
    pub staff_pin_service: Arc<dyn StaffPinServiceTrait>,
    pub consent_service: Arc<dyn ConsentServiceTrait>,
    pub signature_service: Arc<dyn SignatureServiceTrait>,
    pub sync_service: Arc<OfflineSyncService>,
    pub sync_configured: bool,
}

impl ServiceContext {
    pub fn initialize(config: &Config, event_sink: Arc<dyn DomainEventSink>) -> anyhow::Result<Self> {
        let db_path = init(&config.db_path)?;
        run_migrations(&db_path)?;
        let pool = create_pool(&db_path)?;
        let writer = spawn_writer(pool.as_ref().clone());
        info!("Database ready at {}", db_path);

        let resident_repository = Arc::new(ResidentRepository::new(pool.clone(), writer.clone()));
        let medication_repository =
            Arc::new(MedicationRepository::new(pool.clone(), writer.clone()));
        let interaction_repository =
            Arc::new(InteractionRepository::new(pool.clone(), writer.clone()));
        let stock_repository = Arc::new(StockRepository::new(pool.clone(), writer.clone()));
        let credential_repository =
            Arc::new(StaffCredentialRepository::new(pool.clone(), writer.clone()));
        let consent_repository = Arc::new(ConsentRepository::new(pool.clone(), writer.clone()));
        let signature_repository =
            Arc::new(SignatureRepository::new(pool.clone(), writer.clone()));
        let queue_repository = Arc::new(SyncQueueRepository::new(pool, writer));

        let sync_configured = config.sync_api_url.is_some() && config.sync_token.is_some();
        let transport: Arc<dyn SyncTransport> = match (&config.sync_api_url, &config.sync_token) {
            (Some(url), Some(token)) => {
                info!("Syncing to {}", url);
                Arc::new(SyncApiClient::new(url, token)?)
            }
            (Some(_), None) => {
                warn!("CAREHOME_SYNC_API_URL is set without CAREHOME_SYNC_TOKEN; sync disabled");
                Arc::new(UnconfiguredTransport)
            }
            _ => {
                info!("No sync server configured; queued items stay local");
                Arc::new(UnconfiguredTransport)
            }
        };

        let sync_service = Arc::new(
            OfflineSyncService::new(queue_repository, transport)
                .with_event_sink(event_sink.clone()),
        );
        let stock_service: Arc<dyn StockServiceTrait> = Arc::new(StockService::new(stock_repository));
        let clinical_service: Arc<dyn ClinicalDecisionSupportServiceTrait> =
            Arc::new(ClinicalDecisionSupportService::new(
                resident_repository.clone(),
                medication_repository.clone(),
                interaction_repository.clone(),
            ));
        let staff_pin_service: Arc<dyn StaffPinServiceTrait> =
            Arc::new(StaffPinService::new(credential_repository));

        let policy = SafetyPolicy::default()
            .with_require_pin(config.require_pin)
            .with_timing_window_minutes(config.timing_window_minutes)
            .with_timezone(config.timezone);
        let medication_service = Arc::new(
            MedicationService::new(
                medication_repository,
                clinical_service.clone(),
                stock_service.clone(),
                staff_pin_service.clone(),
            )
            .with_event_sink(event_sink)
            .with_policy(policy),
        );

        let consent_service = Arc::new(ConsentService::new(
            consent_repository,
            sync_service.clone(),
        ));
        let signature_service = Arc::new(SignatureService::new(
            signature_repository,
            sync_service.clone(),
            &config.secret_key,
        )?);

        Ok(Self {
            resident_repository,
            interaction_repository,
            medication_service,
            clinical_service,
            stock_service,
            staff_pin_service,
            consent_service,
            signature_service,
            sync_service,
            sync_configured,
        })
    }
}
