//! In-memory repositories and fixtures for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::clinical::{DrugInteraction, InteractionRepositoryTrait, NewDrugInteraction};
use crate::consents::{Consent, ConsentRepositoryTrait};
use crate::errors::{Error, MedicationError, MedicationErrorCode, Result, SyncError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::medications::{
    AdministrationStatus, Medication, MedicationAdministration, MedicationRepositoryTrait,
    MedicationSchedule, NewMedication, NewMedicationAdministration, NewMedicationSchedule,
    ScheduleStatus, DEFAULT_MIN_DOSE_INTERVAL_MINUTES,
};
use crate::residents::{NewResident, Resident, ResidentRepositoryTrait};
use crate::security::StaffCredentialRepositoryTrait;
use crate::signatures::{EncryptedSignature, SignatureRepositoryTrait};
use crate::stock::{StockLevel, StockRepositoryTrait};
use crate::sync::{
    NewSyncQueueItem, SyncAcknowledgement, SyncItemStatus, SyncQueueItem,
    SyncQueueRepositoryTrait, SyncQueueStats, SyncTransport,
};

pub fn resident(id: &str) -> Resident {
    let now = Utc::now();
    Resident {
        id: id.to_string(),
        care_home_id: "home-1".to_string(),
        name: format!("Resident {}", id),
        allergies: Vec::new(),
        conditions: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn medication(id: &str, name: &str) -> Medication {
    Medication {
        id: id.to_string(),
        name: name.to_string(),
        strength: None,
        form: None,
        allergen_classes: Vec::new(),
        contraindications: Vec::new(),
        max_daily_dose: None,
        min_interval_minutes: DEFAULT_MIN_DOSE_INTERVAL_MINUTES,
        is_controlled: false,
    }
}

/// Active once-daily 08:00 schedule.
pub fn schedule(id: &str, resident_id: &str, medication_id: &str, dose: Decimal) -> MedicationSchedule {
    let now = Utc::now();
    MedicationSchedule {
        id: id.to_string(),
        resident_id: resident_id.to_string(),
        medication_id: medication_id.to_string(),
        times: vec![NaiveTime::from_hms_opt(8, 0, 0).unwrap()],
        frequency: "daily".to_string(),
        dose,
        unit: "mg".to_string(),
        status: ScheduleStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct InMemoryResidentRepository {
    residents: Mutex<HashMap<String, Resident>>,
}

impl InMemoryResidentRepository {
    pub fn put(&self, resident: Resident) {
        self.residents
            .lock()
            .unwrap()
            .insert(resident.id.clone(), resident);
    }
}

#[async_trait]
impl ResidentRepositoryTrait for InMemoryResidentRepository {
    fn get_resident(&self, resident_id: &str) -> Result<Option<Resident>> {
        Ok(self.residents.lock().unwrap().get(resident_id).cloned())
    }

    async fn insert_resident(&self, new_resident: NewResident) -> Result<Resident> {
        let mut created = resident(
            &new_resident
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
        );
        created.care_home_id = new_resident.care_home_id;
        created.name = new_resident.name;
        created.allergies = new_resident.allergies;
        created.conditions = new_resident.conditions;
        self.put(created.clone());
        Ok(created)
    }

    async fn update_resident(&self, resident: Resident) -> Result<Resident> {
        self.put(resident.clone());
        Ok(resident)
    }
}

#[derive(Default)]
pub struct InMemoryMedicationRepository {
    medications: Mutex<HashMap<String, Medication>>,
    schedules: Mutex<Vec<MedicationSchedule>>,
    administrations: Mutex<Vec<MedicationAdministration>>,
}

impl InMemoryMedicationRepository {
    pub fn put_medication(&self, medication: Medication) {
        self.medications
            .lock()
            .unwrap()
            .insert(medication.id.clone(), medication);
    }

    pub fn put_schedule(&self, schedule: MedicationSchedule) {
        let mut schedules = self.schedules.lock().unwrap();
        schedules.retain(|s| s.id != schedule.id);
        schedules.push(schedule);
    }

    /// GIVEN record outside any schedule, for dose history.
    pub fn put_given_dose(
        &self,
        resident_id: &str,
        medication_id: &str,
        dose: Decimal,
        at: DateTime<Utc>,
    ) {
        self.administrations
            .lock()
            .unwrap()
            .push(MedicationAdministration {
                id: Uuid::now_v7().to_string(),
                schedule_id: format!("history-{}", medication_id),
                resident_id: resident_id.to_string(),
                medication_id: medication_id.to_string(),
                status: AdministrationStatus::Given,
                dose,
                administered_by: "nurse-history".to_string(),
                witnessed_by: None,
                administered_at: at,
                notes: None,
                signed_by: None,
                signed_at: None,
                created_at: at,
            });
    }

    fn update_record<F>(&self, record_id: &str, apply: F) -> Result<MedicationAdministration>
    where
        F: FnOnce(&mut MedicationAdministration),
    {
        let mut records = self.administrations.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(format!("administration record {}", record_id)))?;
        if record.is_signed() {
            return Err(MedicationError::new(MedicationErrorCode::RecordSigned, "signed").into());
        }
        apply(record);
        Ok(record.clone())
    }
}

#[async_trait]
impl MedicationRepositoryTrait for InMemoryMedicationRepository {
    fn get_medication(&self, medication_id: &str) -> Result<Option<Medication>> {
        Ok(self.medications.lock().unwrap().get(medication_id).cloned())
    }

    fn get_schedule(&self, schedule_id: &str) -> Result<Option<MedicationSchedule>> {
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == schedule_id)
            .cloned())
    }

    fn list_active_schedules_for_resident(
        &self,
        resident_id: &str,
    ) -> Result<Vec<MedicationSchedule>> {
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.resident_id == resident_id && s.status == ScheduleStatus::Active)
            .cloned()
            .collect())
    }

    fn get_administration(&self, record_id: &str) -> Result<Option<MedicationAdministration>> {
        Ok(self
            .administrations
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == record_id)
            .cloned())
    }

    fn list_administrations_for_resident(
        &self,
        resident_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MedicationAdministration>> {
        let mut records: Vec<_> = self
            .administrations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.resident_id == resident_id)
            .filter(|r| since.map_or(true, |s| r.administered_at >= s))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.administered_at.cmp(&a.administered_at));
        Ok(records)
    }

    fn last_given_for_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Option<MedicationAdministration>> {
        Ok(self
            .administrations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.schedule_id == schedule_id && r.status == AdministrationStatus::Given)
            .max_by_key(|r| r.administered_at)
            .cloned())
    }

    fn total_given_since(
        &self,
        resident_id: &str,
        medication_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Decimal> {
        Ok(self
            .administrations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.resident_id == resident_id
                    && r.medication_id == medication_id
                    && r.status == AdministrationStatus::Given
                    && r.administered_at >= since
            })
            .map(|r| r.dose)
            .sum())
    }

    async fn insert_medication(&self, new_medication: NewMedication) -> Result<Medication> {
        let created = Medication {
            id: new_medication
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            name: new_medication.name,
            strength: new_medication.strength,
            form: new_medication.form,
            allergen_classes: new_medication.allergen_classes,
            contraindications: new_medication.contraindications,
            max_daily_dose: new_medication.max_daily_dose,
            min_interval_minutes: new_medication
                .min_interval_minutes
                .unwrap_or(DEFAULT_MIN_DOSE_INTERVAL_MINUTES),
            is_controlled: new_medication.is_controlled,
        };
        self.put_medication(created.clone());
        Ok(created)
    }

    async fn insert_schedule(
        &self,
        new_schedule: NewMedicationSchedule,
    ) -> Result<MedicationSchedule> {
        let mut created = schedule(
            &new_schedule
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            &new_schedule.resident_id,
            &new_schedule.medication_id,
            new_schedule.dose,
        );
        created.times = new_schedule.times;
        created.frequency = new_schedule.frequency;
        created.unit = new_schedule.unit;
        self.put_schedule(created.clone());
        Ok(created)
    }

    async fn update_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<MedicationSchedule> {
        let mut schedules = self.schedules.lock().unwrap();
        let schedule = schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| Error::not_found(format!("schedule {}", schedule_id)))?;
        schedule.status = status;
        schedule.updated_at = Utc::now();
        Ok(schedule.clone())
    }

    async fn insert_administration(
        &self,
        record: NewMedicationAdministration,
    ) -> Result<MedicationAdministration> {
        let created = MedicationAdministration {
            id: Uuid::now_v7().to_string(),
            schedule_id: record.schedule_id,
            resident_id: record.resident_id,
            medication_id: record.medication_id,
            status: record.status,
            dose: record.dose,
            administered_by: record.administered_by,
            witnessed_by: record.witnessed_by,
            administered_at: record.administered_at,
            notes: record.notes,
            signed_by: None,
            signed_at: None,
            created_at: Utc::now(),
        };
        self.administrations.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn sign_administration(
        &self,
        record_id: &str,
        signed_by: &str,
        signed_at: DateTime<Utc>,
    ) -> Result<MedicationAdministration> {
        self.update_record(record_id, |record| {
            record.signed_by = Some(signed_by.to_string());
            record.signed_at = Some(signed_at);
        })
    }

    async fn update_administration_notes(
        &self,
        record_id: &str,
        notes: Option<String>,
    ) -> Result<MedicationAdministration> {
        self.update_record(record_id, |record| record.notes = notes)
    }
}

#[derive(Default)]
pub struct InMemoryInteractionRepository {
    interactions: Mutex<Vec<DrugInteraction>>,
}

#[async_trait]
impl InteractionRepositoryTrait for InMemoryInteractionRepository {
    fn find_interactions(
        &self,
        medication_id: &str,
        other_medication_ids: &[String],
    ) -> Result<Vec<DrugInteraction>> {
        Ok(self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                i.counterpart(medication_id)
                    .is_some_and(|other| other_medication_ids.iter().any(|id| id == other))
            })
            .cloned()
            .collect())
    }

    async fn insert_interaction(&self, interaction: NewDrugInteraction) -> Result<DrugInteraction> {
        let created = DrugInteraction {
            id: Uuid::now_v7().to_string(),
            medication_a_id: interaction.medication_a_id,
            medication_b_id: interaction.medication_b_id,
            severity: interaction.severity,
            description: interaction.description,
        };
        self.interactions.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub struct InMemoryStockRepository {
    levels: Mutex<HashMap<String, StockLevel>>,
}

#[async_trait]
impl StockRepositoryTrait for InMemoryStockRepository {
    fn get_stock_level(&self, medication_id: &str) -> Result<Option<StockLevel>> {
        Ok(self.levels.lock().unwrap().get(medication_id).cloned())
    }

    fn list_stock_levels(&self) -> Result<Vec<StockLevel>> {
        let mut levels: Vec<_> = self.levels.lock().unwrap().values().cloned().collect();
        levels.sort_by(|a, b| a.medication_id.cmp(&b.medication_id));
        Ok(levels)
    }

    async fn receive_quantity(
        &self,
        medication_id: &str,
        quantity: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> Result<StockLevel> {
        let mut levels = self.levels.lock().unwrap();
        let level = levels
            .entry(medication_id.to_string())
            .or_insert_with(|| StockLevel::new(medication_id));
        level.quantity += quantity;
        if expiry_date.is_some() {
            level.expiry_date = expiry_date;
        }
        level.updated_at = Utc::now();
        Ok(level.clone())
    }

    async fn update_thresholds(
        &self,
        medication_id: &str,
        reorder_threshold: Decimal,
        critical_threshold: Decimal,
    ) -> Result<StockLevel> {
        let mut levels = self.levels.lock().unwrap();
        let level = levels
            .entry(medication_id.to_string())
            .or_insert_with(|| StockLevel::new(medication_id));
        level.reorder_threshold = reorder_threshold;
        level.critical_threshold = critical_threshold;
        level.updated_at = Utc::now();
        Ok(level.clone())
    }

    async fn adjust_quantity(&self, medication_id: &str, delta: Decimal) -> Result<StockLevel> {
        let mut levels = self.levels.lock().unwrap();
        let level = levels
            .entry(medication_id.to_string())
            .or_insert_with(|| StockLevel::new(medication_id));
        let next = level.quantity + delta;
        if next < Decimal::ZERO {
            return Err(MedicationError::new(
                MedicationErrorCode::InsufficientStock,
                format!("{} on hand", level.quantity),
            )
            .into());
        }
        level.quantity = next;
        level.updated_at = Utc::now();
        Ok(level.clone())
    }
}

#[derive(Default)]
pub struct InMemoryStaffCredentialRepository {
    hashes: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl StaffCredentialRepositoryTrait for InMemoryStaffCredentialRepository {
    fn get_pin_hash(&self, staff_id: &str) -> Result<Option<String>> {
        Ok(self.hashes.lock().unwrap().get(staff_id).cloned())
    }

    async fn set_pin_hash(&self, staff_id: &str, pin_hash: String) -> Result<()> {
        self.hashes
            .lock()
            .unwrap()
            .insert(staff_id.to_string(), pin_hash);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySyncQueueRepository {
    items: Mutex<Vec<SyncQueueItem>>,
}

impl InMemorySyncQueueRepository {
    fn with_item<F>(&self, item_id: &str, apply: F) -> Result<SyncQueueItem>
    where
        F: FnOnce(&mut SyncQueueItem),
    {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| Error::not_found(format!("sync item {}", item_id)))?;
        apply(item);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }
}

#[async_trait]
impl SyncQueueRepositoryTrait for InMemorySyncQueueRepository {
    fn list_items(&self) -> Result<Vec<SyncQueueItem>> {
        Ok(self.items.lock().unwrap().clone())
    }

    fn get_item(&self, item_id: &str) -> Result<Option<SyncQueueItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == item_id)
            .cloned())
    }

    fn list_processable(&self, max_retries: i32) -> Result<Vec<SyncQueueItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| match i.status {
                SyncItemStatus::Pending => true,
                SyncItemStatus::Failed => i.retry_count < max_retries,
                SyncItemStatus::InProgress => false,
            })
            .cloned()
            .collect())
    }

    fn get_stats(&self, max_retries: i32) -> Result<SyncQueueStats> {
        Ok(SyncQueueStats::from_items(
            &self.items.lock().unwrap(),
            max_retries,
        ))
    }

    async fn enqueue(&self, item: NewSyncQueueItem) -> Result<SyncQueueItem> {
        let now = Utc::now();
        let created = SyncQueueItem {
            id: item.id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            item_type: item.item_type,
            payload: item.payload,
            retry_count: 0,
            status: SyncItemStatus::Pending,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.items.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn mark_in_progress(&self, item_id: &str) -> Result<()> {
        self.with_item(item_id, |i| i.status = SyncItemStatus::InProgress)
            .map(|_| ())
    }

    async fn remove_item(&self, item_id: &str) -> Result<()> {
        self.items.lock().unwrap().retain(|i| i.id != item_id);
        Ok(())
    }

    async fn mark_failed(&self, item_id: &str, error: String) -> Result<SyncQueueItem> {
        self.with_item(item_id, |i| {
            i.status = SyncItemStatus::Failed;
            i.retry_count += 1;
            i.last_error = Some(error);
        })
    }

    async fn reset_failed(&self) -> Result<usize> {
        let mut items = self.items.lock().unwrap();
        let mut reset = 0;
        for item in items.iter_mut().filter(|i| i.status == SyncItemStatus::Failed) {
            item.status = SyncItemStatus::Pending;
            item.retry_count = 0;
            item.last_error = None;
            reset += 1;
        }
        Ok(reset)
    }

    async fn recover_in_progress(&self) -> Result<usize> {
        let mut items = self.items.lock().unwrap();
        let mut recovered = 0;
        for item in items
            .iter_mut()
            .filter(|i| i.status == SyncItemStatus::InProgress)
        {
            item.status = SyncItemStatus::Pending;
            recovered += 1;
        }
        Ok(recovered)
    }
}

pub struct InMemoryConsentRepository {
    consents: Mutex<HashMap<String, Consent>>,
    queue: Arc<InMemorySyncQueueRepository>,
}

impl InMemoryConsentRepository {
    pub fn new(queue: Arc<InMemorySyncQueueRepository>) -> Self {
        Self {
            consents: Mutex::new(HashMap::new()),
            queue,
        }
    }
}

#[async_trait]
impl ConsentRepositoryTrait for InMemoryConsentRepository {
    fn get_consent(&self, consent_id: &str) -> Result<Option<Consent>> {
        Ok(self.consents.lock().unwrap().get(consent_id).cloned())
    }

    fn list_consents_for_resident(&self, resident_id: &str) -> Result<Vec<Consent>> {
        Ok(self
            .consents
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.resident_id == resident_id)
            .cloned()
            .collect())
    }

    async fn insert_consent(
        &self,
        consent: Consent,
        sync_item: NewSyncQueueItem,
    ) -> Result<Consent> {
        self.queue.enqueue(sync_item).await?;
        self.consents
            .lock()
            .unwrap()
            .insert(consent.id.clone(), consent.clone());
        Ok(consent)
    }

    async fn update_consent(
        &self,
        consent: Consent,
        sync_item: NewSyncQueueItem,
    ) -> Result<Consent> {
        self.insert_consent(consent, sync_item).await
    }
}

pub struct InMemorySignatureRepository {
    signatures: Mutex<HashMap<String, EncryptedSignature>>,
    queue: Arc<InMemorySyncQueueRepository>,
}

impl InMemorySignatureRepository {
    pub fn new(queue: Arc<InMemorySyncQueueRepository>) -> Self {
        Self {
            signatures: Mutex::new(HashMap::new()),
            queue,
        }
    }
}

#[async_trait]
impl SignatureRepositoryTrait for InMemorySignatureRepository {
    fn get_signature(&self, signature_id: &str) -> Result<Option<EncryptedSignature>> {
        Ok(self.signatures.lock().unwrap().get(signature_id).cloned())
    }

    async fn insert_signature(
        &self,
        signature: EncryptedSignature,
        sync_item: NewSyncQueueItem,
    ) -> Result<EncryptedSignature> {
        self.queue.enqueue(sync_item).await?;
        self.signatures
            .lock()
            .unwrap()
            .insert(signature.id.clone(), signature.clone());
        Ok(signature)
    }
}

#[derive(Debug, Clone)]
pub enum TransportStep {
    Ack,
    /// Server answers but acknowledges no ids.
    AckNothing,
    Fail(String),
}

/// Plays the scripted steps in order, then acknowledges everything.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<TransportStep>>,
    pushed: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<TransportStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            pushed: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.pushed.lock().unwrap().len()
    }

    pub fn pushed_ids(&self) -> Vec<String> {
        self.pushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTransport for ScriptedTransport {
    async fn push(&self, item: &SyncQueueItem) -> Result<SyncAcknowledgement> {
        self.pushed.lock().unwrap().push(item.id.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TransportStep::Ack);
        match step {
            TransportStep::Ack => Ok(SyncAcknowledgement {
                acknowledged_ids: vec![item.id.clone()],
            }),
            TransportStep::AckNothing => Ok(SyncAcknowledgement::default()),
            TransportStep::Fail(message) => Err(SyncError::Transport {
                message,
                retryable: true,
            }
            .into()),
        }
    }
}

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl DomainEventSink for RecordingEventSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
