use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{
    check_allergies, check_drug_interactions, check_duplicate_dose, check_max_daily_dose,
    check_stock_availability, check_timing_window, AdministrationOutcome, AdministrationRequest,
    AdministrationStatus, Medication, MedicationAdministration, MedicationRepositoryTrait,
    MedicationSchedule, MedicationServiceTrait, NewMedication, NewMedicationAdministration,
    NewMedicationSchedule, SafetyCheckKind, SafetyCheckResult, SafetyPolicy, ScheduleConflict,
    ScheduleStatus, DEFAULT_MIN_DOSE_INTERVAL_MINUTES,
};
use crate::clinical::{ClinicalDecisionSupportServiceTrait, ContraindicationFinding};
use crate::errors::{DatabaseError, Error, MedicationError, MedicationErrorCode, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::security::StaffPinServiceTrait;
use crate::stock::{evaluate_stock_alerts, StockAlert, StockServiceTrait};
use crate::utils::time_utils::minutes_between_times_of_day;

pub struct MedicationService {
    repository: Arc<dyn MedicationRepositoryTrait>,
    clinical_service: Arc<dyn ClinicalDecisionSupportServiceTrait>,
    stock_service: Arc<dyn StockServiceTrait>,
    pin_service: Arc<dyn StaffPinServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    policy: SafetyPolicy,
    /// One lock per resident, held from the safety checks until the dose and
    /// its stock decrement are written.
    administration_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MedicationService {
    pub fn new(
        repository: Arc<dyn MedicationRepositoryTrait>,
        clinical_service: Arc<dyn ClinicalDecisionSupportServiceTrait>,
        stock_service: Arc<dyn StockServiceTrait>,
        pin_service: Arc<dyn StaffPinServiceTrait>,
    ) -> Self {
        Self {
            repository,
            clinical_service,
            stock_service,
            pin_service,
            event_sink: Arc::new(NoOpDomainEventSink),
            policy: SafetyPolicy::default(),
            administration_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_policy(mut self, policy: SafetyPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn resident_lock(&self, resident_id: &str) -> Arc<Mutex<()>> {
        self.administration_locks
            .lock()
            .await
            .entry(resident_id.to_string())
            .or_default()
            .clone()
    }

    fn load_schedule(&self, schedule_id: &str) -> Result<MedicationSchedule> {
        self.repository.get_schedule(schedule_id)?.ok_or_else(|| {
            MedicationError::new(
                MedicationErrorCode::ScheduleNotFound,
                format!("Schedule {} not found", schedule_id),
            )
            .into()
        })
    }

    fn load_unsigned_record(&self, record_id: &str) -> Result<MedicationAdministration> {
        let record = self
            .repository
            .get_administration(record_id)?
            .ok_or_else(|| Error::not_found(format!("administration record {}", record_id)))?;
        if record.is_signed() {
            return Err(MedicationError::new(
                MedicationErrorCode::RecordSigned,
                format!("Administration record {} is signed and cannot change", record_id),
            )
            .into());
        }
        Ok(record)
    }

    /// Staff PIN for controlled drugs or when the policy demands it, plus a
    /// distinct verified witness for controlled drugs.
    async fn verify_attestations(
        &self,
        medication: &Medication,
        request: &AdministrationRequest,
    ) -> Result<()> {
        if !(medication.is_controlled || self.policy.require_pin) {
            return Ok(());
        }

        let staff_ok = match request.staff_pin.as_deref() {
            Some(pin) => self.pin_service.verify(&request.administered_by, pin).await?,
            None => false,
        };
        if !staff_ok {
            warn!(
                "PIN verification failed for staff {} administering {}",
                request.administered_by, medication.id
            );
            return Err(MedicationError::new(
                MedicationErrorCode::PinVerificationFailed,
                "Staff PIN verification failed",
            )
            .into());
        }

        if !medication.is_controlled {
            return Ok(());
        }
        let witness = request
            .witnessed_by
            .as_deref()
            .filter(|w| !w.trim().is_empty() && *w != request.administered_by);
        let Some(witness) = witness else {
            return Err(MedicationError::new(
                MedicationErrorCode::WitnessRequired,
                format!(
                    "{} is a controlled drug and needs a second member of staff as witness",
                    medication.name
                ),
            )
            .into());
        };
        let witness_ok = match request.witness_pin.as_deref() {
            Some(pin) => self.pin_service.verify(witness, pin).await?,
            None => false,
        };
        if !witness_ok {
            warn!("Witness PIN verification failed for staff {}", witness);
            return Err(MedicationError::new(
                MedicationErrorCode::PinVerificationFailed,
                "Witness PIN verification failed",
            )
            .into());
        }
        Ok(())
    }

    fn stock_on_hand(&self, medication_id: &str) -> Result<Option<Decimal>> {
        match self.stock_service.get_stock_level(medication_id) {
            Ok(level) => Ok(Some(level.quantity)),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn run_safety_checks(
        &self,
        schedule: &MedicationSchedule,
        medication: &Medication,
        dose: Decimal,
        administered_at: DateTime<Utc>,
    ) -> Result<(Vec<SafetyCheckResult>, Vec<ContraindicationFinding>)> {
        let (interactions, allergies, contraindications) = futures::try_join!(
            self.clinical_service
                .check_interactions(&schedule.resident_id, &medication.id),
            self.clinical_service
                .check_allergies(&schedule.resident_id, &medication.id),
            self.clinical_service
                .check_contraindications(&schedule.resident_id, &medication.id),
        )?;

        let last_given = self
            .repository
            .last_given_for_schedule(&schedule.id)?
            .map(|record| record.administered_at);
        let given_last_24h = self.repository.total_given_since(
            &schedule.resident_id,
            &medication.id,
            administered_at - Duration::hours(24),
        )?;
        let on_hand = self.stock_on_hand(&medication.id)?;

        let checks = vec![
            check_drug_interactions(&interactions),
            check_allergies(&allergies),
            check_duplicate_dose(
                last_given,
                administered_at,
                i64::from(medication.min_interval_minutes),
            ),
            check_max_daily_dose(given_last_24h, dose, medication.max_daily_dose),
            check_timing_window(
                &schedule.times,
                administered_at,
                self.policy.timezone,
                self.policy.timing_window_minutes,
            ),
            check_stock_availability(on_hand, dose),
        ];
        Ok((checks, contraindications))
    }

    /// Decrements stock and evaluates alerts for the medication. The record is
    /// already stored, so a failed decrement is reported, not raised.
    async fn post_administration_stock(
        &self,
        medication_id: &str,
        dose: Decimal,
        warnings: &mut Vec<String>,
    ) -> Vec<StockAlert> {
        match self.stock_service.consume(medication_id, dose).await {
            Ok(level) => evaluate_stock_alerts(&level, Utc::now().date_naive()),
            Err(err) => {
                warn!(
                    "Stock for medication {} not decremented after administration: {}",
                    medication_id, err
                );
                warnings.push(format!("Stock not decremented: {}", err));
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl MedicationServiceTrait for MedicationService {
    fn get_medication(&self, medication_id: &str) -> Result<Medication> {
        self.repository
            .get_medication(medication_id)?
            .ok_or_else(|| Error::not_found(format!("medication {}", medication_id)))
    }

    async fn create_medication(&self, new_medication: NewMedication) -> Result<Medication> {
        if new_medication.name.trim().is_empty() {
            return Err(Error::invalid_input("Medication name is required"));
        }
        if matches!(new_medication.max_daily_dose, Some(max) if max <= Decimal::ZERO) {
            return Err(Error::invalid_input("Maximum daily dose must be positive"));
        }
        if matches!(new_medication.min_interval_minutes, Some(m) if m < 0) {
            return Err(Error::invalid_input("Minimum dose interval cannot be negative"));
        }
        let medication = self.repository.insert_medication(new_medication).await?;
        info!("Created medication {} ({})", medication.id, medication.name);
        Ok(medication)
    }

    async fn create_schedule(
        &self,
        new_schedule: NewMedicationSchedule,
    ) -> Result<MedicationSchedule> {
        if new_schedule.dose <= Decimal::ZERO {
            return Err(Error::invalid_input("Scheduled dose must be positive"));
        }
        if new_schedule.unit.trim().is_empty() {
            return Err(Error::invalid_input("Dose unit is required"));
        }
        self.get_medication(&new_schedule.medication_id)?;
        let schedule = self.repository.insert_schedule(new_schedule).await?;
        debug!(
            "Created schedule {} for resident {}",
            schedule.id, schedule.resident_id
        );
        Ok(schedule)
    }

    async fn discontinue_schedule(&self, schedule_id: &str) -> Result<MedicationSchedule> {
        self.load_schedule(schedule_id)?;
        self.repository
            .update_schedule_status(schedule_id, ScheduleStatus::Discontinued)
            .await
    }

    async fn record_administration(
        &self,
        schedule_id: &str,
        request: AdministrationRequest,
    ) -> Result<AdministrationOutcome> {
        let schedule = self.load_schedule(schedule_id)?;
        if schedule.status != ScheduleStatus::Active {
            return Err(MedicationError::new(
                MedicationErrorCode::ScheduleInactive,
                format!("Schedule {} is {:?}", schedule_id, schedule.status),
            )
            .into());
        }
        if request.status == AdministrationStatus::Pending {
            return Err(MedicationError::new(
                MedicationErrorCode::InvalidStatus,
                "PENDING is not a recordable administration status",
            )
            .into());
        }
        if request.administered_by.trim().is_empty() {
            return Err(Error::invalid_input("Administering staff is required"));
        }
        let dose = request.dose.unwrap_or(schedule.dose);
        if dose <= Decimal::ZERO {
            return Err(Error::invalid_input("Dose must be greater than zero"));
        }
        let administered_at = request.administered_at.unwrap_or_else(Utc::now);
        let medication = self.get_medication(&schedule.medication_id)?;
        let given = request.status == AdministrationStatus::Given;

        let resident_lock = self.resident_lock(&schedule.resident_id).await;
        let _guard = resident_lock.lock().await;

        let mut safety_checks = Vec::new();
        let mut warnings = Vec::new();
        if given {
            self.verify_attestations(&medication, &request).await?;
            let (checks, contraindications) = self
                .run_safety_checks(&schedule, &medication, dose, administered_at)
                .await?;
            safety_checks = checks;
            let (blocking, warned) = self.policy.partition_failures(&safety_checks);
            if !blocking.is_empty() {
                warn!(
                    "Administration of {} to resident {} rejected: {}",
                    medication.id,
                    schedule.resident_id,
                    blocking.join("; ")
                );
                return Err(MedicationError::safety_check_failed(blocking).into());
            }
            warnings = warned;
            for finding in contraindications {
                warn!(
                    "Giving {} to resident {} despite contraindication {}",
                    medication.id, schedule.resident_id, finding.condition
                );
                warnings.push(format!(
                    "{} is contraindicated for {}",
                    medication.name, finding.condition
                ));
            }
        }

        let record = self
            .repository
            .insert_administration(NewMedicationAdministration {
                schedule_id: schedule.id.clone(),
                resident_id: schedule.resident_id.clone(),
                medication_id: medication.id.clone(),
                status: request.status,
                dose,
                administered_by: request.administered_by,
                witnessed_by: request.witnessed_by,
                administered_at,
                notes: request.notes,
            })
            .await?;
        info!(
            "Recorded {:?} administration {} of {} for resident {}",
            record.status, record.id, medication.id, record.resident_id
        );

        let stock_alerts = if given {
            self.post_administration_stock(&medication.id, dose, &mut warnings)
                .await
        } else {
            Vec::new()
        };

        let mut events = vec![DomainEvent::MedicationAdministered {
            record_id: record.id.clone(),
            resident_id: record.resident_id.clone(),
            medication_id: record.medication_id.clone(),
            status: record.status,
        }];
        let interaction_notes = safety_checks
            .iter()
            .filter(|c| c.passed && c.kind == SafetyCheckKind::DrugInteraction)
            .filter_map(|c| c.message.clone());
        for message in warnings.iter().cloned().chain(interaction_notes) {
            events.push(DomainEvent::SafetyWarning {
                resident_id: record.resident_id.clone(),
                medication_id: record.medication_id.clone(),
                message,
            });
        }
        events.extend(
            stock_alerts
                .iter()
                .cloned()
                .map(|alert| DomainEvent::StockAlertRaised { alert }),
        );
        self.event_sink.emit_batch(events);

        Ok(AdministrationOutcome {
            record,
            safety_checks,
            warnings,
            stock_alerts,
        })
    }

    async fn sign_administration(
        &self,
        record_id: &str,
        staff_id: &str,
    ) -> Result<MedicationAdministration> {
        if staff_id.trim().is_empty() {
            return Err(Error::invalid_input("Signing staff is required"));
        }
        self.load_unsigned_record(record_id)?;
        let record = self
            .repository
            .sign_administration(record_id, staff_id, Utc::now())
            .await?;
        info!("Administration record {} signed by {}", record_id, staff_id);
        Ok(record)
    }

    async fn amend_notes(
        &self,
        record_id: &str,
        notes: Option<String>,
    ) -> Result<MedicationAdministration> {
        self.load_unsigned_record(record_id)?;
        self.repository
            .update_administration_notes(record_id, notes)
            .await
    }

    fn list_administrations_for_resident(
        &self,
        resident_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MedicationAdministration>> {
        self.repository
            .list_administrations_for_resident(resident_id, since)
    }

    fn detect_schedule_conflicts(&self, resident_id: &str) -> Result<Vec<ScheduleConflict>> {
        let schedules = self
            .repository
            .list_active_schedules_for_resident(resident_id)?;
        let mut by_medication: HashMap<&str, Vec<&MedicationSchedule>> = HashMap::new();
        for schedule in &schedules {
            by_medication
                .entry(schedule.medication_id.as_str())
                .or_default()
                .push(schedule);
        }

        let mut conflicts = Vec::new();
        for (medication_id, group) in by_medication {
            if group.len() < 2 {
                continue;
            }
            let min_interval = self
                .repository
                .get_medication(medication_id)?
                .map(|m| m.min_interval_minutes)
                .unwrap_or(DEFAULT_MIN_DOSE_INTERVAL_MINUTES);
            for (i, first) in group.iter().enumerate() {
                for second in &group[i + 1..] {
                    for first_time in &first.times {
                        for second_time in &second.times {
                            let gap = minutes_between_times_of_day(*first_time, *second_time);
                            if gap < i64::from(min_interval) {
                                conflicts.push(ScheduleConflict {
                                    medication_id: medication_id.to_string(),
                                    first_schedule_id: first.id.clone(),
                                    second_schedule_id: second.id.clone(),
                                    first_time: *first_time,
                                    second_time: *second_time,
                                    gap_minutes: gap,
                                });
                            }
                        }
                    }
                }
            }
        }
        conflicts.sort_by(|a, b| {
            (&a.medication_id, a.first_time, a.second_time)
                .cmp(&(&b.medication_id, b.first_time, b.second_time))
        });
        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::{
        ClinicalDecisionSupportService, InteractionRepositoryTrait, InteractionSeverity,
        NewDrugInteraction,
    };
    use crate::medications::Enforcement;
    use crate::security::StaffPinService;
    use crate::stock::{StockAlertKind, StockService};
    use crate::test_support::{
        medication, resident, schedule, InMemoryInteractionRepository,
        InMemoryMedicationRepository, InMemoryResidentRepository,
        InMemoryStaffCredentialRepository, InMemoryStockRepository, RecordingEventSink,
    };
    use chrono::{NaiveTime, TimeZone};
    use rust_decimal_macros::dec;

    struct Fixture {
        medications: Arc<InMemoryMedicationRepository>,
        residents: Arc<InMemoryResidentRepository>,
        interactions: Arc<InMemoryInteractionRepository>,
        stock: Arc<StockService>,
        pins: Arc<StaffPinService>,
        sink: Arc<RecordingEventSink>,
    }

    impl Fixture {
        fn service(&self, policy: SafetyPolicy) -> MedicationService {
            let clinical = Arc::new(ClinicalDecisionSupportService::new(
                self.residents.clone(),
                self.medications.clone(),
                self.interactions.clone(),
            ));
            MedicationService::new(
                self.medications.clone(),
                clinical,
                self.stock.clone(),
                self.pins.clone(),
            )
            .with_event_sink(self.sink.clone())
            .with_policy(policy)
        }
    }

    fn eight_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    async fn fixture() -> Fixture {
        let residents = Arc::new(InMemoryResidentRepository::default());
        let mut alice = resident("res-1");
        alice.allergies = vec!["penicillins".to_string()];
        residents.put(alice);

        let medications = Arc::new(InMemoryMedicationRepository::default());
        let mut paracetamol = medication("med-para", "Paracetamol");
        paracetamol.max_daily_dose = Some(dec!(4000));
        paracetamol.min_interval_minutes = 240;
        medications.put_medication(paracetamol);
        let mut para_schedule = schedule("sch-para", "res-1", "med-para", dec!(1000));
        para_schedule.times = vec![
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        ];
        medications.put_schedule(para_schedule);

        let stock = Arc::new(StockService::new(Arc::new(
            InMemoryStockRepository::default(),
        )));
        stock
            .receive_stock("med-para", dec!(10000), None)
            .await
            .expect("seed stock");
        stock
            .set_thresholds("med-para", dec!(2000), dec!(1000))
            .await
            .expect("thresholds");

        let pins = Arc::new(StaffPinService::new(Arc::new(
            InMemoryStaffCredentialRepository::default(),
        )));
        pins.set_pin("nurse-1", "1234").await.expect("pin");
        pins.set_pin("nurse-2", "5678").await.expect("pin");

        Fixture {
            medications,
            residents,
            interactions: Arc::new(InMemoryInteractionRepository::default()),
            stock,
            pins,
            sink: Arc::new(RecordingEventSink::default()),
        }
    }

    fn given_at(at: DateTime<Utc>) -> AdministrationRequest {
        AdministrationRequest {
            status: AdministrationStatus::Given,
            administered_by: "nurse-1".to_string(),
            witnessed_by: None,
            staff_pin: None,
            witness_pin: None,
            administered_at: Some(at),
            dose: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn records_given_dose_and_decrements_stock() {
        let f = fixture().await;
        let service = f.service(SafetyPolicy::default());

        let outcome = service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .expect("recorded");
        assert_eq!(outcome.record.dose, dec!(1000));
        assert_eq!(outcome.safety_checks.len(), 6);
        assert!(outcome.safety_checks.iter().all(|c| c.passed));
        assert!(outcome.warnings.is_empty());
        assert_eq!(
            f.stock.get_stock_level("med-para").unwrap().quantity,
            dec!(9000)
        );
        assert_eq!(f.sink.count("medication_administered"), 1);
    }

    #[tokio::test]
    async fn unknown_and_inactive_schedules_are_rejected() {
        let f = fixture().await;
        let service = f.service(SafetyPolicy::default());

        let err = service
            .record_administration("missing", given_at(eight_am()))
            .await
            .expect_err("unknown schedule");
        assert_eq!(
            err.medication_code(),
            Some(MedicationErrorCode::ScheduleNotFound)
        );

        service
            .discontinue_schedule("sch-para")
            .await
            .expect("discontinue");
        let err = service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .expect_err("inactive schedule");
        assert_eq!(
            err.medication_code(),
            Some(MedicationErrorCode::ScheduleInactive)
        );
    }

    #[tokio::test]
    async fn multiple_failures_are_aggregated() {
        let f = fixture().await;
        let mut amoxicillin = medication("med-amox", "Amoxicillin");
        amoxicillin.allergen_classes = vec!["Penicillins".to_string()];
        f.medications.put_medication(amoxicillin);
        let mut amox_schedule = schedule("sch-amox", "res-1", "med-amox", dec!(500));
        amox_schedule.times = vec![NaiveTime::from_hms_opt(8, 0, 0).unwrap()];
        f.medications.put_schedule(amox_schedule);
        let service = f.service(SafetyPolicy::default());

        // allergic, four hours outside the window, and no stock on file
        let err = service
            .record_administration(
                "sch-amox",
                given_at(eight_am() + Duration::hours(4)),
            )
            .await
            .expect_err("rejected");
        let Error::Medication(rejection) = err else {
            panic!("expected medication error");
        };
        assert_eq!(rejection.code, MedicationErrorCode::SafetyCheckFailed);
        let failures = rejection.details.unwrap()["failures"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(failures, 3);
        assert!(rejection.message.contains("allergic to Penicillins"));
        assert!(rejection.message.contains("No stock record"));
        assert!(f
            .medications
            .list_administrations_for_resident("res-1", None)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_dose_blocks_within_minimum_interval() {
        let f = fixture().await;
        let service = f.service(SafetyPolicy::default());
        service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .expect("first dose");

        let err = service
            .record_administration("sch-para", given_at(eight_am() + Duration::minutes(30)))
            .await
            .expect_err("too soon");
        assert_eq!(
            err.medication_code(),
            Some(MedicationErrorCode::SafetyCheckFailed)
        );
        assert!(err.to_string().contains("already given"));
    }

    #[tokio::test]
    async fn warn_policy_records_with_warnings() {
        let f = fixture().await;
        let service = f.service(
            SafetyPolicy::default()
                .with_enforcement(SafetyCheckKind::TimingWindow, Enforcement::Warn),
        );

        let outcome = service
            .record_administration("sch-para", given_at(eight_am() + Duration::hours(3)))
            .await
            .expect("recorded with warning");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("nearest scheduled time"));
        assert_eq!(f.sink.count("safety_warning"), 1);
    }

    #[tokio::test]
    async fn contraindicated_condition_is_recorded_as_warning() {
        let f = fixture().await;
        let mut alice = resident("res-1");
        alice.allergies = vec!["penicillins".to_string()];
        alice.conditions = vec!["Liver impairment".to_string()];
        f.residents.put(alice);
        let mut paracetamol = f.medications.get_medication("med-para").unwrap().unwrap();
        paracetamol.contraindications = vec!["liver impairment".to_string()];
        f.medications.put_medication(paracetamol);
        let service = f.service(SafetyPolicy::default());

        let outcome = service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .expect("contraindication does not block");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("contraindicated"));
        assert_eq!(f.sink.count("safety_warning"), 1);
        assert_eq!(f.sink.count("medication_administered"), 1);
    }

    #[tokio::test]
    async fn concurrent_doses_for_one_resident_record_once() {
        let f = fixture().await;
        let service = f.service(SafetyPolicy::default());

        let (first, second) = tokio::join!(
            service.record_administration(
                "sch-para",
                given_at(eight_am() + Duration::minutes(10))
            ),
            service.record_administration(
                "sch-para",
                given_at(eight_am() + Duration::minutes(20))
            ),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        let rejected = first.err().or(second.err()).expect("one rejected");
        assert!(rejected.to_string().contains("already given"));
        assert_eq!(
            service
                .list_administrations_for_resident("res-1", None)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            f.stock.get_stock_level("med-para").unwrap().quantity,
            dec!(9000)
        );
    }

    #[tokio::test]
    async fn major_interaction_blocks() {
        let f = fixture().await;
        f.medications.put_medication(medication("med-warf", "Warfarin"));
        f.medications
            .put_schedule(schedule("sch-warf", "res-1", "med-warf", dec!(5)));
        f.interactions
            .insert_interaction(NewDrugInteraction {
                medication_a_id: "med-para".to_string(),
                medication_b_id: "med-warf".to_string(),
                severity: InteractionSeverity::Major,
                description: "Raised INR".to_string(),
            })
            .await
            .expect("interaction");
        let service = f.service(SafetyPolicy::default());

        let err = service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .expect_err("interaction");
        assert!(err.to_string().contains("Warfarin"));
    }

    #[tokio::test]
    async fn refused_dose_skips_checks_and_stock() {
        let f = fixture().await;
        let service = f.service(SafetyPolicy::default());
        let mut request = given_at(eight_am() + Duration::hours(5));
        request.status = AdministrationStatus::Refused;

        let outcome = service
            .record_administration("sch-para", request)
            .await
            .expect("recorded");
        assert!(outcome.safety_checks.is_empty());
        assert_eq!(
            f.stock.get_stock_level("med-para").unwrap().quantity,
            dec!(10000)
        );

        let mut pending = given_at(eight_am());
        pending.status = AdministrationStatus::Pending;
        let err = service
            .record_administration("sch-para", pending)
            .await
            .expect_err("pending");
        assert_eq!(err.medication_code(), Some(MedicationErrorCode::InvalidStatus));
    }

    #[tokio::test]
    async fn controlled_drug_needs_pin_and_witness() {
        let f = fixture().await;
        let mut morphine = medication("med-morph", "Morphine");
        morphine.is_controlled = true;
        f.medications.put_medication(morphine);
        f.medications
            .put_schedule(schedule("sch-morph", "res-1", "med-morph", dec!(10)));
        f.stock
            .receive_stock("med-morph", dec!(100), None)
            .await
            .unwrap();
        let service = f.service(SafetyPolicy::default());

        let mut request = given_at(eight_am());
        request.staff_pin = Some("0000".to_string());
        let err = service
            .record_administration("sch-morph", request.clone())
            .await
            .expect_err("wrong pin");
        assert_eq!(
            err.medication_code(),
            Some(MedicationErrorCode::PinVerificationFailed)
        );

        request.staff_pin = Some("1234".to_string());
        request.witnessed_by = Some("nurse-1".to_string());
        let err = service
            .record_administration("sch-morph", request.clone())
            .await
            .expect_err("self witness");
        assert_eq!(err.medication_code(), Some(MedicationErrorCode::WitnessRequired));

        request.witnessed_by = Some("nurse-2".to_string());
        request.witness_pin = Some("5678".to_string());
        let outcome = service
            .record_administration("sch-morph", request)
            .await
            .expect("witnessed");
        assert_eq!(outcome.record.witnessed_by.as_deref(), Some("nurse-2"));
    }

    #[tokio::test]
    async fn stock_alerts_follow_administration() {
        let f = fixture().await;
        f.stock
            .consume("med-para", dec!(8500))
            .await
            .expect("draw down");
        let service = f.service(SafetyPolicy::default());

        let outcome = service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .expect("recorded");
        assert_eq!(outcome.stock_alerts.len(), 1);
        assert_eq!(outcome.stock_alerts[0].kind, StockAlertKind::Critical);
        assert_eq!(f.sink.count("stock_alert_raised"), 1);
    }

    #[tokio::test]
    async fn signed_records_are_immutable() {
        let f = fixture().await;
        let service = f.service(SafetyPolicy::default());
        let outcome = service
            .record_administration("sch-para", given_at(eight_am()))
            .await
            .unwrap();
        let id = outcome.record.id;

        service
            .amend_notes(&id, Some("Taken with food".to_string()))
            .await
            .expect("amend unsigned");
        let signed = service
            .sign_administration(&id, "nurse-1")
            .await
            .expect("sign");
        assert!(signed.is_signed());
        assert_eq!(signed.notes.as_deref(), Some("Taken with food"));

        let err = service
            .sign_administration(&id, "nurse-2")
            .await
            .expect_err("sign twice");
        assert_eq!(err.medication_code(), Some(MedicationErrorCode::RecordSigned));
        let err = service
            .amend_notes(&id, None)
            .await
            .expect_err("amend signed");
        assert_eq!(err.medication_code(), Some(MedicationErrorCode::RecordSigned));
    }

    #[tokio::test]
    async fn overlapping_schedules_of_same_medication_conflict() {
        let f = fixture().await;
        let mut extra = schedule("sch-para-2", "res-1", "med-para", dec!(500));
        extra.times = vec![
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        ];
        f.medications.put_schedule(extra);
        let service = f.service(SafetyPolicy::default());

        let conflicts = service.detect_schedule_conflicts("res-1").expect("conflicts");
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].gap_minutes, 90);
        assert_eq!(conflicts[0].second_schedule_id, "sch-para-2");
    }
}
