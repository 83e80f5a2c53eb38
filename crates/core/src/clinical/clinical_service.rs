use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use rust_decimal::Decimal;

use super::{
    AllergyFinding, ClinicalDecisionSupportServiceTrait, ClinicalSafetyReport,
    ContraindicationFinding, DosageValidation, InteractionFinding, InteractionRepositoryTrait,
    InteractionSeverity, SafetyAssessment,
};
use crate::errors::{Error, Result};
use crate::medications::{Medication, MedicationRepositoryTrait};
use crate::residents::{Resident, ResidentRepositoryTrait};

pub struct ClinicalDecisionSupportService {
    resident_repository: Arc<dyn ResidentRepositoryTrait>,
    medication_repository: Arc<dyn MedicationRepositoryTrait>,
    interaction_repository: Arc<dyn InteractionRepositoryTrait>,
}

impl ClinicalDecisionSupportService {
    pub fn new(
        resident_repository: Arc<dyn ResidentRepositoryTrait>,
        medication_repository: Arc<dyn MedicationRepositoryTrait>,
        interaction_repository: Arc<dyn InteractionRepositoryTrait>,
    ) -> Self {
        Self {
            resident_repository,
            medication_repository,
            interaction_repository,
        }
    }

    fn load_resident(&self, resident_id: &str) -> Result<Resident> {
        self.resident_repository
            .get_resident(resident_id)?
            .ok_or_else(|| Error::not_found(format!("resident {}", resident_id)))
    }

    fn load_medication(&self, medication_id: &str) -> Result<Medication> {
        self.medication_repository
            .get_medication(medication_id)?
            .ok_or_else(|| Error::not_found(format!("medication {}", medication_id)))
    }

    fn medication_name(&self, medication_id: &str) -> String {
        self.medication_repository
            .get_medication(medication_id)
            .ok()
            .flatten()
            .map(|m| m.name)
            .unwrap_or_else(|| medication_id.to_string())
    }
}

fn assess(
    interactions: &[InteractionFinding],
    allergies: &[AllergyFinding],
    contraindications: &[ContraindicationFinding],
    dosage: &DosageValidation,
) -> SafetyAssessment {
    let worst_interaction = interactions.iter().map(|i| i.severity).max();
    if !allergies.is_empty()
        || !contraindications.is_empty()
        || worst_interaction == Some(InteractionSeverity::Contraindicated)
    {
        return SafetyAssessment::Contraindicated;
    }
    if !dosage.valid || worst_interaction == Some(InteractionSeverity::Major) {
        return SafetyAssessment::HighRisk;
    }
    if worst_interaction.is_some() {
        return SafetyAssessment::CautionRecommended;
    }
    SafetyAssessment::Safe
}

fn recommendations(
    interactions: &[InteractionFinding],
    allergies: &[AllergyFinding],
    contraindications: &[ContraindicationFinding],
    dosage: &DosageValidation,
) -> Vec<String> {
    let mut out = Vec::new();
    for allergy in allergies {
        out.push(format!(
            "Do not administer: resident is allergic to {}",
            allergy.allergen
        ));
    }
    for contraindication in contraindications {
        out.push(format!(
            "Review with prescriber: contraindicated with {}",
            contraindication.condition
        ));
    }
    for interaction in interactions {
        let line = match interaction.severity {
            InteractionSeverity::Contraindicated | InteractionSeverity::Major => format!(
                "Consult a pharmacist before giving with {}",
                interaction.interacting_medication_name
            ),
            InteractionSeverity::Moderate | InteractionSeverity::Minor => format!(
                "Monitor for effects of the interaction with {}",
                interaction.interacting_medication_name
            ),
        };
        out.push(line);
    }
    if !dosage.valid {
        if let Some(message) = &dosage.message {
            out.push(format!("Withhold dose: {}", message));
        }
    }
    if out.is_empty() {
        out.push("No safety concerns identified".to_string());
    }
    out
}

#[async_trait]
impl ClinicalDecisionSupportServiceTrait for ClinicalDecisionSupportService {
    async fn check_interactions(
        &self,
        resident_id: &str,
        medication_id: &str,
    ) -> Result<Vec<InteractionFinding>> {
        let others: Vec<String> = self
            .medication_repository
            .list_active_schedules_for_resident(resident_id)?
            .into_iter()
            .map(|s| s.medication_id)
            .filter(|id| id != medication_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if others.is_empty() {
            return Ok(Vec::new());
        }

        let interactions = self
            .interaction_repository
            .find_interactions(medication_id, &others)?;
        Ok(interactions
            .into_iter()
            .filter_map(|interaction| {
                let other = interaction.counterpart(medication_id)?.to_string();
                Some(InteractionFinding {
                    interacting_medication_name: self.medication_name(&other),
                    interacting_medication_id: other,
                    severity: interaction.severity,
                    description: interaction.description,
                })
            })
            .collect())
    }

    async fn check_allergies(
        &self,
        resident_id: &str,
        medication_id: &str,
    ) -> Result<Vec<AllergyFinding>> {
        let resident = self.load_resident(resident_id)?;
        let medication = self.load_medication(medication_id)?;
        Ok(medication
            .allergen_classes
            .iter()
            .filter(|allergen| resident.has_allergy(allergen))
            .map(|allergen| AllergyFinding {
                allergen: allergen.clone(),
            })
            .collect())
    }

    async fn check_contraindications(
        &self,
        resident_id: &str,
        medication_id: &str,
    ) -> Result<Vec<ContraindicationFinding>> {
        let resident = self.load_resident(resident_id)?;
        let medication = self.load_medication(medication_id)?;
        Ok(medication
            .contraindications
            .iter()
            .filter(|condition| resident.has_condition(condition))
            .map(|condition| ContraindicationFinding {
                condition: condition.clone(),
            })
            .collect())
    }

    async fn validate_dosage(
        &self,
        resident_id: &str,
        medication_id: &str,
        dose: Decimal,
        at: DateTime<Utc>,
    ) -> Result<DosageValidation> {
        if dose <= Decimal::ZERO {
            return Err(Error::invalid_input("Dose must be greater than zero"));
        }
        let medication = self.load_medication(medication_id)?;
        let given_last_24h = self.medication_repository.total_given_since(
            resident_id,
            medication_id,
            at - Duration::hours(24),
        )?;

        let Some(max) = medication.max_daily_dose else {
            return Ok(DosageValidation {
                valid: true,
                proposed_dose: dose,
                given_last_24h,
                max_daily_dose: None,
                remaining_allowance: None,
                message: None,
            });
        };

        let remaining = (max - given_last_24h).max(Decimal::ZERO);
        let valid = given_last_24h + dose <= max;
        let message = (!valid).then(|| {
            format!(
                "24 hour maximum of {} would be exceeded ({} already given)",
                max.normalize(),
                given_last_24h.normalize()
            )
        });
        Ok(DosageValidation {
            valid,
            proposed_dose: dose,
            given_last_24h,
            max_daily_dose: Some(max),
            remaining_allowance: Some(remaining),
            message,
        })
    }

    async fn perform_safety_check(
        &self,
        resident_id: &str,
        medication_id: &str,
        dose: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ClinicalSafetyReport> {
        let (interactions, allergies, contraindications, dosage) = futures::try_join!(
            self.check_interactions(resident_id, medication_id),
            self.check_allergies(resident_id, medication_id),
            self.check_contraindications(resident_id, medication_id),
            self.validate_dosage(resident_id, medication_id, dose, at),
        )?;

        let assessment = assess(&interactions, &allergies, &contraindications, &dosage);
        debug!(
            "Clinical safety check for resident {} medication {}: {:?}",
            resident_id, medication_id, assessment
        );
        let recommendations = recommendations(&interactions, &allergies, &contraindications, &dosage);

        Ok(ClinicalSafetyReport {
            resident_id: resident_id.to_string(),
            medication_id: medication_id.to_string(),
            assessment,
            interactions,
            allergies,
            contraindications,
            dosage,
            recommendations,
        })
    }
}
