use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use carehome_core::clinical::{DrugInteraction, InteractionRepositoryTrait, NewDrugInteraction};
use carehome_core::errors::Error;
use carehome_core::Result;

use super::model::DrugInteractionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::drug_interactions;

pub struct InteractionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InteractionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        InteractionRepository { pool, writer }
    }
}

#[async_trait]
impl InteractionRepositoryTrait for InteractionRepository {
    fn find_interactions(
        &self,
        medication_id: &str,
        other_medication_ids: &[String],
    ) -> Result<Vec<DrugInteraction>> {
        if other_medication_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        // Pairs are unordered, so match the medication on either side.
        drug_interactions::table
            .filter(
                drug_interactions::medication_a_id
                    .eq(medication_id)
                    .and(drug_interactions::medication_b_id.eq_any(other_medication_ids))
                    .or(drug_interactions::medication_b_id
                        .eq(medication_id)
                        .and(drug_interactions::medication_a_id.eq_any(other_medication_ids))),
            )
            .order(drug_interactions::id.asc())
            .load::<DrugInteractionDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(DrugInteractionDB::into_domain)
            .collect()
    }

    async fn insert_interaction(&self, interaction: NewDrugInteraction) -> Result<DrugInteraction> {
        if interaction.medication_a_id == interaction.medication_b_id {
            return Err(Error::invalid_input(
                "An interaction needs two different medications",
            ));
        }
        let row = DrugInteractionDB::from_domain(&DrugInteraction {
            id: Uuid::now_v7().to_string(),
            medication_a_id: interaction.medication_a_id,
            medication_b_id: interaction.medication_b_id,
            severity: interaction.severity,
            description: interaction.description,
        })?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DrugInteraction> {
                diesel::insert_into(drug_interactions::table)
                    .values(&row)
                    .returning(DrugInteractionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }
}
