use diesel::prelude::*;

/// Argon2 PHC string per staff member. Plain PINs are never stored.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::staff_credentials)]
#[diesel(primary_key(staff_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StaffCredentialDB {
    pub staff_id: String,
    pub pin_hash: String,
    pub updated_at: String,
}
