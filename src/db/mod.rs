pub mod appointments;
pub mod memory;
pub mod patients;
pub mod pg;
pub mod providers;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentInput, NewUser, Patient, PatientInput, Provider, ProviderInput, User,
};

pub use memory::MemoryStore;
pub use pg::PgStore;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// Clamp a caller-supplied page size into `[1, MAX_LIMIT]`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Substring pattern for `ILIKE ... ESCAPE '\'`. `%`, `_` and `\` in the
/// search text match literally.
pub fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct AppointmentQuery {
    pub search_text: Option<String>,
    pub from_utc: Option<DateTime<Utc>>,
    pub to_utc: Option<DateTime<Utc>>,
    pub provider_id: Option<Uuid>,
    pub limit: i64,
}

/// Persistence for every entity the API serves.
///
/// Unique and overlap violations come back as `AppError::Conflict`; a missing
/// patient or provider referenced by an appointment comes back as
/// `AppError::BadRequest`. Everything else is a server error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;
    async fn create_user(&self, new: &NewUser<'_>) -> Result<User, AppError>;
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;

    async fn list_patients(&self, query: &DirectoryQuery) -> Result<Vec<Patient>, AppError>;
    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, AppError>;
    async fn create_patient(&self, input: &PatientInput) -> Result<Patient, AppError>;
    async fn update_patient(
        &self,
        id: Uuid,
        input: &PatientInput,
    ) -> Result<Option<Patient>, AppError>;
    async fn delete_patient(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_providers(&self, query: &DirectoryQuery) -> Result<Vec<Provider>, AppError>;
    async fn find_provider(&self, id: Uuid) -> Result<Option<Provider>, AppError>;
    async fn create_provider(&self, input: &ProviderInput) -> Result<Provider, AppError>;
    async fn update_provider(
        &self,
        id: Uuid,
        input: &ProviderInput,
    ) -> Result<Option<Provider>, AppError>;
    async fn delete_provider(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, AppError>;
    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;
    /// Appointments of `provider_id` intersecting `[starts_at, ends_at)`, minus `exclude`.
    async fn find_overlapping(
        &self,
        provider_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppError>;
    /// Inserts unless the provider is already booked for the range. The overlap
    /// re-check and the insert are atomic with respect to other writers.
    async fn insert_appointment(&self, input: &AppointmentInput) -> Result<Appointment, AppError>;
    async fn replace_appointment(
        &self,
        id: Uuid,
        input: &AppointmentInput,
    ) -> Result<Option<Appointment>, AppError>;
    async fn delete_appointment(&self, id: Uuid) -> Result<bool, AppError>;
}

pub(crate) const OVERLAP_MESSAGE: &str = "Overlapping appointment for provider";
