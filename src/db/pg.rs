use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{self, AppointmentQuery, DirectoryQuery, OVERLAP_MESSAGE, Store};
use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentInput, NewUser, Patient, PatientInput, Provider, ProviderInput, User,
};

/// SQLSTATE raised by the `appointments_no_overlap` exclusion constraint.
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_user_write(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            if db_err.constraint().is_some_and(|c| c.contains("email")) {
                AppError::Conflict("Email already exists".to_string())
            } else {
                AppError::Conflict("Username already exists".to_string())
            }
        }
        _ => AppError::Database(e),
    }
}

fn map_appointment_write(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err)
            if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) =>
        {
            AppError::Conflict(OVERLAP_MESSAGE.to_string())
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::BadRequest("Patient or provider does not exist".to_string())
        }
        sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
            AppError::BadRequest("StartsAtUtc must be before EndsAtUtc".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(db::users::find_active_by_username(&self.pool, username).await?)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(db::users::username_exists(&self.pool, username).await?)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(db::users::email_exists(&self.pool, email).await?)
    }

    async fn create_user(&self, new: &NewUser<'_>) -> Result<User, AppError> {
        db::users::create(&self.pool, new)
            .await
            .map_err(map_user_write)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        Ok(db::users::update_last_login(&self.pool, id, at).await?)
    }

    async fn list_patients(&self, query: &DirectoryQuery) -> Result<Vec<Patient>, AppError> {
        Ok(db::patients::list(&self.pool, query).await?)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        Ok(db::patients::find_by_id(&self.pool, id).await?)
    }

    async fn create_patient(&self, input: &PatientInput) -> Result<Patient, AppError> {
        Ok(db::patients::create(&self.pool, input).await?)
    }

    async fn update_patient(
        &self,
        id: Uuid,
        input: &PatientInput,
    ) -> Result<Option<Patient>, AppError> {
        Ok(db::patients::update(&self.pool, id, input).await?)
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(db::patients::delete(&self.pool, id).await?)
    }

    async fn list_providers(&self, query: &DirectoryQuery) -> Result<Vec<Provider>, AppError> {
        Ok(db::providers::list(&self.pool, query).await?)
    }

    async fn find_provider(&self, id: Uuid) -> Result<Option<Provider>, AppError> {
        Ok(db::providers::find_by_id(&self.pool, id).await?)
    }

    async fn create_provider(&self, input: &ProviderInput) -> Result<Provider, AppError> {
        Ok(db::providers::create(&self.pool, input).await?)
    }

    async fn update_provider(
        &self,
        id: Uuid,
        input: &ProviderInput,
    ) -> Result<Option<Provider>, AppError> {
        Ok(db::providers::update(&self.pool, id, input).await?)
    }

    async fn delete_provider(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(db::providers::delete(&self.pool, id).await?)
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(db::appointments::list(&self.pool, query).await?)
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        Ok(db::appointments::find_by_id(&self.pool, id).await?)
    }

    async fn find_overlapping(
        &self,
        provider_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(
            db::appointments::find_overlapping(&self.pool, provider_id, starts_at, ends_at, exclude)
                .await?,
        )
    }

    async fn insert_appointment(&self, input: &AppointmentInput) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;
        db::appointments::lock_provider(&mut *tx, input.provider_id).await?;

        let clashes = db::appointments::find_overlapping(
            &mut *tx,
            input.provider_id,
            input.starts_at_utc,
            input.ends_at_utc,
            None,
        )
        .await?;
        if !clashes.is_empty() {
            return Err(AppError::Conflict(OVERLAP_MESSAGE.to_string()));
        }

        let appointment = db::appointments::create(&mut *tx, input)
            .await
            .map_err(map_appointment_write)?;
        tx.commit().await.map_err(map_appointment_write)?;
        Ok(appointment)
    }

    async fn replace_appointment(
        &self,
        id: Uuid,
        input: &AppointmentInput,
    ) -> Result<Option<Appointment>, AppError> {
        let mut tx = self.pool.begin().await?;
        db::appointments::lock_provider(&mut *tx, input.provider_id).await?;

        let clashes = db::appointments::find_overlapping(
            &mut *tx,
            input.provider_id,
            input.starts_at_utc,
            input.ends_at_utc,
            Some(id),
        )
        .await?;
        if !clashes.is_empty() {
            return Err(AppError::Conflict(OVERLAP_MESSAGE.to_string()));
        }

        let appointment = db::appointments::update(&mut *tx, id, input)
            .await
            .map_err(map_appointment_write)?;
        tx.commit().await.map_err(map_appointment_write)?;
        Ok(appointment)
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(db::appointments::delete(&self.pool, id).await?)
    }
}
