use std::sync::Arc;

use uuid::Uuid;

use crate::db::{OVERLAP_MESSAGE, Store};
use crate::error::AppError;
use crate::models::{Appointment, AppointmentInput};

/// Decides whether an appointment may be booked and books it.
///
/// Checks run in order: time range, referenced patient and provider, then
/// provider availability. The store repeats the availability check atomically
/// with the write, so two concurrent bookings for the same slot cannot both win.
pub struct Scheduler {
    store: Arc<dyn Store>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn schedule(&self, input: &AppointmentInput) -> Result<Appointment, AppError> {
        validate_range(input)?;
        self.ensure_participants(input).await?;
        self.ensure_available(input, None).await?;

        let appointment = self.store.insert_appointment(input).await?;
        tracing::info!(
            appointment_id = %appointment.id,
            provider_id = %appointment.provider_id,
            "Appointment booked"
        );
        Ok(appointment)
    }

    /// Full replace of an existing appointment. The appointment never conflicts with itself.
    pub async fn reschedule(
        &self,
        id: Uuid,
        input: &AppointmentInput,
    ) -> Result<Appointment, AppError> {
        validate_range(input)?;

        if self.store.find_appointment(id).await?.is_none() {
            return Err(AppError::not_found("Appointment"));
        }

        self.ensure_participants(input).await?;
        self.ensure_available(input, Some(id)).await?;

        self.store
            .replace_appointment(id, input)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment"))
    }

    async fn ensure_participants(&self, input: &AppointmentInput) -> Result<(), AppError> {
        if self.store.find_patient(input.patient_id).await?.is_none() {
            return Err(AppError::BadRequest("Patient does not exist".to_string()));
        }
        if self.store.find_provider(input.provider_id).await?.is_none() {
            return Err(AppError::BadRequest("Provider does not exist".to_string()));
        }
        Ok(())
    }

    async fn ensure_available(
        &self,
        input: &AppointmentInput,
        exclude: Option<Uuid>,
    ) -> Result<(), AppError> {
        let clashes = self
            .store
            .find_overlapping(
                input.provider_id,
                input.starts_at_utc,
                input.ends_at_utc,
                exclude,
            )
            .await?;

        if let Some(first) = clashes.first() {
            tracing::debug!(
                provider_id = %input.provider_id,
                clashing_id = %first.id,
                "Rejected overlapping appointment"
            );
            return Err(AppError::Conflict(OVERLAP_MESSAGE.to_string()));
        }
        Ok(())
    }
}

fn validate_range(input: &AppointmentInput) -> Result<(), AppError> {
    if input.starts_at_utc >= input.ends_at_utc {
        return Err(AppError::BadRequest(
            "StartsAtUtc must be before EndsAtUtc".to_string(),
        ));
    }
    Ok(())
}
