use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{AppointmentQuery, DirectoryQuery, OVERLAP_MESSAGE, Store};
use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentInput, NewUser, Patient, PatientInput, Provider, ProviderInput, User,
};

/// In-process store used by the test suite and by `CLINIC_STORE=memory`.
///
/// All tables sit behind one lock, so every write (including the appointment
/// overlap re-check) is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    patients: HashMap<Uuid, Patient>,
    providers: HashMap<Uuid, Provider>,
    appointments: HashMap<Uuid, Appointment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these accounts already stored, as an operator would have
    /// provisioned (or disabled) them.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            tables: RwLock::new(Tables {
                users,
                ..Tables::default()
            }),
        }
    }
}

impl Tables {
    fn check_references(&self, input: &AppointmentInput) -> Result<(), AppError> {
        if !self.patients.contains_key(&input.patient_id)
            || !self.providers.contains_key(&input.provider_id)
        {
            return Err(AppError::BadRequest(
                "Patient or provider does not exist".to_string(),
            ));
        }
        Ok(())
    }

    fn overlapping(
        &self,
        provider_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Vec<Appointment> {
        let mut found: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| a.provider_id == provider_id && Some(a.id) != exclude)
            .filter(|a| a.overlaps(starts_at, ends_at))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.starts_at_utc);
        found
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn take(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.is_active && u.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.email == email))
    }

    async fn create_user(&self, new: &NewUser<'_>) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == new.username) {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: new.username.to_string(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
            role: new.role,
            is_active: true,
            created_at_utc: Utc::now(),
            last_login_utc: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&id) {
            user.last_login_utc = Some(at);
        }
        Ok(())
    }

    async fn list_patients(&self, query: &DirectoryQuery) -> Result<Vec<Patient>, AppError> {
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut patients: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| match &needle {
                Some(s) => contains_ci(&p.full_name, s) || contains_ci(&p.email, s),
                None => true,
            })
            .cloned()
            .collect();
        patients.sort_by_key(|p| Reverse((p.created_at_utc, p.id)));
        patients.truncate(take(query.limit));
        Ok(patients)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        Ok(self.tables.read().await.patients.get(&id).cloned())
    }

    async fn create_patient(&self, input: &PatientInput) -> Result<Patient, AppError> {
        let patient = Patient {
            id: Uuid::now_v7(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            date_of_birth: input.date_of_birth,
            created_at_utc: Utc::now(),
        };
        let mut tables = self.tables.write().await;
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn update_patient(
        &self,
        id: Uuid,
        input: &PatientInput,
    ) -> Result<Option<Patient>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.patients.get_mut(&id).map(|p| {
            p.full_name = input.full_name.clone();
            p.email = input.email.clone();
            p.date_of_birth = input.date_of_birth;
            p.clone()
        }))
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables.patients.remove(&id).is_some();
        if removed {
            tables.appointments.retain(|_, a| a.patient_id != id);
        }
        Ok(removed)
    }

    async fn list_providers(&self, query: &DirectoryQuery) -> Result<Vec<Provider>, AppError> {
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut providers: Vec<Provider> = tables
            .providers
            .values()
            .filter(|p| match &needle {
                Some(s) => {
                    contains_ci(&p.full_name, s)
                        || contains_ci(&p.specialty, s)
                        || contains_ci(&p.email, s)
                }
                None => true,
            })
            .cloned()
            .collect();
        providers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        providers.truncate(take(query.limit));
        Ok(providers)
    }

    async fn find_provider(&self, id: Uuid) -> Result<Option<Provider>, AppError> {
        Ok(self.tables.read().await.providers.get(&id).cloned())
    }

    async fn create_provider(&self, input: &ProviderInput) -> Result<Provider, AppError> {
        let provider = Provider {
            id: Uuid::now_v7(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            specialty: input.specialty.clone().unwrap_or_default(),
            created_at_utc: Utc::now(),
        };
        let mut tables = self.tables.write().await;
        tables.providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn update_provider(
        &self,
        id: Uuid,
        input: &ProviderInput,
    ) -> Result<Option<Provider>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.providers.get_mut(&id).map(|p| {
            p.full_name = input.full_name.clone();
            p.email = input.email.clone();
            p.specialty = input.specialty.clone().unwrap_or_default();
            p.clone()
        }))
    }

    async fn delete_provider(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables.providers.remove(&id).is_some();
        if removed {
            tables.appointments.retain(|_, a| a.provider_id != id);
        }
        Ok(removed)
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        let tables = self.tables.read().await;
        let needle = query.search_text.as_deref().map(str::to_lowercase);
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| match &needle {
                Some(s) => {
                    contains_ci(&a.patient_id.to_string(), s)
                        || contains_ci(&a.provider_id.to_string(), s)
                        || a.notes.as_deref().is_some_and(|n| contains_ci(n, s))
                }
                None => true,
            })
            .filter(|a| query.from_utc.is_none_or(|from| a.starts_at_utc >= from))
            .filter(|a| query.to_utc.is_none_or(|to| a.ends_at_utc <= to))
            .filter(|a| query.provider_id.is_none_or(|p| a.provider_id == p))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| Reverse(a.starts_at_utc));
        appointments.truncate(take(query.limit));
        Ok(appointments)
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        Ok(self.tables.read().await.appointments.get(&id).cloned())
    }

    async fn find_overlapping(
        &self,
        provider_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.overlapping(provider_id, starts_at, ends_at, exclude))
    }

    async fn insert_appointment(&self, input: &AppointmentInput) -> Result<Appointment, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_references(input)?;
        if !tables
            .overlapping(input.provider_id, input.starts_at_utc, input.ends_at_utc, None)
            .is_empty()
        {
            return Err(AppError::Conflict(OVERLAP_MESSAGE.to_string()));
        }

        let appointment = Appointment {
            id: Uuid::now_v7(),
            patient_id: input.patient_id,
            provider_id: input.provider_id,
            starts_at_utc: input.starts_at_utc,
            ends_at_utc: input.ends_at_utc,
            notes: input.notes.clone(),
            created_at_utc: Utc::now(),
        };
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn replace_appointment(
        &self,
        id: Uuid,
        input: &AppointmentInput,
    ) -> Result<Option<Appointment>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.appointments.contains_key(&id) {
            return Ok(None);
        }
        tables.check_references(input)?;
        if !tables
            .overlapping(input.provider_id, input.starts_at_utc, input.ends_at_utc, Some(id))
            .is_empty()
        {
            return Err(AppError::Conflict(OVERLAP_MESSAGE.to_string()));
        }

        Ok(tables.appointments.get_mut(&id).map(|a| {
            a.patient_id = input.patient_id;
            a.provider_id = input.provider_id;
            a.starts_at_utc = input.starts_at_utc;
            a.ends_at_utc = input.ends_at_utc;
            a.notes = input.notes.clone();
            a.clone()
        }))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.appointments.remove(&id).is_some())
    }
}
