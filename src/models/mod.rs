pub mod appointment;
pub mod patient;
pub mod provider;
pub mod user;

pub use appointment::{Appointment, AppointmentInput};
pub use patient::{Patient, PatientInput};
pub use provider::{Provider, ProviderInput};
pub use user::{NewUser, Role, User};
