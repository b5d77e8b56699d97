pub mod extractor;
pub mod jwt;
pub mod password;
pub mod service;

pub use extractor::AuthUser;
pub use service::{AuthResponse, AuthService, Registration};
