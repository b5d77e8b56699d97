/// Work factor used for every stored password hash.
pub const DEFAULT_COST: u32 = 12;

/// bcrypt hashing with a configurable cost. Both operations are CPU bound and
/// run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String, String> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| format!("Hashing task failed: {e}"))?
            .map_err(|e| format!("Hashing failed: {e}"))
    }

    /// Verify a password against a stored hash. A hash that cannot be parsed never matches.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, String> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| format!("Verification task failed: {e}"))?;

        match outcome {
            Ok(valid) => Ok(valid),
            Err(e) => {
                tracing::warn!("Stored password hash rejected: {e}");
                Ok(false)
            }
        }
    }
}
