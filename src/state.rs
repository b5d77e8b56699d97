use std::sync::Arc;

use crate::auth::AuthService;
use crate::auth::jwt::TokenSigner;
use crate::auth::password::PasswordHasher;
use crate::clock::Clock;
use crate::config::Config;
use crate::db::Store;
use crate::flags::FeatureFlagProvider;
use crate::rate_limit::LoginRateLimiter;
use crate::scheduling::Scheduler;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub tokens: Arc<TokenSigner>,
    pub auth: AuthService,
    pub scheduler: Scheduler,
    pub flags: Arc<dyn FeatureFlagProvider>,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    /// Wire every service from its collaborators. Nothing here reads the environment.
    pub fn new(
        store: Arc<dyn Store>,
        flags: Arc<dyn FeatureFlagProvider>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> SharedState {
        let tokens = Arc::new(TokenSigner::new(&config.jwt, clock.clone()));
        let auth = AuthService::new(
            store.clone(),
            tokens.clone(),
            PasswordHasher::new(config.bcrypt_cost),
            clock,
        );
        let scheduler = Scheduler::new(store.clone());

        Arc::new(AppState {
            store,
            config,
            tokens,
            auth,
            scheduler,
            flags,
            login_limiter: LoginRateLimiter::new(),
        })
    }
}
