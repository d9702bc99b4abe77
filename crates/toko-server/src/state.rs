use toko_core::{AccountService, Collection, LoginRateLimiter};
use toko_db::{AccountRepository, Database};

use crate::auth::JwtKeys;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtKeys,
    pub login_limiter: LoginRateLimiter,
    /// Honor `X-Forwarded-For` when identifying login clients.
    pub trust_proxy: bool,
    /// Mount point of the API routes; empty means the root.
    pub api_prefix: String,
    pub hash_cost: u32,
}

impl AppState {
    /// Account operations over one collection.
    pub fn accounts(&self, collection: Collection) -> AccountService<AccountRepository> {
        AccountService::new(self.db.accounts(collection), collection).with_hash_cost(self.hash_cost)
    }
}
