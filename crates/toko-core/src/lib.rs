pub mod accounts;
pub mod error;
pub mod list;
pub mod models;
pub mod query;
pub mod rate_limit;
pub mod testutil;
pub mod traits;

pub use accounts::{AccountService, ChangePassword, CreateAccount};
pub use error::AppError;
pub use list::{ListRecord, PageResult, execute_list};
pub use models::{Account, Collection};
pub use query::{ListQuery, RawListParams, build_list_query};
pub use rate_limit::{LoginRateLimiter, RateLimitConfig, RateLimitDecision};
pub use traits::{AccountStore, RecordStore};
