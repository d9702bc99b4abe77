//! Account operations shared by the `users` and `toko` collections.

use uuid::Uuid;

use crate::error::AppError;
use crate::list::{ListRecord, PageResult, execute_list};
use crate::models::{Account, AccountUpdate, Collection, LookupField, NewAccount, normalize_email};
use crate::query::{RawListParams, build_list_query};
use crate::traits::AccountStore;

/// bcrypt work factor used unless overridden.
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

const ERR_PASSWORD_MISMATCH: &str = "Password confirmation mismatched";
const ERR_EMAIL_TAKEN: &str = "Email is already registered";
const ERR_WRONG_PASSWORD: &str = "Wrong password";
const ERR_WRONG_LOGIN: &str = "Wrong email or password";

/// Input for [`AccountService::create`].
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Input for [`AccountService::change_password`].
#[derive(Debug, Clone)]
pub struct ChangePassword {
    pub password_old: String,
    pub password_new: String,
    pub password_confirm: String,
}

/// CRUD, password and login logic over one account collection.
pub struct AccountService<S: AccountStore> {
    store: S,
    collection: Collection,
    hash_cost: u32,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S, collection: Collection) -> Self {
        Self {
            store,
            collection,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    /// Override the bcrypt cost (lower it in tests).
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Paginated, searchable, sortable listing.
    pub async fn list(&self, params: &RawListParams) -> Result<PageResult<Account>, AppError> {
        let query = build_list_query(params, &Account::LIST_FIELDS)?;
        execute_list(&self.store, &query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Account, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    pub async fn create(&self, request: CreateAccount) -> Result<Account, AppError> {
        if request.password != request.password_confirm {
            return Err(AppError::InvalidPassword(ERR_PASSWORD_MISMATCH.to_string()));
        }

        let email = normalize_email(&request.email);
        if self
            .store
            .find_by_field(LookupField::Email, &email)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateKey(ERR_EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password(request.password, self.hash_cost).await?;
        let account = self
            .store
            .insert(&NewAccount {
                name: request.name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        tracing::info!(
            collection = %self.collection,
            id = %account.id,
            "Account created"
        );
        Ok(account)
    }

    pub async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        if let Some(existing) = self.store.find_by_field(LookupField::Email, &email).await?
            && existing.id != id
        {
            return Err(AppError::DuplicateKey(ERR_EMAIL_TAKEN.to_string()));
        }

        let update = AccountUpdate {
            name: name.trim().to_string(),
            email,
        };
        if !self.store.update_by_id(id, &update).await? {
            return Err(self.not_found(id));
        }

        tracing::info!(collection = %self.collection, %id, "Account updated");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_by_id(id).await? {
            return Err(self.not_found(id));
        }

        tracing::info!(collection = %self.collection, %id, "Account deleted");
        Ok(())
    }

    pub async fn change_password(&self, id: Uuid, request: ChangePassword) -> Result<(), AppError> {
        if request.password_new != request.password_confirm {
            return Err(AppError::InvalidPassword(ERR_PASSWORD_MISMATCH.to_string()));
        }

        let account = self.get(id).await?;
        if !verify_password(request.password_old, account.password_hash).await? {
            return Err(AppError::InvalidCredentials(ERR_WRONG_PASSWORD.to_string()));
        }

        let password_hash = hash_password(request.password_new, self.hash_cost).await?;
        if !self.store.update_password(id, &password_hash).await? {
            return Err(self.not_found(id));
        }

        tracing::info!(collection = %self.collection, %id, "Password changed");
        Ok(())
    }

    /// Check an email/password pair. Unknown emails and wrong passwords
    /// fail with the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let email = normalize_email(email);
        let Some(account) = self.store.find_by_field(LookupField::Email, &email).await? else {
            return Err(AppError::InvalidCredentials(ERR_WRONG_LOGIN.to_string()));
        };

        if !verify_password(password.to_string(), account.password_hash.clone()).await? {
            return Err(AppError::InvalidCredentials(ERR_WRONG_LOGIN.to_string()));
        }

        Ok(account)
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::NotFound(format!("Unknown {}: {id}", self.collection.label()))
    }
}

/// bcrypt is CPU-bound; run it off the async workers.
async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Generic(format!("Password hashing task failed: {e}")))?
        .map_err(AppError::from)
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Generic(format!("Password verification task failed: {e}")))?
        .map_err(AppError::from)
}
