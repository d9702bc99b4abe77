//! Test utilities: an in-memory account store.
//!
//! Uses `Arc<Mutex<_>>` for interior mutability so clones share state and
//! tests can inspect what the code under test wrote.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::list::ListRecord;
use crate::models::{Account, AccountUpdate, LookupField, NewAccount};
use crate::query::{SearchPredicate, SortDirection, SortSpec};
use crate::traits::{AccountStore, RecordStore};

/// Cheapest bcrypt cost, for tests that hash passwords.
pub const TEST_HASH_COST: u32 = 4;

// ---------------------------------------------------------------------------
// MemoryAccountStore
// ---------------------------------------------------------------------------

/// In-memory [`AccountStore`] with the same semantics as the database
/// repository: unique emails, case-insensitive search, id tie-breaking.
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<Mutex<Vec<Account>>>,
    error: Arc<Mutex<Option<String>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with one account per name; emails are
    /// `<name>@example.com` and creation times increase in input order.
    pub fn with_names<S: AsRef<str>>(names: &[S]) -> Self {
        let store = Self::new();
        let base = Utc::now();
        {
            let mut accounts = store.accounts.lock().unwrap();
            for (i, name) in names.iter().enumerate() {
                let name = name.as_ref();
                let created_at = base + Duration::seconds(i as i64);
                accounts.push(Account {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    email: format!("{}@example.com", name.replace(' ', ".")),
                    password_hash: String::new(),
                    created_at,
                    updated_at: created_at,
                });
            }
        }
        store
    }

    /// Store whose every operation fails with a database error.
    pub fn failing(message: &str) -> Self {
        let store = Self::new();
        *store.error.lock().unwrap() = Some(message.to_string());
        store
    }

    pub fn len(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), AppError> {
        match self.error.lock().unwrap().as_ref() {
            Some(message) => Err(AppError::DatabaseError(message.clone())),
            None => Ok(()),
        }
    }
}

fn matches(predicate: &SearchPredicate, account: &Account) -> bool {
    predicate.matches(|field| account.text_field(field))
}

impl RecordStore for MemoryAccountStore {
    type Record = Account;

    async fn count(&self, predicate: &SearchPredicate) -> Result<u64, AppError> {
        self.check()?;
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().filter(|a| matches(predicate, a)).count() as u64)
    }

    async fn find(
        &self,
        predicate: &SearchPredicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Account>, AppError> {
        self.check()?;
        let accounts = self.accounts.lock().unwrap();
        let mut found: Vec<Account> = accounts
            .iter()
            .filter(|a| matches(predicate, a))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            let ord = a.sort_key(sort.field).cmp(&b.sort_key(sort.field));
            let ord = match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        Ok(found
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }
}

impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &NewAccount) -> Result<Account, AppError> {
        self.check()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::DuplicateKey(format!(
                "Email is already registered: {}",
                account.email
            )));
        }
        let now = Utc::now();
        let stored = Account {
            id: Uuid::new_v4(),
            name: account.name.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        accounts.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        self.check()?;
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<Account>, AppError> {
        self.check()?;
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|a| match field {
                LookupField::Email => a.email == value,
            })
            .cloned())
    }

    async fn update_by_id(&self, id: Uuid, update: &AccountUpdate) -> Result<bool, AppError> {
        self.check()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .iter()
            .any(|a| a.id != id && a.email == update.email)
        {
            return Err(AppError::DuplicateKey(format!(
                "Email is already registered: {}",
                update.email
            )));
        }
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.name = update.name.clone();
                account.email = update.email.clone();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        self.check()?;
        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(accounts.len() < before)
    }
}
