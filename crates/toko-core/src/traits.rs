use std::future::Future;

use uuid::Uuid;

use crate::error::AppError;
use crate::list::ListRecord;
use crate::models::{Account, AccountUpdate, LookupField, NewAccount};
use crate::query::{SearchPredicate, SortSpec};

/// Read side of a record collection, as needed by list queries.
pub trait RecordStore: Send + Sync + Clone {
    type Record: ListRecord;

    /// Count the records matching `predicate`, ignoring paging.
    fn count(
        &self,
        predicate: &SearchPredicate,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Filter by `predicate`, order by `sort`, then skip and take.
    fn find(
        &self,
        predicate: &SearchPredicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Self::Record>, AppError>> + Send;
}

/// Full CRUD access to an account collection.
pub trait AccountStore: RecordStore<Record = Account> {
    /// Insert a new account. Fails with [`AppError::DuplicateKey`] when
    /// the email is already taken.
    fn insert(
        &self,
        account: &NewAccount,
    ) -> impl Future<Output = Result<Account, AppError>> + Send;

    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Account>, AppError>> + Send;

    fn find_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> impl Future<Output = Result<Option<Account>, AppError>> + Send;

    /// Returns `false` when no account has this id.
    fn update_by_id(
        &self,
        id: Uuid,
        update: &AccountUpdate,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Returns `false` when no account has this id.
    fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Returns `false` when no account has this id.
    fn delete_by_id(&self, id: Uuid) -> impl Future<Output = Result<bool, AppError>> + Send;
}
