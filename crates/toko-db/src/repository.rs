use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use toko_core::error::AppError;
use toko_core::models::{Account, AccountUpdate, Collection, LookupField, NewAccount};
use toko_core::query::{SearchPredicate, SortSpec};
use toko_core::traits::{AccountStore, RecordStore};
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// Repository for one account collection (`users` or `toko`) in PostgreSQL.
///
/// Table and column names are interpolated into the SQL, but only ever from
/// [`Collection::table`] and the `'static` whitelists carried by
/// [`SearchPredicate`] and [`SortSpec`]; user input is always bound.
#[derive(Clone)]
pub struct AccountRepository {
    pool: Pool<Postgres>,
    collection: Collection,
}

impl AccountRepository {
    pub fn new(pool: PgPool, collection: Collection) -> Self {
        Self { pool, collection }
    }

    fn table(&self) -> &'static str {
        self.collection.table()
    }

    /// Count accounts matching the search predicate.
    pub async fn count(&self, predicate: &SearchPredicate) -> Result<u64, AppError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.table(),
            search_clause(predicate)
        );

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(pattern) = search_pattern(predicate) {
            query = query.bind(pattern);
        }

        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.0.max(0) as u64)
    }

    /// Fetch one page of accounts, ordered by `sort` with `id` as tie-breaker.
    pub async fn find(
        &self,
        predicate: &SearchPredicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Account>, AppError> {
        let pattern = search_pattern(predicate);
        let (offset_param, limit_param) = if pattern.is_some() { (2, 3) } else { (1, 2) };
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE {} ORDER BY {} {}, id ASC OFFSET ${offset_param} LIMIT ${limit_param}",
            self.table(),
            search_clause(predicate),
            order_expr(sort.field),
            sort.direction.as_sql(),
        );

        let mut query = sqlx::query_as::<_, AccountRow>(&sql);
        if let Some(pattern) = pattern {
            query = query.bind(pattern);
        }

        let rows = query
            .bind(to_i64(skip))
            .bind(to_i64(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a new account. Returns the stored row.
    pub async fn insert(&self, account: &NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO {} (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {ACCOUNT_COLUMNS}",
            self.table()
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &account.email))?;

        Ok(row.into())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM {} WHERE id = $1", self.table());

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Look up a single account by exact field value.
    pub async fn find_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE {} = $1 ORDER BY id LIMIT 1",
            self.table(),
            field.as_str()
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Update name and email. Returns `false` if no row matched.
    pub async fn update_by_id(&self, id: Uuid, update: &AccountUpdate) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET name = $2, email = $3, updated_at = NOW() WHERE id = $1",
            self.table()
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.email)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &update.email))?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the stored password hash. Returns `false` if no row matched.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            self.table()
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table());

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

// -- SQL helpers --

/// `WHERE` body for a search predicate. Uses `$1` when a term is present.
fn search_clause(predicate: &SearchPredicate) -> String {
    if predicate.is_match_all() {
        return "TRUE".to_string();
    }
    if predicate.fields().is_empty() {
        return "FALSE".to_string();
    }
    let parts: Vec<String> = predicate
        .fields()
        .iter()
        .map(|field| format!("{field} ILIKE $1 ESCAPE '\\'"))
        .collect();
    format!("({})", parts.join(" OR "))
}

/// Bind value for [`search_clause`]: the term as a substring pattern.
fn search_pattern(predicate: &SearchPredicate) -> Option<String> {
    if predicate.fields().is_empty() {
        return None;
    }
    predicate
        .term()
        .map(|term| format!("%{}%", escape_like(term)))
}

/// Escape LIKE metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Text columns sort byte-wise so ordering does not depend on the server locale.
fn order_expr(field: &str) -> String {
    match field {
        "name" | "email" => format!("{field} COLLATE \"C\""),
        _ => field.to_string(),
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn map_write_error(error: sqlx::Error, email: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateKey(format!("Email is already registered: {email}"))
        }
        _ => AppError::DatabaseError(error.to_string()),
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// -- Trait implementation --

impl RecordStore for AccountRepository {
    type Record = Account;

    async fn count(&self, predicate: &SearchPredicate) -> Result<u64, AppError> {
        AccountRepository::count(self, predicate).await
    }

    async fn find(
        &self,
        predicate: &SearchPredicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Account>, AppError> {
        AccountRepository::find(self, predicate, sort, skip, limit).await
    }
}

impl AccountStore for AccountRepository {
    async fn insert(&self, account: &NewAccount) -> Result<Account, AppError> {
        AccountRepository::insert(self, account).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        AccountRepository::find_by_id(self, id).await
    }

    async fn find_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<Account>, AppError> {
        AccountRepository::find_by_field(self, field, value).await
    }

    async fn update_by_id(&self, id: Uuid, update: &AccountUpdate) -> Result<bool, AppError> {
        AccountRepository::update_by_id(self, id, update).await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        AccountRepository::update_password(self, id, password_hash).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        AccountRepository::delete_by_id(self, id).await
    }
}
