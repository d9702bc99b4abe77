use toko_core::error::AppError;
use toko_core::models::{AccountUpdate, Collection, LookupField, NewAccount};
use toko_core::query::{RawListParams, SearchPredicate, SortSpec};
use toko_core::{Account, execute_list};
use toko_db::{AccountRepository, Database};
use uuid::Uuid;

use crate::integration::common::setup_test_db;

fn new_account(name: &str) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderpla".into(),
    }
}

async fn seed(repo: &AccountRepository, names: &[&str]) -> Vec<Account> {
    let mut stored = Vec::new();
    for name in names {
        stored.push(repo.insert(&new_account(name)).await.unwrap());
    }
    stored
}

#[tokio::test]
async fn insert_and_find_by_id() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);

    let stored = repo.insert(&new_account("Alice")).await.unwrap();
    assert!(!stored.id.is_nil());
    assert_eq!(stored.email, "alice@example.com");

    let found = repo
        .find_by_id(stored.id)
        .await
        .unwrap()
        .expect("Should find the account");
    assert_eq!(found, stored);

    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);

    repo.insert(&new_account("Alice")).await.unwrap();
    let err = repo.insert(&new_account("Alice")).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateKey(_)), "got {err:?}");
}

#[tokio::test]
async fn collections_are_independent() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);
    let users = db.accounts(Collection::Users);
    let toko = db.accounts(Collection::Toko);

    users.insert(&new_account("Alice")).await.unwrap();
    // Same email in the other collection is fine.
    toko.insert(&new_account("Alice")).await.unwrap();

    let all = SearchPredicate::match_all(&["name", "email"]);
    assert_eq!(users.count(&all).await.unwrap(), 1);
    assert_eq!(toko.count(&all).await.unwrap(), 1);
}

#[tokio::test]
async fn find_by_field_matches_exactly() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Toko);
    seed(&repo, &["Alice", "Bob"]).await;

    let bob = repo
        .find_by_field(LookupField::Email, "bob@example.com")
        .await
        .unwrap()
        .expect("Should find bob");
    assert_eq!(bob.name, "Bob");

    assert!(
        repo.find_by_field(LookupField::Email, "bob@example")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn search_is_case_insensitive_substring_over_name_and_email() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);
    seed(&repo, &["Alice", "Malik", "Bob"]).await;

    let predicate = SearchPredicate::new(Some("LI"), &["name", "email"]);
    assert_eq!(repo.count(&predicate).await.unwrap(), 2);

    let found = repo
        .find(&predicate, &SortSpec::asc("name"), 0, 10)
        .await
        .unwrap();
    let names: Vec<_> = found.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Malik"]);
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);
    seed(&repo, &["Alice", "Bob"]).await;

    let predicate = SearchPredicate::new(Some("%"), &["name", "email"]);
    assert_eq!(repo.count(&predicate).await.unwrap(), 0);
}

#[tokio::test]
async fn list_pages_descending_by_name() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);
    let names: Vec<String> = (1..=25).map(|i| format!("u{i:02}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    seed(&repo, &names).await;

    let params = RawListParams {
        page_number: Some("2".into()),
        page_size: Some("10".into()),
        search: None,
        sort: Some("name:desc".into()),
    };
    let query =
        toko_core::build_list_query(&params, &<Account as toko_core::ListRecord>::LIST_FIELDS)
            .unwrap();
    let page = execute_list(&repo, &query).await.unwrap();

    assert_eq!(page.total_count, 25);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_previous_page);
    assert!(page.has_next_page);
    let got: Vec<_> = page.items.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        got,
        ["u15", "u14", "u13", "u12", "u11", "u10", "u09", "u08", "u07", "u06"]
    );
}

#[tokio::test]
async fn page_beyond_range_is_empty() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Toko);
    seed(&repo, &["Alice", "Bob"]).await;

    let all = SearchPredicate::match_all(&["name", "email"]);
    let found = repo
        .find(&all, &SortSpec::asc("name"), 10, 10)
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn update_and_delete_report_missing_rows() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);
    let stored = repo.insert(&new_account("Alice")).await.unwrap();

    let update = AccountUpdate {
        name: "Alicia".into(),
        email: "alicia@example.com".into(),
    };
    assert!(repo.update_by_id(stored.id, &update).await.unwrap());
    assert!(!repo.update_by_id(Uuid::new_v4(), &update).await.unwrap());

    let updated = repo.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(updated.name, "Alicia");
    assert_eq!(updated.email, "alicia@example.com");
    assert!(updated.updated_at >= stored.updated_at);

    assert!(repo.update_password(stored.id, "new-hash").await.unwrap());
    let updated = repo.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(updated.password_hash, "new-hash");

    assert!(repo.delete_by_id(stored.id).await.unwrap());
    assert!(!repo.delete_by_id(stored.id).await.unwrap());
    assert!(repo.find_by_id(stored.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_to_taken_email_is_duplicate() {
    let (pool, _container) = setup_test_db().await;
    let repo = AccountRepository::new(pool, Collection::Users);
    let stored = seed(&repo, &["Alice", "Bob"]).await;

    let update = AccountUpdate {
        name: "Alice".into(),
        email: "bob@example.com".into(),
    };
    let err = repo.update_by_id(stored[0].id, &update).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)), "got {err:?}");
}

#[tokio::test]
async fn health_check_succeeds() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);
    db.health_check().await.unwrap();
}
