//! Association resolution tests

use super::support::*;
use crate::backends::DatabaseValue;
use crate::error::ModelError;
use crate::relationships::{load, related, related_search};
use crate::scope::Scope;

fn user() -> User {
    User {
        id: 1,
        name: "ann".to_string(),
        age: 31,
        company_id: 9,
    }
}

#[tokio::test]
async fn test_has_many_through_related_column() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new().with_rows(vec![
        MockRow::new().with_column("id", 10).with_column("title", "first").with_column("user_id", 1),
        MockRow::new().with_column("id", 11).with_column("title", "second").with_column("user_id", 1),
    ]);
    let owner = user();

    let mut scope = Scope::for_record(&registry, &owner);
    let mut posts: Vec<Post> = Vec::new();
    related(&mut scope, &executor, &mut posts, &[]).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(query.sql, "SELECT * FROM \"posts\" WHERE (\"user_id\" = ?)");
    assert_eq!(query.params, vec![DatabaseValue::Int64(1)]);
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].title, "second");
    assert!(scope.error().is_none());
}

#[tokio::test]
async fn test_load_declared_has_many() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let owner = user();

    let mut scope = Scope::for_record(&registry, &owner);
    let mut posts: Vec<Post> = Vec::new();
    load(&mut scope, &executor, "Posts", &mut posts).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(query.sql, "SELECT * FROM \"posts\" WHERE (\"user_id\" = ?)");
    assert_eq!(query.params, vec![DatabaseValue::Int64(1)]);
}

#[tokio::test]
async fn test_belongs_to_uses_owner_key_value() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new()
        .with_rows(vec![MockRow::new().with_column("id", 9).with_column("name", "acme")]);
    let owner = user();

    let mut scope = Scope::for_record(&registry, &owner);
    let mut company: Option<Company> = None;
    load(&mut scope, &executor, "Company", &mut company).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(query.sql, "SELECT * FROM \"companies\" WHERE (\"id\" = ?)");
    assert_eq!(query.params, vec![DatabaseValue::Int64(9)]);
    assert_eq!(company.map(|c| c.name), Some("acme".to_string()));
}

#[tokio::test]
async fn test_belongs_to_key_declared_with_other_casing() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let member = Member { id: 5, company_id: 9 };

    let mut scope = Scope::for_record(&registry, &member);
    assert_eq!(scope.field_value("CompanyId"), Some(DatabaseValue::Int64(9)));
    assert_eq!(scope.field_value("company_id"), Some(DatabaseValue::Int64(9)));

    let mut company: Option<Company> = None;
    load(&mut scope, &executor, "Company", &mut company).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(query.sql, "SELECT * FROM \"companies\" WHERE (\"id\" = ?)");
    assert_eq!(query.params, vec![DatabaseValue::Int64(9)]);
}

#[tokio::test]
async fn test_plain_key_column_on_owner() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let post = Post {
        id: 4,
        title: "hello".to_string(),
        user_id: 3,
    };

    let mut scope = Scope::for_record(&registry, &post);
    let mut author: Option<User> = None;
    related(&mut scope, &executor, &mut author, &[]).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(query.sql, "SELECT * FROM \"users\" WHERE (\"id\" = ?)");
    assert_eq!(query.params, vec![DatabaseValue::Int64(3)]);
}

#[tokio::test]
async fn test_has_one() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let owner = user();

    let mut scope = Scope::for_record(&registry, &owner);
    let mut profile: Option<Profile> = None;
    load(&mut scope, &executor, "Profile", &mut profile).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(query.sql, "SELECT * FROM \"profiles\" WHERE (\"user_id\" = ?)");
    assert_eq!(query.params, vec![DatabaseValue::Int64(1)]);
    assert!(profile.is_none());
}

#[tokio::test]
async fn test_many_to_many_joins_through_join_table() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new()
        .with_rows(vec![MockRow::new().with_column("id", 2).with_column("name", "rust")]);
    let owner = user();

    let mut scope = Scope::for_record(&registry, &owner);
    let mut languages: Vec<Language> = Vec::new();
    load(&mut scope, &executor, "Languages", &mut languages).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(
        query.sql,
        "SELECT * FROM \"languages\" INNER JOIN \"user_languages\" ON \"user_languages\".\"language_id\" = \"languages\".\"id\" WHERE (\"user_languages\".\"user_id\" = ?)"
    );
    assert_eq!(query.params, vec![DatabaseValue::Int64(1)]);
    assert_eq!(languages, vec![Language { id: 2, name: "rust".to_string() }]);
}

#[tokio::test]
async fn test_polymorphic_has_many_filters_owner_type() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let post = Post {
        id: 4,
        ..Post::default()
    };

    let mut scope = Scope::for_record(&registry, &post);
    let mut comments: Vec<Comment> = Vec::new();
    load(&mut scope, &executor, "Comments", &mut comments).await.unwrap();

    let query = executor.last_query().unwrap();
    assert_eq!(
        query.sql,
        "SELECT * FROM \"comments\" WHERE (\"owner_id\" = ?) AND (\"owner_type\" = ?)"
    );
    assert_eq!(
        query.params,
        vec![DatabaseValue::Int64(4), DatabaseValue::String("posts".to_string())]
    );
}

#[test]
fn test_unresolvable_association() {
    let registry = sqlite_registry();
    let company = Company {
        id: 2,
        name: "acme".to_string(),
    };
    let scope = Scope::for_record(&registry, &company);
    let target = registry.describe::<Language>();

    let error = related_search(&scope, &target, &["OwnerId"]).unwrap_err();
    assert!(matches!(error, ModelError::SchemaResolution(_)));
    let message = error.to_string();
    assert!(message.contains("OwnerId"));
    assert!(message.contains("LanguageId"));
    assert!(message.contains("CompanyId"));
}

#[tokio::test]
async fn test_resolution_errors_are_recorded_on_owner() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let company = Company {
        id: 2,
        name: "acme".to_string(),
    };

    let mut scope = Scope::for_record(&registry, &company);
    let mut languages: Vec<Language> = Vec::new();
    let result = related(&mut scope, &executor, &mut languages, &[]).await;

    assert!(matches!(result, Err(ModelError::SchemaResolution(_))));
    assert!(matches!(scope.error(), Some(ModelError::SchemaResolution(_))));
    assert!(executor.statements().is_empty());

    // Later calls short-circuit on the recorded error
    let mut tags: Vec<Tag> = Vec::new();
    assert!(load(&mut scope, &executor, "Tags", &mut tags).await.is_err());
    assert!(executor.statements().is_empty());
}

#[tokio::test]
async fn test_has_many_without_foreign_key_is_invalid() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let company = Company {
        id: 2,
        name: "acme".to_string(),
    };

    let mut scope = Scope::for_record(&registry, &company);
    let mut tags: Vec<Tag> = Vec::new();
    let error = load(&mut scope, &executor, "Tags", &mut tags).await.unwrap_err();

    assert!(error.to_string().contains("invalid relationship configuration"));
    assert!(executor.statements().is_empty());
}

#[tokio::test]
async fn test_load_unknown_field() {
    let registry = sqlite_registry();
    let executor = MockExecutor::new();
    let owner = user();

    let mut scope = Scope::for_record(&registry, &owner);
    let mut posts: Vec<Post> = Vec::new();
    let error = load(&mut scope, &executor, "Name", &mut posts).await.unwrap_err();

    assert!(error.to_string().contains("relationship field 'Name' not found"));
    assert!(scope.error().is_some());
}
