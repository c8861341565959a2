//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::time::Duration;

use finflow_core::ai::{AIClient, GeminiBackend, MockBackend, RemoteClassifier};
use finflow_core::db::Database;
use finflow_core::model_router::ModelTier;
use finflow_core::models::{AccountType, CategorizationSource, TransactionType};
use finflow_core::prompts::PromptLibrary;
use finflow_core::test_utils::{MockAiServer, MockReply};

use crate::commands::{self, truncate, NewTransaction, TransactionEdit};

fn setup_test_db() -> (Database, String) {
    let db = Database::in_memory().unwrap();
    let account = commands::cmd_accounts_add(&db, "Everyday Card", "card", "#f97316").unwrap();
    (db, account.id)
}

fn mock_remote(mock: &MockBackend) -> RemoteClassifier {
    RemoteClassifier::new(
        AIClient::Mock(mock.clone()),
        vec![ModelTier::new("mock", Duration::from_secs(5))],
    )
}

fn expense<'a>(amount: f64, description: &'a str) -> NewTransaction<'a> {
    NewTransaction {
        amount,
        description,
        account: "Everyday Card",
        kind: "expense",
        date: Some("2024-03-05"),
        category: None,
    }
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long description here", 10), "a long ...");
    assert_eq!(truncate("nómina de marzo", 8), "nómin...");
}

#[test]
fn test_resolve_date() {
    assert_eq!(commands::resolve_date(Some(" 2024-03-05 ")).unwrap(), "2024-03-05");
    assert!(commands::resolve_date(Some("05/03/2024")).is_err());
    assert_eq!(commands::resolve_date(None).unwrap().len(), 10);
}

// ========== Accounts Command Tests ==========

#[test]
fn test_cmd_accounts_crud() {
    let (db, id) = setup_test_db();
    assert!(commands::cmd_accounts_list(&db).is_ok());

    commands::cmd_accounts_edit(&db, "everyday card", Some("Travel Card"), Some("savings"), None)
        .unwrap();
    let account = db.get_account(&id).unwrap().unwrap();
    assert_eq!(account.name, "Travel Card");
    assert_eq!(account.account_type, AccountType::Savings);
    assert_eq!(account.color, "#f97316");

    assert!(commands::cmd_accounts_edit(&db, &id, None, Some("checking"), None).is_err());

    commands::cmd_accounts_delete(&db, &id).unwrap();
    assert!(db.list_accounts().unwrap().is_empty());
    assert!(commands::cmd_accounts_delete(&db, &id).is_err());
}

#[test]
fn test_cmd_accounts_add_invalid_type() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_accounts_add(&db, "Main", "checking", "#fff").is_err());
}

// ========== Transaction Command Tests ==========

#[tokio::test]
async fn test_cmd_add_rule_hit() {
    let (db, account_id) = setup_test_db();
    let mock = MockBackend::new();
    let remote = mock_remote(&mock);

    let created = commands::cmd_add(&db, Some(&remote), expense(23.5, "Uber to airport"), 1, "monthly")
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    let stored = db.get_transaction(&created[0].id).unwrap().unwrap();
    assert_eq!(stored.category, "Transport");
    assert_eq!(stored.icon, "transport");
    assert_eq!(stored.account_id, account_id);
    assert!(!stored.is_recurring);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_cmd_add_remote_income() {
    let (db, _) = setup_test_db();
    let mock = MockBackend::new();
    let remote = mock_remote(&mock);

    let input = NewTransaction {
        kind: "income",
        ..expense(1200.0, "Quarterly consulting payment")
    };
    let created = commands::cmd_add(&db, Some(&remote), input, 1, "monthly")
        .await
        .unwrap();

    assert_eq!(created[0].kind, TransactionType::Income);
    assert_eq!(created[0].category, "Honorarios Profesionales");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_cmd_add_over_http_falls_back_a_tier() {
    let (db, _) = setup_test_db();
    let server = MockAiServer::with_model_replies(&[
        ("gemini-2.5-flash", MockReply::quota_exhausted()),
        ("gemini-2.5-flash-lite", MockReply::classification("Entertainment", 0.9)),
    ])
    .await;
    let backend = GeminiBackend::new(&server.url(), "test-key", "gemini-2.5-flash")
        .with_prompts(PromptLibrary::embedded_only());
    let remote = RemoteClassifier::new(
        AIClient::Gemini(backend),
        vec![
            ModelTier::new("gemini-2.5-flash", Duration::from_secs(5)),
            ModelTier::new("gemini-2.5-flash-lite", Duration::from_secs(5)),
        ],
    );

    let created = commands::cmd_add(&db, Some(&remote), expense(18.0, "Bowling night"), 1, "monthly")
        .await
        .unwrap();

    assert_eq!(created[0].category, "Leisure");
    assert_eq!(created[0].icon, "leisure");
    assert_eq!(server.calls(), vec!["gemini-2.5-flash", "gemini-2.5-flash-lite"]);
}

#[tokio::test]
async fn test_categorize_override_is_manual() {
    let result = commands::categorize_with_override(
        None,
        "Weekly shop",
        TransactionType::Expense,
        Some("GROCERIES"),
    )
    .await
    .unwrap();
    assert_eq!(result.category, "Food and Drink");
    assert_eq!(result.source, CategorizationSource::Manual);
    assert_eq!(result.confidence, 1.0);
}

#[tokio::test]
async fn test_cmd_add_without_remote_uses_fallback() {
    let (db, _) = setup_test_db();
    let created = commands::cmd_add(&db, None, expense(5.0, "Mystery vendor"), 1, "monthly")
        .await
        .unwrap();
    assert_eq!(created[0].category, "Other");
    assert_eq!(created[0].icon, "other");
}

#[tokio::test]
async fn test_cmd_add_category_override() {
    let (db, _) = setup_test_db();
    let input = NewTransaction {
        category: Some("groceries"),
        ..expense(42.0, "Weekly shop")
    };
    let created = commands::cmd_add(&db, None, input, 1, "monthly").await.unwrap();
    assert_eq!(created[0].category, "Food and Drink");

    let bad = NewTransaction {
        category: Some("Salary"),
        ..expense(42.0, "Weekly shop")
    };
    assert!(commands::cmd_add(&db, None, bad, 1, "monthly").await.is_err());
    assert_eq!(db.count_transactions().unwrap(), 1);
}

#[tokio::test]
async fn test_cmd_add_recurring() {
    let (db, _) = setup_test_db();
    let input = NewTransaction {
        date: Some("2024-01-31"),
        ..expense(12.99, "Netflix")
    };
    let created = commands::cmd_add(&db, None, input, 3, "monthly").await.unwrap();

    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|t| t.is_recurring && t.category == "Leisure"));
    let dates: Vec<&str> = created.iter().map(|t| t.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-31", "2024-02-29", "2024-03-31"]);
    assert_eq!(db.count_transactions().unwrap(), 3);
}

#[tokio::test]
async fn test_cmd_add_rejects_bad_input() {
    let (db, _) = setup_test_db();

    assert!(commands::cmd_add(&db, None, expense(-5.0, "Lunch"), 1, "monthly").await.is_err());
    assert!(commands::cmd_add(&db, None, expense(5.0, "   "), 1, "monthly").await.is_err());
    assert!(commands::cmd_add(&db, None, expense(5.0, "Lunch"), 2, "yearly").await.is_err());

    let bad_date = NewTransaction {
        date: Some("tomorrow"),
        ..expense(5.0, "Lunch")
    };
    assert!(commands::cmd_add(&db, None, bad_date, 1, "monthly").await.is_err());

    let bad_account = NewTransaction {
        account: "Nope",
        ..expense(5.0, "Lunch")
    };
    assert!(commands::cmd_add(&db, None, bad_account, 1, "monthly").await.is_err());

    assert_eq!(db.count_transactions().unwrap(), 0);
}

#[tokio::test]
async fn test_cmd_edit_recategorizes_on_new_description() {
    let (db, _) = setup_test_db();
    let created = commands::cmd_add(&db, None, expense(9.0, "Mystery vendor"), 1, "monthly")
        .await
        .unwrap();
    let id = created[0].id.clone();

    let edit = TransactionEdit {
        amount: Some(11.0),
        description: Some("Starbucks"),
        account: None,
        kind: None,
        date: None,
        category: None,
    };
    commands::cmd_edit(&db, None, &id, edit).await.unwrap();

    let stored = db.get_transaction(&id).unwrap().unwrap();
    assert_eq!(stored.amount, 11.0);
    assert_eq!(stored.category, "Food and Drink");

    let amount_only = TransactionEdit {
        amount: Some(12.0),
        description: None,
        account: None,
        kind: None,
        date: None,
        category: None,
    };
    commands::cmd_edit(&db, None, &id, amount_only).await.unwrap();
    assert_eq!(db.get_transaction(&id).unwrap().unwrap().category, "Food and Drink");
}

#[tokio::test]
async fn test_cmd_list_and_delete() {
    let (db, _) = setup_test_db();
    assert!(commands::cmd_list(&db, 20).is_ok());

    let created = commands::cmd_add(&db, None, expense(3.0, "Coffee"), 1, "monthly")
        .await
        .unwrap();
    assert!(commands::cmd_list(&db, 1).is_ok());

    commands::cmd_delete(&db, &created[0].id).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 0);
    assert!(commands::cmd_delete(&db, &created[0].id).is_err());
}

#[tokio::test]
async fn test_cmd_categorize() {
    let mock = MockBackend::new();
    let remote = mock_remote(&mock);
    assert!(commands::cmd_categorize(Some(&remote), "Netflix", false).await.is_ok());
    assert!(commands::cmd_categorize(None, "Something odd", true).await.is_ok());
    assert_eq!(mock.call_count(), 0);
}

// ========== Report Command Tests ==========

#[tokio::test]
async fn test_cmd_reports() {
    let (db, _) = setup_test_db();
    commands::cmd_add(&db, None, expense(30.0, "Groceries"), 1, "monthly")
        .await
        .unwrap();

    assert!(commands::cmd_dashboard(&db, "month").is_ok());
    assert!(commands::cmd_dashboard(&db, "all").is_ok());
    assert!(commands::cmd_dashboard(&db, "decade").is_err());

    assert!(commands::cmd_report(&db, Some(2024), Some(3), false).is_ok());
    assert!(commands::cmd_report(&db, Some(2024), None, true).is_ok());
    assert!(commands::cmd_report(&db, Some(2024), Some(13), false).is_err());

    assert!(commands::cmd_series(&db, "all").is_ok());
    assert!(commands::cmd_series(&db, "fortnight").is_err());
}

// ========== Template Command Tests ==========

#[tokio::test]
async fn test_cmd_templates_flow() {
    let (db, _) = setup_test_db();
    commands::cmd_templates_add(&db, None, "Rent", expense(800.0, "Monthly rent"))
        .await
        .unwrap();

    let templates = db.list_templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].category, "Home");
    assert!(commands::cmd_templates_list(&db).is_ok());

    let tx = commands::cmd_templates_apply(&db, "rent", Some("2024-04-01")).unwrap();
    assert_eq!(tx.date, "2024-04-01");
    assert_eq!(tx.amount, 800.0);
    assert_eq!(db.count_transactions().unwrap(), 1);

    commands::cmd_templates_delete(&db, "Rent").unwrap();
    assert!(db.list_templates().unwrap().is_empty());
    assert!(commands::cmd_templates_apply(&db, "Rent", None).is_err());
}

// ========== Export/Import Command Tests ==========

#[tokio::test]
async fn test_cmd_export_and_import() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("transactions.csv");
    let json_path = dir.path().join("backup.json");

    let (db, _) = setup_test_db();
    commands::cmd_add(&db, None, expense(4.5, "Starbucks"), 1, "monthly")
        .await
        .unwrap();

    commands::cmd_export(&db, "csv", Some(&csv_path)).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("Date,Description,Category,Type,Amount"));
    assert!(csv.contains("2024-03-05,Starbucks,Food and Drink,Expense,4.50"));

    commands::cmd_export(&db, "json", Some(&json_path)).unwrap();
    assert!(commands::cmd_export(&db, "xml", Some(&json_path)).is_err());

    let restored = Database::in_memory().unwrap();
    commands::cmd_import(&restored, &json_path).unwrap();
    assert_eq!(restored.list_accounts().unwrap(), db.list_accounts().unwrap());
    assert_eq!(
        restored.list_transactions().unwrap(),
        db.list_transactions().unwrap()
    );

    assert!(commands::cmd_import(&restored, &dir.path().join("missing.json")).is_err());
}

// ========== AI Command Tests ==========

#[tokio::test]
async fn test_cmd_advice() {
    let (db, _) = setup_test_db();
    let mock = MockBackend::new().with_advice("Spend less on coffee.");
    let remote = mock_remote(&mock);

    // Too few transactions: no remote call
    commands::cmd_advice(&db, Some(&remote)).await.unwrap();
    assert_eq!(mock.call_count(), 0);

    for i in 0..5 {
        let description = format!("Coffee {}", i);
        commands::cmd_add(&db, None, expense(3.0, &description), 1, "monthly")
            .await
            .unwrap();
    }
    commands::cmd_advice(&db, Some(&remote)).await.unwrap();
    assert_eq!(mock.call_count(), 1);
}
