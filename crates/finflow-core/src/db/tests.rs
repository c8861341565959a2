//! Database tests

use super::*;
use crate::error::Error;
use crate::models::*;

fn account(name: &str) -> Account {
    Account::new(name, AccountType::Card, "#0ea5e9")
}

fn expense(account_id: &str, description: &str, category: &str, date: &str) -> Transaction {
    Transaction {
        id: new_id(),
        account_id: account_id.into(),
        amount: 20.0,
        description: description.into(),
        category: category.into(),
        sub_category: None,
        kind: TransactionType::Expense,
        date: date.into(),
        icon: "other".into(),
        is_recurring: false,
        recurrence_id: None,
    }
}

#[test]
fn test_empty_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_accounts().unwrap().is_empty());
    assert!(db.list_transactions().unwrap().is_empty());
    assert!(db.list_templates().unwrap().is_empty());
}

#[test]
fn test_migrations_idempotent() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    let reopened = Database::new(db.path()).unwrap();
    assert_eq!(reopened.list_accounts().unwrap(), vec![acc]);
}

#[test]
fn test_account_crud() {
    let db = Database::in_memory().unwrap();
    let mut acc = account("Everyday Card");
    db.upsert_account(&acc).unwrap();

    acc.name = "Travel Card".into();
    acc.account_type = AccountType::Savings;
    db.upsert_account(&acc).unwrap();

    let accounts = db.list_accounts().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Travel Card");
    assert_eq!(accounts[0].account_type, AccountType::Savings);

    assert_eq!(db.get_account(&acc.id).unwrap(), Some(acc.clone()));
    assert_eq!(db.find_account("travel card").unwrap(), Some(acc.clone()));
    assert!(db.get_account("missing").unwrap().is_none());

    assert!(db.delete_account(&acc.id).unwrap());
    assert!(!db.delete_account(&acc.id).unwrap());
}

#[test]
fn test_account_requires_name() {
    let db = Database::in_memory().unwrap();
    let err = db.upsert_account(&account("  ")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_transaction_crud() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    let mut t = expense(&acc.id, "Starbucks", "Food and Drink", "2024-03-05");
    t.sub_category = Some("Restaurants".into());
    db.upsert_transaction(&t).unwrap();
    assert_eq!(db.get_transaction(&t.id).unwrap(), Some(t.clone()));

    t.amount = 25.5;
    db.upsert_transaction(&t).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 1);
    assert_eq!(db.get_transaction(&t.id).unwrap().unwrap().amount, 25.5);

    assert!(db.delete_transaction(&t.id).unwrap());
    assert!(db.get_transaction(&t.id).unwrap().is_none());
}

#[test]
fn test_transaction_validation() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    let bad_category = expense(&acc.id, "Lunch", "Comida", "2024-03-05");
    assert!(matches!(
        db.upsert_transaction(&bad_category),
        Err(Error::Validation(_))
    ));

    let mut negative = expense(&acc.id, "Lunch", "Food and Drink", "2024-03-05");
    negative.amount = -1.0;
    assert!(db.upsert_transaction(&negative).is_err());

    let orphan = expense("nope", "Lunch", "Food and Drink", "2024-03-05");
    assert!(matches!(db.upsert_transaction(&orphan), Err(Error::NotFound(_))));

    assert_eq!(db.count_transactions().unwrap(), 0);
}

#[test]
fn test_list_newest_first() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    db.insert_transactions(&[
        expense(&acc.id, "a", "Shopping", "2024-01-10"),
        expense(&acc.id, "b", "Shopping", "2024-03-01T08:00:00.000Z"),
        expense(&acc.id, "c", "Shopping", "2024-02-15"),
    ])
    .unwrap();

    let descriptions: Vec<String> = db
        .list_transactions()
        .unwrap()
        .into_iter()
        .map(|t| t.description)
        .collect();
    assert_eq!(descriptions, vec!["b", "c", "a"]);
}

#[test]
fn test_batch_insert_is_atomic() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    let result = db.insert_transactions(&[
        expense(&acc.id, "ok", "Shopping", "2024-01-10"),
        expense(&acc.id, "bad", "Not a category", "2024-01-11"),
    ]);
    assert!(result.is_err());
    assert_eq!(db.count_transactions().unwrap(), 0);
}

#[test]
fn test_delete_account_cascades() {
    let db = Database::in_memory().unwrap();
    let keep = account("Keep");
    let drop = account("Drop");
    db.upsert_account(&keep).unwrap();
    db.upsert_account(&drop).unwrap();

    db.insert_transactions(&[
        expense(&keep.id, "kept", "Shopping", "2024-01-10"),
        expense(&drop.id, "gone", "Shopping", "2024-01-10"),
        expense(&drop.id, "gone too", "Home", "2024-01-11"),
    ])
    .unwrap();
    let template = TransactionTemplate {
        id: new_id(),
        name: "Rent".into(),
        account_id: drop.id.clone(),
        amount: 800.0,
        description: "Monthly rent".into(),
        category: "Home".into(),
        kind: TransactionType::Expense,
        icon: "home".into(),
    };
    db.upsert_template(&template).unwrap();

    assert!(db.delete_account(&drop.id).unwrap());

    let remaining = db.list_transactions().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].description, "kept");
    assert!(db.list_account_transactions(&drop.id).unwrap().is_empty());
    assert!(db.list_templates().unwrap().is_empty());
}

#[test]
fn test_template_crud() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    let mut template = TransactionTemplate {
        id: new_id(),
        name: "Netflix".into(),
        account_id: acc.id.clone(),
        amount: 12.99,
        description: "Netflix subscription".into(),
        category: "Leisure".into(),
        kind: TransactionType::Expense,
        icon: "leisure".into(),
    };
    db.upsert_template(&template).unwrap();
    assert_eq!(db.find_template("netflix").unwrap(), Some(template.clone()));
    assert_eq!(db.find_template(&template.id).unwrap(), Some(template.clone()));

    template.category = "Salary".into();
    assert!(db.upsert_template(&template).is_err());

    assert!(db.delete_template(&template.id).unwrap());
    assert!(db.list_templates().unwrap().is_empty());
}

#[test]
fn test_backup_replaces_store() {
    let source = Database::in_memory().unwrap();
    let acc = account("Main");
    source.upsert_account(&acc).unwrap();
    source
        .insert_transactions(&[
            expense(&acc.id, "Groceries run", "Food and Drink", "2024-01-10"),
            expense(&acc.id, "Cinema", "Leisure", "2024-01-12"),
        ])
        .unwrap();

    let mut json = Vec::new();
    source.export_backup(&mut json).unwrap();

    let target = Database::in_memory().unwrap();
    let old = account("Old");
    target.upsert_account(&old).unwrap();
    target
        .upsert_transaction(&expense(&old.id, "stale", "Shopping", "2023-01-01"))
        .unwrap();

    let stats = target.import_backup(json.as_slice()).unwrap();
    assert_eq!(stats.accounts, 1);
    assert_eq!(stats.transactions, 2);
    assert_eq!(stats.skipped, 0);

    assert_eq!(target.list_accounts().unwrap(), vec![acc]);
    assert_eq!(
        target.list_transactions().unwrap(),
        source.list_transactions().unwrap()
    );
}

#[test]
fn test_failed_import_keeps_store() {
    let db = Database::in_memory().unwrap();
    let acc = account("Main");
    db.upsert_account(&acc).unwrap();

    assert!(db.import_backup("not a backup".as_bytes()).is_err());
    assert_eq!(db.list_accounts().unwrap().len(), 1);
}
