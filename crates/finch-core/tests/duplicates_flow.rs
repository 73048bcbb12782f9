use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use finch_core::commands::duplicates;
use finch_core::model::{
    Account, AccountKind, EntityRef, Institution, Transaction,
};
use finch_core::store::{Store, SyncBatch};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::tempdir;

fn temp_home() -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let home = dir.path().join("finch-home");
    Ok((dir, home))
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    let value = NaiveDate::from_ymd_opt(year, month, day);
    assert!(value.is_some());
    value.unwrap_or_default()
}

fn amount(raw: &str) -> Decimal {
    let value = raw.parse::<Decimal>();
    assert!(value.is_ok());
    value.unwrap_or_default()
}

fn transaction(external_id: &str, account: &str, posted: NaiveDate, raw_amount: &str, description: &str) -> Transaction {
    Transaction {
        external_id: external_id.to_string(),
        account: EntityRef::account(account),
        transaction_date: posted,
        posted_date: posted,
        amount: amount(raw_amount),
        payee: description.to_string(),
        description: description.to_string(),
        memo: None,
        category: None,
        tags: BTreeSet::new(),
        transfer_pair: None,
        user_id: "user-1".to_string(),
    }
}

fn seed_batch() -> SyncBatch {
    let mut batch = SyncBatch::default();
    batch.institutions.push(Institution {
        external_id: "firstbank.example".to_string(),
        name: "First Bank".to_string(),
        domain: Some("firstbank.example".to_string()),
        url: None,
    });
    for account_id in ["acc-1", "acc-2"] {
        batch.accounts.push(Account {
            external_id: account_id.to_string(),
            external_name: format!("Account {account_id}"),
            institution: EntityRef::institution("firstbank.example"),
            currency: "USD".to_string(),
            kind: AccountKind::Chequing,
            user_id: "user-1".to_string(),
        });
    }
    batch
}

#[test]
fn duplicates_are_grouped_across_accounts() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let mut batch = seed_batch();
        let posted = date(2024, 7, 1);
        // Same full key on two accounts, plus two distinct records.
        batch
            .transactions
            .push(transaction("t1", "acc-1", posted, "-5.10", "COFFEE"));
        batch
            .transactions
            .push(transaction("t2", "acc-2", posted, "-5.1", "COFFEE"));
        batch
            .transactions
            .push(transaction("t3", "acc-1", posted, "-99.00", "RENT"));
        batch
            .transactions
            .push(transaction("t4", "acc-2", date(2024, 7, 2), "-5.10", "COFFEE"));

        let store = Store::open_at(&home);
        assert!(store.is_ok());
        if let Ok(mut store) = store {
            let outcome = store.upsert_batch(&batch);
            assert!(outcome.is_ok());
            if let Ok(outcome) = outcome {
                assert!(outcome.failures.is_empty());
            }
        }

        let result = duplicates::run_with_home_override(Some(&home), "user-1", None, None);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let data = &envelope.data;
            assert_eq!(data["transaction_count"], Value::from(4));
            assert_eq!(data["candidate_count"], Value::from(2));

            let rows = data["rows"].as_array().cloned().unwrap_or_default();
            assert_eq!(rows.len(), 2);
            for row in &rows {
                assert_eq!(row["group_size"], Value::from(2));
                assert_eq!(row["same_account"], Value::Bool(false));
                assert_eq!(row["description"], Value::from("COFFEE"));
            }
        }
    }
}

#[test]
fn same_account_duplicates_are_flagged() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let mut batch = seed_batch();
        let posted = date(2024, 7, 1);
        batch
            .transactions
            .push(transaction("t1", "acc-1", posted, "-12.00", "LUNCH"));
        batch
            .transactions
            .push(transaction("t2", "acc-1", posted, "-12.00", "LUNCH"));

        let store = Store::open_at(&home);
        assert!(store.is_ok());
        if let Ok(mut store) = store {
            let outcome = store.upsert_batch(&batch);
            assert!(outcome.is_ok());
        }

        let result = duplicates::run_with_home_override(Some(&home), "user-1", None, None);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let rows = envelope.data["rows"].as_array().cloned().unwrap_or_default();
            assert_eq!(rows.len(), 2);
            assert!(rows.iter().all(|row| row["same_account"] == Value::Bool(true)));
        }
    }
}

#[test]
fn date_filters_narrow_the_scan() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let mut batch = seed_batch();
        batch
            .transactions
            .push(transaction("t1", "acc-1", date(2024, 1, 5), "-5.00", "COFFEE"));
        batch
            .transactions
            .push(transaction("t2", "acc-2", date(2024, 1, 5), "-5.00", "COFFEE"));
        batch
            .transactions
            .push(transaction("t3", "acc-1", date(2024, 6, 5), "-5.00", "COFFEE"));

        let store = Store::open_at(&home);
        assert!(store.is_ok());
        if let Ok(mut store) = store {
            let outcome = store.upsert_batch(&batch);
            assert!(outcome.is_ok());
        }

        let result = duplicates::run_with_home_override(
            Some(&home),
            "user-1",
            Some(date(2024, 6, 1)),
            None,
        );
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            // Only t3 is in range; no group forms.
            assert_eq!(envelope.data["transaction_count"], Value::from(1));
            assert_eq!(envelope.data["candidate_count"], Value::from(0));
        }
    }
}

#[test]
fn other_users_transactions_are_not_scanned() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let mut batch = seed_batch();
        let posted = date(2024, 7, 1);
        batch
            .transactions
            .push(transaction("t1", "acc-1", posted, "-5.00", "COFFEE"));
        let mut foreign = transaction("t2", "acc-2", posted, "-5.00", "COFFEE");
        foreign.user_id = "user-2".to_string();
        batch.transactions.push(foreign);

        let store = Store::open_at(&home);
        assert!(store.is_ok());
        if let Ok(mut store) = store {
            let outcome = store.upsert_batch(&batch);
            assert!(outcome.is_ok());
        }

        let result = duplicates::run_with_home_override(Some(&home), "user-1", None, None);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.data["transaction_count"], Value::from(1));
            assert_eq!(envelope.data["candidate_count"], Value::from(0));
        }
    }
}
