pub mod open;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use ulid::Ulid;

use crate::migrations::run_pending;
use crate::model::{
    Account, Category, EntityRef, Institution, Snapshot, Tag, Transaction,
};
use crate::store::open::{
    ensure_store_directory, is_constraint_violation, map_sqlite_error, open_connection,
    resolve_store_home, store_db_path,
};
use crate::{CoreError, CoreResult};

/// One atomic unit of upserts. Entities reference each other by natural key
/// (`EntityRef`), so a new institution, its accounts, and their transactions
/// can travel together; the store resolves references in dependency order at
/// commit time.
#[derive(Debug, Clone, Default)]
pub struct SyncBatch {
    pub institutions: Vec<Institution>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub snapshots: Vec<Snapshot>,
}

impl SyncBatch {
    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
            && self.accounts.is_empty()
            && self.transactions.is_empty()
            && self.snapshots.is_empty()
    }
}

/// Per-batch result: upserted counts by entity kind plus record-level
/// failures (kind, error). Failures never abort the surrounding batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub upserted: BTreeMap<String, i64>,
    pub failures: Vec<(String, CoreError)>,
}

impl BatchOutcome {
    fn record_upsert(&mut self, kind: &str) {
        *self.upserted.entry(kind.to_string()).or_insert(0) += 1;
    }

    fn record_failure(&mut self, kind: &str, error: CoreError) {
        self.failures.push((kind.to_string(), error));
    }
}

pub struct Store {
    connection: Connection,
    db_path: PathBuf,
}

impl Store {
    pub fn open_default() -> CoreResult<Self> {
        Self::open_with_home_override(None)
    }

    pub fn open_at(home: &Path) -> CoreResult<Self> {
        Self::open_with_home_override(Some(home))
    }

    fn open_with_home_override(home_override: Option<&Path>) -> CoreResult<Self> {
        let home = resolve_store_home(home_override)?;
        ensure_store_directory(&home)?;

        let db_path = store_db_path(&home);
        let mut connection = open_connection(&db_path)?;
        run_pending(&mut connection)
            .map_err(|error| map_migration_error(&db_path, &error))?;

        Ok(Self {
            connection,
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Applies a batch inside one immediate transaction. Upserts are
    /// idempotent by external id: institutions and accounts refresh their
    /// provider display fields, transactions and snapshots are write-once so
    /// user edits survive re-syncs.
    pub fn upsert_batch(&mut self, batch: &SyncBatch) -> CoreResult<BatchOutcome> {
        let db_path = self.db_path.clone();
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|error| map_sqlite_error(&db_path, &error))?;

        let mut outcome = BatchOutcome::default();

        for institution in &batch.institutions {
            match upsert_institution(&transaction, &db_path, institution) {
                Ok(()) => outcome.record_upsert("institutions"),
                Err(error) if error.is_record_level() => {
                    outcome.record_failure("institutions", error);
                }
                Err(error) => return Err(error),
            }
        }

        for account in &batch.accounts {
            match upsert_account(&transaction, &db_path, account) {
                Ok(()) => outcome.record_upsert("accounts"),
                Err(error) if error.is_record_level() => {
                    outcome.record_failure("accounts", error);
                }
                Err(error) => return Err(error),
            }
        }

        for row in &batch.transactions {
            match upsert_transaction(&transaction, &db_path, row) {
                Ok(()) => outcome.record_upsert("transactions"),
                Err(error) if error.is_record_level() => {
                    outcome.record_failure("transactions", error);
                }
                Err(error) => return Err(error),
            }
        }

        for snapshot in &batch.snapshots {
            match upsert_snapshot(&transaction, &db_path, snapshot) {
                Ok(()) => outcome.record_upsert("snapshots"),
                Err(error) if error.is_record_level() => {
                    outcome.record_failure("snapshots", error);
                }
                Err(error) => return Err(error),
            }
        }

        transaction
            .commit()
            .map_err(|error| map_sqlite_error(&db_path, &error))?;

        Ok(outcome)
    }

    pub fn upsert_category(&mut self, category: &Category) -> CoreResult<()> {
        let category_id = format!("cat_{}", Ulid::new());
        self.connection
            .execute(
                "INSERT INTO categories (category_id, ident, name, parent_ident, kind, sort_order, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (ident) DO UPDATE SET
                    name = excluded.name,
                    parent_ident = excluded.parent_ident,
                    kind = excluded.kind,
                    sort_order = excluded.sort_order",
                params![
                    category_id,
                    &category.ident,
                    &category.name,
                    &category.parent,
                    category.kind.as_str(),
                    category.sort_order,
                    &category.user_id,
                ],
            )
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
        Ok(())
    }

    /// Assigns (or clears, with `None`) the user-chosen category of a stored
    /// transaction. Category is one of the two fields that stay mutable
    /// after creation.
    pub fn assign_category(
        &mut self,
        transaction_external_id: &str,
        category_ident: Option<&str>,
    ) -> CoreResult<()> {
        let category_id = match category_ident {
            Some(ident) => Some(
                self.lookup_category_id(ident)?
                    .ok_or_else(|| CoreError::unresolved_reference("category", ident))?,
            ),
            None => None,
        };

        let updated = self
            .connection
            .execute(
                "UPDATE transactions SET category_id = ?1 WHERE external_id = ?2",
                params![category_id, transaction_external_id],
            )
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;

        if updated == 0 {
            return Err(CoreError::unresolved_reference(
                "transaction",
                transaction_external_id,
            ));
        }
        Ok(())
    }

    pub fn set_tags(
        &mut self,
        transaction_external_id: &str,
        tags: &BTreeSet<Tag>,
    ) -> CoreResult<()> {
        let updated = self
            .connection
            .execute(
                "UPDATE transactions SET tags = ?1 WHERE external_id = ?2",
                params![serialize_tags(tags), transaction_external_id],
            )
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;

        if updated == 0 {
            return Err(CoreError::unresolved_reference(
                "transaction",
                transaction_external_id,
            ));
        }
        Ok(())
    }

    /// Marks two stored transactions as the two halves of one inter-account
    /// transfer.
    pub fn link_transfer_pair(&mut self, left_external_id: &str, right_external_id: &str) -> CoreResult<()> {
        for (target, other) in [
            (left_external_id, right_external_id),
            (right_external_id, left_external_id),
        ] {
            let updated = self
                .connection
                .execute(
                    "UPDATE transactions SET transfer_pair_id = ?1 WHERE external_id = ?2",
                    params![other, target],
                )
                .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
            if updated == 0 {
                return Err(CoreError::unresolved_reference("transaction", target));
            }
        }
        Ok(())
    }

    /// Loads canonical transactions for a user, optionally bounded by posted
    /// date. This is the duplicate-detection and listing input.
    pub fn transactions_for_user(
        &self,
        user_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> CoreResult<Vec<Transaction>> {
        let from_bound = from.map(|date| date.to_string()).unwrap_or_default();
        let to_bound = to
            .map(|date| date.to_string())
            .unwrap_or_else(|| "9999-12-31".to_string());

        let mut statement = self
            .connection
            .prepare(
                "SELECT
                    t.external_id,
                    a.external_id,
                    t.transaction_date,
                    t.posted_date,
                    t.amount,
                    t.payee,
                    t.description,
                    t.memo,
                    c.ident,
                    t.tags,
                    t.transfer_pair_id,
                    t.user_id
                 FROM transactions t
                 JOIN accounts a ON a.account_id = t.account_id
                 LEFT JOIN categories c ON c.category_id = t.category_id
                 WHERE t.user_id = ?1
                   AND t.posted_date >= ?2
                   AND t.posted_date <= ?3
                 ORDER BY t.posted_date ASC, t.txn_id ASC",
            )
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;

        let rows_iter = statement
            .query_map(params![user_id, from_bound, to_bound], |row| {
                Ok(RawTransactionRow {
                    external_id: row.get(0)?,
                    account_external_id: row.get(1)?,
                    transaction_date: row.get(2)?,
                    posted_date: row.get(3)?,
                    amount: row.get(4)?,
                    payee: row.get(5)?,
                    description: row.get(6)?,
                    memo: row.get(7)?,
                    category_ident: row.get(8)?,
                    tags: row.get(9)?,
                    transfer_pair: row.get(10)?,
                    user_id: row.get(11)?,
                })
            })
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;

        let mut transactions = Vec::new();
        for raw_row in rows_iter {
            let raw = raw_row.map_err(|error| map_sqlite_error(&self.db_path, &error))?;
            transactions.push(raw.into_transaction(&self.db_path)?);
        }
        Ok(transactions)
    }
}

struct RawTransactionRow {
    external_id: String,
    account_external_id: String,
    transaction_date: String,
    posted_date: String,
    amount: String,
    payee: String,
    description: String,
    memo: Option<String>,
    category_ident: Option<String>,
    tags: String,
    transfer_pair: Option<String>,
    user_id: String,
}

impl RawTransactionRow {
    fn into_transaction(self, db_path: &Path) -> CoreResult<Transaction> {
        let transaction_date = parse_stored_date(&self.transaction_date, db_path)?;
        let posted_date = parse_stored_date(&self.posted_date, db_path)?;
        let amount = self
            .amount
            .parse::<Decimal>()
            .map_err(|_| CoreError::store_corrupt(db_path))?;

        Ok(Transaction {
            external_id: self.external_id,
            account: EntityRef::account(&self.account_external_id),
            transaction_date,
            posted_date,
            amount,
            payee: self.payee,
            description: self.description,
            memo: self.memo,
            category: self.category_ident.as_deref().map(EntityRef::category),
            tags: parse_tags(&self.tags),
            transfer_pair: self.transfer_pair,
            user_id: self.user_id,
        })
    }
}

fn upsert_institution(
    transaction: &rusqlite::Transaction<'_>,
    db_path: &Path,
    institution: &Institution,
) -> CoreResult<()> {
    let institution_id = format!("inst_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO institutions (institution_id, external_id, name, domain, url)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (external_id) DO UPDATE SET
                name = excluded.name,
                domain = excluded.domain,
                url = excluded.url",
            params![
                institution_id,
                &institution.external_id,
                &institution.name,
                &institution.domain,
                &institution.url,
            ],
        )
        .map_err(|error| {
            map_upsert_error(db_path, &error, "institution", &institution.external_id)
        })?;
    Ok(())
}

fn upsert_account(
    transaction: &rusqlite::Transaction<'_>,
    db_path: &Path,
    account: &Account,
) -> CoreResult<()> {
    let institution_id =
        lookup_id(
            transaction,
            db_path,
            "SELECT institution_id FROM institutions WHERE external_id = ?1",
            &account.institution.key,
        )?
        .ok_or_else(|| {
            CoreError::unresolved_reference("institution", &account.institution.key)
        })?;

    let account_id = format!("acct_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO accounts (account_id, external_id, external_name, institution_id, currency, kind, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (external_id) DO UPDATE SET
                external_name = excluded.external_name,
                currency = excluded.currency,
                kind = excluded.kind",
            params![
                account_id,
                &account.external_id,
                &account.external_name,
                institution_id,
                &account.currency,
                account.kind.as_str(),
                &account.user_id,
            ],
        )
        .map_err(|error| map_upsert_error(db_path, &error, "account", &account.external_id))?;
    Ok(())
}

fn upsert_transaction(
    transaction: &rusqlite::Transaction<'_>,
    db_path: &Path,
    row: &Transaction,
) -> CoreResult<()> {
    let account_id = lookup_id(
        transaction,
        db_path,
        "SELECT account_id FROM accounts WHERE external_id = ?1",
        &row.account.key,
    )?
    .ok_or_else(|| CoreError::unresolved_reference("account", &row.account.key))?;

    let category_id = match &row.category {
        Some(reference) => Some(
            lookup_id(
                transaction,
                db_path,
                "SELECT category_id FROM categories WHERE ident = ?1",
                &reference.key,
            )?
            .ok_or_else(|| CoreError::unresolved_reference("category", &reference.key))?,
        ),
        None => None,
    };

    // Provider fields are write-once per external id: re-ingesting the same
    // record is a no-op, and user-assigned category/tags are never clobbered.
    let txn_id = format!("txn_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO transactions (
                txn_id,
                external_id,
                account_id,
                transaction_date,
                posted_date,
                amount,
                payee,
                description,
                memo,
                category_id,
                tags,
                transfer_pair_id,
                user_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT (external_id) DO NOTHING",
            params![
                txn_id,
                &row.external_id,
                account_id,
                row.transaction_date.to_string(),
                row.posted_date.to_string(),
                row.amount.to_string(),
                &row.payee,
                &row.description,
                &row.memo,
                category_id,
                serialize_tags(&row.tags),
                &row.transfer_pair,
                &row.user_id,
            ],
        )
        .map_err(|error| map_upsert_error(db_path, &error, "transaction", &row.external_id))?;
    Ok(())
}

fn upsert_snapshot(
    transaction: &rusqlite::Transaction<'_>,
    db_path: &Path,
    snapshot: &Snapshot,
) -> CoreResult<()> {
    let account_id = lookup_id(
        transaction,
        db_path,
        "SELECT account_id FROM accounts WHERE external_id = ?1",
        &snapshot.account.key,
    )?
    .ok_or_else(|| CoreError::unresolved_reference("account", &snapshot.account.key))?;

    let snapshot_id = format!("snap_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO snapshots (snapshot_id, account_id, snapshot_date, balance, source)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (account_id, snapshot_date, source) DO UPDATE SET
                balance = excluded.balance",
            params![
                snapshot_id,
                account_id,
                snapshot.date.to_string(),
                snapshot.balance.to_string(),
                snapshot.source.as_str(),
            ],
        )
        .map_err(|error| {
            map_upsert_error(db_path, &error, "snapshot", &snapshot.account.key)
        })?;
    Ok(())
}

fn lookup_id(
    transaction: &rusqlite::Transaction<'_>,
    db_path: &Path,
    sql: &str,
    key: &str,
) -> CoreResult<Option<String>> {
    transaction
        .query_row(sql, params![key], |row| row.get::<_, String>(0))
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

impl Store {
    fn lookup_category_id(&self, ident: &str) -> CoreResult<Option<String>> {
        self.connection
            .query_row(
                "SELECT category_id FROM categories WHERE ident = ?1",
                params![ident],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))
    }
}

fn map_upsert_error(
    db_path: &Path,
    error: &rusqlite::Error,
    entity_kind: &str,
    key: &str,
) -> CoreError {
    if is_constraint_violation(error) {
        return CoreError::storage_conflict(entity_kind, key, &error.to_string());
    }
    map_sqlite_error(db_path, error)
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> CoreError {
    match error {
        rusqlite_migration::Error::RusqliteError { query: _, err } => {
            let mapped = map_sqlite_error(db_path, err);
            if mapped.code == "store_locked"
                || mapped.code == "store_corrupt"
                || mapped.code == "store_init_permission_denied"
            {
                mapped
            } else {
                CoreError::migration_failed(db_path, &error.to_string())
            }
        }
        _ => CoreError::migration_failed(db_path, &error.to_string()),
    }
}

fn serialize_tags(tags: &BTreeSet<Tag>) -> String {
    tags.iter()
        .map(|tag| tag.as_str())
        .collect::<Vec<&str>>()
        .join(",")
}

fn parse_tags(raw: &str) -> BTreeSet<Tag> {
    raw.split(',').filter_map(Tag::parse).collect()
}

fn parse_stored_date(raw: &str, db_path: &Path) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CoreError::store_corrupt(db_path))
}
