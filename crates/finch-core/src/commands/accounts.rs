use std::path::Path;

use rusqlite::{Connection, params};

use crate::CoreResult;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{AccountRow, AccountsData, AccountsSummary};
use crate::store::Store;
use crate::store::open::map_sqlite_error;

pub fn run(user_id: &str) -> CoreResult<SuccessEnvelope> {
    run_with_home_override(None, user_id)
}

#[doc(hidden)]
pub fn run_with_home_override(
    home_override: Option<&Path>,
    user_id: &str,
) -> CoreResult<SuccessEnvelope> {
    let store = match home_override {
        Some(home) => Store::open_at(home)?,
        None => Store::open_default()?,
    };

    let data = query_accounts_data(store.connection(), store.db_path(), user_id)?;
    success("accounts list", data)
}

pub(crate) fn query_accounts_data(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> CoreResult<AccountsData> {
    let summary = connection
        .query_row(
            "SELECT
                COUNT(DISTINCT a.institution_id) AS institution_count,
                COUNT(DISTINCT a.account_id) AS account_count,
                COUNT(t.txn_id) AS transaction_count,
                MIN(t.posted_date) AS earliest_posted_date,
                MAX(t.posted_date) AS latest_posted_date
             FROM accounts a
             LEFT JOIN transactions t ON t.account_id = a.account_id
             WHERE a.user_id = ?1",
            params![user_id],
            |row| {
                Ok(AccountsSummary {
                    institution_count: row.get(0)?,
                    account_count: row.get(1)?,
                    transaction_count: row.get(2)?,
                    earliest_posted_date: row.get(3)?,
                    latest_posted_date: row.get(4)?,
                })
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut statement = connection
        .prepare(
            "SELECT
                a.external_id,
                a.external_name,
                i.name,
                a.currency,
                a.kind,
                COUNT(t.txn_id) AS txn_count,
                (SELECT s.balance
                 FROM snapshots s
                 WHERE s.account_id = a.account_id
                 ORDER BY s.snapshot_date DESC
                 LIMIT 1) AS latest_balance
             FROM accounts a
             JOIN institutions i ON i.institution_id = a.institution_id
             LEFT JOIN transactions t ON t.account_id = a.account_id
             WHERE a.user_id = ?1
             GROUP BY a.account_id, a.external_id, a.external_name, i.name, a.currency, a.kind
             ORDER BY i.name ASC, a.external_name ASC, a.external_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map(params![user_id], |row| {
            Ok(AccountRow {
                external_id: row.get(0)?,
                name: row.get(1)?,
                institution: row.get(2)?,
                currency: row.get(3)?,
                kind: row.get(4)?,
                txn_count: row.get(5)?,
                latest_balance: row.get(6)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    Ok(AccountsData { summary, rows })
}
