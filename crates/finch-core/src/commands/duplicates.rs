use std::path::Path;

use chrono::NaiveDate;

use crate::CoreResult;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{DuplicateRow, DuplicatesData};
use crate::dedupe::find_duplicates;
use crate::store::Store;

pub fn run(
    user_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> CoreResult<SuccessEnvelope> {
    run_with_home_override(None, user_id, from, to)
}

#[doc(hidden)]
pub fn run_with_home_override(
    home_override: Option<&Path>,
    user_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> CoreResult<SuccessEnvelope> {
    let store = match home_override {
        Some(home) => Store::open_at(home)?,
        None => Store::open_default()?,
    };

    let transactions = store.transactions_for_user(user_id, from, to)?;
    let candidates = find_duplicates(&transactions);

    let rows: Vec<DuplicateRow> = candidates
        .iter()
        .map(|candidate| DuplicateRow {
            external_id: candidate.transaction.external_id.clone(),
            account: candidate.transaction.account.key.clone(),
            posted_date: candidate.transaction.posted_date.to_string(),
            amount: candidate.transaction.amount.to_string(),
            description: candidate.transaction.description.clone(),
            payee: candidate.transaction.payee.clone(),
            memo: candidate.transaction.memo.clone(),
            group_size: candidate.group_size,
            same_account: candidate.same_account,
        })
        .collect();

    let data = DuplicatesData {
        user_id: user_id.to_string(),
        transaction_count: i64::try_from(transactions.len()).unwrap_or(i64::MAX),
        candidate_count: i64::try_from(rows.len()).unwrap_or(i64::MAX),
        rows,
    };
    success("duplicates", data)
}
