use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::Transaction;

/// A transaction belonging to a group of likely duplicates, augmented with
/// the size of its group. Detection only; resolution is a user decision.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateCandidate {
    pub transaction: Transaction,
    pub group_size: i64,
    /// True when another group member lives in the same account. True
    /// duplicates normally come from separate provider feeds, so
    /// same-account matches are surfaced for review rather than hidden.
    pub same_account: bool,
}

/// Groups transactions by (posted-date, amount, description, payee, memo);
/// any group with more than one member is a duplicate candidate set. Output
/// order is (transaction-date, amount, external-id) ascending.
pub fn find_duplicates(transactions: &[Transaction]) -> Vec<DuplicateCandidate> {
    let mut groups: HashMap<DuplicateKey, Vec<usize>> = HashMap::new();
    for (index, transaction) in transactions.iter().enumerate() {
        groups
            .entry(duplicate_key(transaction))
            .or_default()
            .push(index);
    }

    let mut candidates = Vec::new();
    for members in groups.values() {
        if members.len() < 2 {
            continue;
        }
        for &index in members {
            let transaction = &transactions[index];
            let same_account = members.iter().any(|&other| {
                other != index && transactions[other].account == transaction.account
            });
            candidates.push(DuplicateCandidate {
                transaction: transaction.clone(),
                group_size: members.len() as i64,
                same_account,
            });
        }
    }

    candidates.sort_by(|left, right| {
        left.transaction
            .transaction_date
            .cmp(&right.transaction.transaction_date)
            .then_with(|| left.transaction.amount.cmp(&right.transaction.amount))
            .then_with(|| {
                left.transaction
                    .external_id
                    .cmp(&right.transaction.external_id)
            })
    });
    candidates
}

/// The composite grouping key. A structural key keeps field boundaries
/// intact no matter what characters the text fields contain; the amount is
/// normalized so equal values with different scales land in one group.
#[derive(PartialEq, Eq, Hash)]
struct DuplicateKey {
    posted_date: NaiveDate,
    amount: Decimal,
    description: String,
    payee: String,
    memo: Option<String>,
}

fn duplicate_key(transaction: &Transaction) -> DuplicateKey {
    DuplicateKey {
        posted_date: transaction.posted_date,
        amount: transaction.amount.normalize(),
        description: transaction.description.clone(),
        payee: transaction.payee.clone(),
        memo: transaction.memo.clone(),
    }
}
