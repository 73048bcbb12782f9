//! Plaid payload transforms.
//!
//! Plaid reports amounts as floating-point JSON numbers in major currency
//! units with positive = debit, so the adapter negates to the canonical
//! convention (negative = money out). Dates arrive as ISO strings; `date` is
//! the posted date and `authorized_date`, when present, is the transaction
//! date. A missing `merchant_name` falls back to the raw `name` as payee.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::{Account, AccountKind, EntityRef, Institution, Snapshot, SnapshotSource, Transaction};
use crate::normalize::{
    amount_field, currency_or_default, date_field, is_pending, optional_amount_field,
    optional_date_field, optional_text, required_text,
};
use crate::CoreResult;

const UNKNOWN_RECORD: &str = "(unknown)";

pub(crate) fn parse_institution(raw: &Value) -> CoreResult<Institution> {
    let external_id = required_text(raw.get("institution_id"), "institution_id", UNKNOWN_RECORD)?;
    let name = optional_text(raw.get("name")).unwrap_or_else(|| external_id.clone());

    Ok(Institution {
        url: optional_text(raw.get("url")),
        domain: None,
        external_id,
        name,
    })
}

pub(crate) fn parse_account(
    raw: &Value,
    institution_external_id: &str,
    user_id: &str,
) -> CoreResult<Account> {
    let external_id = required_text(raw.get("account_id"), "account_id", UNKNOWN_RECORD)?;
    let external_name = optional_text(raw.get("official_name"))
        .or_else(|| optional_text(raw.get("name")))
        .unwrap_or_else(|| external_id.clone());

    Ok(Account {
        currency: currency_or_default(
            raw.pointer("/balances/iso_currency_code")
                .or_else(|| raw.get("iso_currency_code")),
        ),
        institution: EntityRef::institution(institution_external_id),
        kind: account_kind(raw),
        external_id,
        external_name,
        user_id: user_id.to_string(),
    })
}

pub(crate) fn parse_transaction(raw: &Value, user_id: &str) -> CoreResult<Option<Transaction>> {
    if is_pending(raw.get("pending")) {
        return Ok(None);
    }

    let external_id = required_text(raw.get("transaction_id"), "transaction_id", UNKNOWN_RECORD)?;
    let account_external_id = required_text(raw.get("account_id"), "account_id", &external_id)?;
    let posted_date = date_field(raw.get("date"), "date", &external_id)?;
    let transaction_date =
        optional_date_field(raw.get("authorized_date"), "authorized_date", &external_id)?
            .unwrap_or(posted_date);
    // Plaid sign convention: positive = money out.
    let amount = -amount_field(raw.get("amount"), "amount", &external_id)?;
    let description = required_text(raw.get("name"), "name", &external_id)?;
    let payee = optional_text(raw.get("merchant_name")).unwrap_or_else(|| description.clone());
    let memo = optional_text(raw.get("original_description"));

    Ok(Some(Transaction {
        account: EntityRef::account(&account_external_id),
        external_id,
        transaction_date,
        posted_date,
        amount,
        payee,
        description,
        memo,
        category: None,
        tags: BTreeSet::new(),
        transfer_pair: None,
        user_id: user_id.to_string(),
    }))
}

pub(crate) fn parse_snapshot(raw: &Value, fallback_date: NaiveDate) -> CoreResult<Option<Snapshot>> {
    let account_external_id = required_text(raw.get("account_id"), "account_id", UNKNOWN_RECORD)?;

    let Some(balance) = optional_amount_field(
        raw.pointer("/balances/current"),
        "balances.current",
        &account_external_id,
    )?
    else {
        return Ok(None);
    };

    Ok(Some(Snapshot {
        account: EntityRef::account(&account_external_id),
        date: fallback_date,
        balance,
        source: SnapshotSource::Provider,
    }))
}

fn account_kind(raw: &Value) -> AccountKind {
    if let Some(subtype) = optional_text(raw.get("subtype")) {
        let parsed = AccountKind::parse(&subtype);
        if parsed != AccountKind::Other {
            return parsed;
        }
    }
    match optional_text(raw.get("type")) {
        Some(label) => AccountKind::parse(&label),
        None => AccountKind::Other,
    }
}
