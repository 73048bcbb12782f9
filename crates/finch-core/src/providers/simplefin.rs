//! SimpleFIN payload transforms.
//!
//! SimpleFIN reports amounts as decimal strings with the canonical sign
//! convention already in place (negative = money out), and dates as UNIX
//! epoch seconds. Institutions arrive embedded in each account record under
//! `org`. Transaction records are nested per account in the wire format; the
//! provider client flattens them and stamps each with its `account_id`.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::{Account, AccountKind, EntityRef, Institution, Snapshot, SnapshotSource, Transaction};
use crate::normalize::{
    amount_field, currency_or_default, date_field, is_pending, optional_amount_field,
    optional_date_field, optional_text, required_text,
};
use crate::{CoreError, CoreResult};

const UNKNOWN_RECORD: &str = "(unknown)";

pub(crate) fn parse_institution(raw: &Value) -> CoreResult<Institution> {
    let org = raw.get("org").unwrap_or(raw);

    let domain = optional_text(org.get("domain"));
    let name = optional_text(org.get("name"));
    let url = optional_text(org.get("url")).or_else(|| optional_text(org.get("sfin-url")));

    let external_id = domain
        .clone()
        .or_else(|| name.clone())
        .ok_or_else(|| {
            CoreError::validation_error(
                "org",
                UNKNOWN_RECORD,
                "institution must carry a domain or name",
            )
        })?;
    let display_name = name.unwrap_or_else(|| external_id.clone());

    Ok(Institution {
        external_id,
        name: display_name,
        domain,
        url,
    })
}

pub(crate) fn parse_account(
    raw: &Value,
    institution_external_id: &str,
    user_id: &str,
) -> CoreResult<Account> {
    let external_id = required_text(raw.get("id"), "id", UNKNOWN_RECORD)?;
    let external_name =
        optional_text(raw.get("name")).unwrap_or_else(|| external_id.clone());
    let kind = match optional_text(raw.get("type")) {
        Some(label) => AccountKind::parse(&label),
        None => AccountKind::Other,
    };

    Ok(Account {
        currency: currency_or_default(raw.get("currency")),
        institution: EntityRef::institution(institution_external_id),
        external_id,
        external_name,
        kind,
        user_id: user_id.to_string(),
    })
}

pub(crate) fn parse_transaction(raw: &Value, user_id: &str) -> CoreResult<Option<Transaction>> {
    if is_pending(raw.get("pending")) {
        return Ok(None);
    }

    let external_id = required_text(raw.get("id"), "id", UNKNOWN_RECORD)?;
    let account_external_id = required_text(raw.get("account_id"), "account_id", &external_id)?;
    let posted_date = date_field(raw.get("posted"), "posted", &external_id)?;
    let transaction_date =
        optional_date_field(raw.get("transacted_at"), "transacted_at", &external_id)?
            .unwrap_or(posted_date);
    let amount = amount_field(raw.get("amount"), "amount", &external_id)?;
    let description = required_text(raw.get("description"), "description", &external_id)?;
    let payee = optional_text(raw.get("payee")).unwrap_or_else(|| description.clone());
    let memo = optional_text(raw.get("memo"));

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
    let account_external_id = required_text(raw.get("id"), "id", UNKNOWN_RECORD)?;

    let Some(balance) =
        optional_amount_field(raw.get("balance"), "balance", &account_external_id)?
    else {
        return Ok(None);
    };
    let date = optional_date_field(raw.get("balance-date"), "balance-date", &account_external_id)?
        .unwrap_or(fallback_date);

    Ok(Some(Snapshot {
        account: EntityRef::account(&account_external_id),
        date,
        balance,
        source: SnapshotSource::Provider,
    }))
}
