use std::fs;
use std::path::PathBuf;

use finch_core::providers::Provider;
use finch_core::sync::window::{DateRange, epoch_window};
use finch_core::sync::{AccountsPayload, ProviderClient};
use finch_core::{CoreError, CoreResult};
use serde_json::Value;

/// Provider client backed by a pre-fetched payload file. The orchestrator
/// drives it exactly like a live HTTP client; this one just replays the raw
/// JSON a provider export produced.
pub struct FileClient {
    provider: Provider,
    path: PathBuf,
}

impl FileClient {
    pub fn new(provider: Provider, path: &str) -> Self {
        Self {
            provider,
            path: PathBuf::from(path),
        }
    }

    fn load(&self) -> CoreResult<Value> {
        let raw = fs::read_to_string(&self.path).map_err(|error| {
            CoreError::provider_error(
                &format!("payload file `{}`", self.path.display()),
                &error.to_string(),
            )
        })?;
        serde_json::from_str(&raw).map_err(|error| {
            CoreError::provider_error(
                &format!("payload file `{}`", self.path.display()),
                &format!("not valid JSON: {error}"),
            )
        })
    }
}

impl ProviderClient for FileClient {
    fn fetch_accounts(&self) -> CoreResult<AccountsPayload> {
        let payload = self.load()?;
        accounts_payload(self.provider, &payload)
    }

    fn fetch_transactions(
        &self,
        account_external_id: &str,
        range: &DateRange,
    ) -> CoreResult<Vec<Value>> {
        let payload = self.load()?;
        match self.provider {
            Provider::SimpleFin => simplefin_transactions(&payload, account_external_id, range),
            Provider::Plaid => plaid_transactions(&payload, account_external_id, range),
        }
    }
}

fn accounts_payload(provider: Provider, payload: &Value) -> CoreResult<AccountsPayload> {
    let accounts = payload
        .get("accounts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CoreError::provider_error("accounts payload", "missing `accounts` array")
        })?
        .clone();

    let institution = match provider {
        // SimpleFIN embeds the org in each account record.
        Provider::SimpleFin => None,
        Provider::Plaid => payload.get("institution").cloned(),
    };

    Ok(AccountsPayload {
        institution,
        accounts,
    })
}

/// SimpleFIN nests transactions under each account and omits the account id
/// from the transaction records themselves, so the client stamps it on before
/// handing records to the adapter.
fn simplefin_transactions(
    payload: &Value,
    account_external_id: &str,
    range: &DateRange,
) -> CoreResult<Vec<Value>> {
    let account = find_account(payload, "id", account_external_id)?;
    let (from_epoch, to_epoch) = epoch_window(range);

    let rows = account
        .get("transactions")
        .and_then(Value::as_array)
        .map(|transactions| {
            transactions
                .iter()
                .filter(|raw| {
                    raw.get("posted")
                        .and_then(Value::as_i64)
                        .is_some_and(|posted| posted >= from_epoch && posted < to_epoch)
                })
                .map(|raw| stamp_account_id(raw, account_external_id))
                .collect()
        })
        .unwrap_or_default();

    Ok(rows)
}

fn plaid_transactions(
    payload: &Value,
    account_external_id: &str,
    range: &DateRange,
) -> CoreResult<Vec<Value>> {
    find_account(payload, "account_id", account_external_id)?;

    let start = range.start.to_string();
    let end = range.end.to_string();

    let rows = payload
        .get("transactions")
        .and_then(Value::as_array)
        .map(|transactions| {
            transactions
                .iter()
                .filter(|raw| {
                    raw.get("account_id").and_then(Value::as_str) == Some(account_external_id)
                })
                .filter(|raw| {
                    // Plaid dates are ISO `YYYY-MM-DD`, so lexicographic
                    // bounds match calendar bounds.
                    raw.get("date")
                        .and_then(Value::as_str)
                        .is_some_and(|date| date >= start.as_str() && date <= end.as_str())
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Ok(rows)
}

fn find_account<'a>(payload: &'a Value, id_key: &str, external_id: &str) -> CoreResult<&'a Value> {
    payload
        .get("accounts")
        .and_then(Value::as_array)
        .and_then(|accounts| {
            accounts.iter().find(|account| {
                account.get(id_key).and_then(Value::as_str) == Some(external_id)
            })
        })
        .ok_or_else(|| {
            CoreError::provider_error(
                "transactions payload",
                &format!("account `{external_id}` not present in payload"),
            )
        })
}

fn stamp_account_id(raw: &Value, account_external_id: &str) -> Value {
    let mut stamped = raw.clone();
    if let Value::Object(fields) = &mut stamped {
        fields.insert(
            "account_id".to_string(),
            Value::String(account_external_id.to_string()),
        );
    }
    stamped
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use finch_core::providers::Provider;
    use finch_core::sync::window::DateRange;
    use serde_json::{Value, json};

    use super::{accounts_payload, plaid_transactions, simplefin_transactions};

    fn window(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2);
        let end = NaiveDate::from_ymd_opt(end.0, end.1, end.2);
        assert!(start.is_some() && end.is_some());
        DateRange {
            start: start.unwrap_or_default(),
            end: end.unwrap_or_default(),
        }
    }

    #[test]
    fn simplefin_payload_has_no_top_level_institution() {
        let payload = json!({
            "accounts": [
                {"id": "acc-1", "org": {"name": "First Bank"}}
            ]
        });

        let parsed = accounts_payload(Provider::SimpleFin, &payload);
        assert!(parsed.is_ok());
        if let Ok(value) = parsed {
            assert!(value.institution.is_none());
            assert_eq!(value.accounts.len(), 1);
        }
    }

    #[test]
    fn plaid_payload_carries_top_level_institution() {
        let payload = json!({
            "institution": {"institution_id": "ins_1", "name": "Plaid Bank"},
            "accounts": [{"account_id": "acc-1", "name": "Chequing"}]
        });

        let parsed = accounts_payload(Provider::Plaid, &payload);
        assert!(parsed.is_ok());
        if let Ok(value) = parsed {
            assert!(value.institution.is_some());
        }
    }

    #[test]
    fn missing_accounts_array_is_a_provider_error() {
        let parsed = accounts_payload(Provider::SimpleFin, &json!({"rows": []}));
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert_eq!(error.code, "provider_error");
        }
    }

    #[test]
    fn simplefin_transactions_are_stamped_and_window_filtered() {
        // 1719792000 = 2024-07-01, 1704067200 = 2024-01-01.
        let payload = json!({
            "accounts": [{
                "id": "acc-1",
                "transactions": [
                    {"id": "t1", "posted": 1719792000, "amount": "-5.00", "description": "COFFEE"},
                    {"id": "t2", "posted": 1704067200, "amount": "-9.00", "description": "OLD"}
                ]
            }]
        });

        let rows = simplefin_transactions(&payload, "acc-1", &window((2024, 6, 30), (2024, 12, 31)));
        assert!(rows.is_ok());
        if let Ok(rows) = rows {
            assert_eq!(rows.len(), 1);
            assert_eq!(
                rows[0].get("account_id").and_then(Value::as_str),
                Some("acc-1")
            );
            assert_eq!(rows[0].get("id").and_then(Value::as_str), Some("t1"));
        }
    }

    #[test]
    fn plaid_transactions_filter_by_account_and_date() {
        let payload = json!({
            "accounts": [
                {"account_id": "acc-1"},
                {"account_id": "acc-2"}
            ],
            "transactions": [
                {"transaction_id": "t1", "account_id": "acc-1", "date": "2024-07-01", "amount": 5.0},
                {"transaction_id": "t2", "account_id": "acc-2", "date": "2024-07-01", "amount": 5.0},
                {"transaction_id": "t3", "account_id": "acc-1", "date": "2023-01-01", "amount": 5.0}
            ]
        });

        let rows = plaid_transactions(&payload, "acc-1", &window((2024, 6, 30), (2024, 12, 31)));
        assert!(rows.is_ok());
        if let Ok(rows) = rows {
            assert_eq!(rows.len(), 1);
            assert_eq!(
                rows[0].get("transaction_id").and_then(Value::as_str),
                Some("t1")
            );
        }
    }

    #[test]
    fn unknown_account_is_a_provider_error() {
        let payload = json!({"accounts": []});
        let rows = simplefin_transactions(&payload, "ghost", &window((2024, 1, 1), (2024, 2, 1)));
        assert!(rows.is_err());
    }
}
