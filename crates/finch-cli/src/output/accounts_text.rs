use std::io;

use serde_json::Value;

use super::format::{key_value_rows, simple_table};

pub fn render_accounts(data: &Value) -> io::Result<String> {
    let summary = data.get("summary").cloned().unwrap_or(Value::Null);
    let earliest = summary
        .get("earliest_posted_date")
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string();
    let latest = summary
        .get("latest_posted_date")
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string();

    let mut lines = vec!["Synced accounts".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Institutions:", count(&summary, "institution_count")),
            ("Accounts:", count(&summary, "account_count")),
            ("Transactions:", count(&summary, "transaction_count")),
            ("Data range:", format!("{earliest} to {latest}")),
        ],
        2,
    ));

    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if rows.is_empty() {
        lines.push(String::new());
        lines.push("  No accounts synced yet. Run `finch sync accounts` first.".to_string());
        return Ok(lines.join("\n"));
    }

    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                text(row, "institution"),
                text(row, "name"),
                text(row, "kind"),
                text(row, "currency"),
                count(row, "txn_count"),
                row.get("latest_balance")
                    .and_then(Value::as_str)
                    .unwrap_or("-")
                    .to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.push(String::new());
    lines.extend(simple_table(
        &["Institution", "Account", "Kind", "Currency", "Txns", "Balance"],
        &table_rows,
    ));

    Ok(lines.join("\n"))
}

fn count(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .to_string()
}

fn text(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_accounts;

    #[test]
    fn renders_summary_and_account_rows() {
        let data = json!({
            "summary": {
                "institution_count": 1,
                "account_count": 2,
                "transaction_count": 10,
                "earliest_posted_date": "2024-01-01",
                "latest_posted_date": "2024-07-01"
            },
            "rows": [
                {
                    "external_id": "acc-1",
                    "name": "Everyday Chequing",
                    "institution": "First Bank",
                    "currency": "USD",
                    "kind": "chequing",
                    "txn_count": 10,
                    "latest_balance": "1250.00"
                }
            ]
        });

        let rendered = render_accounts(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Institutions:"));
            assert!(text.contains("2024-01-01 to 2024-07-01"));
            assert!(text.contains("Everyday Chequing"));
            assert!(text.contains("1250.00"));
        }
    }

    #[test]
    fn empty_store_prompts_a_sync() {
        let data = json!({
            "summary": {
                "institution_count": 0,
                "account_count": 0,
                "transaction_count": 0,
                "earliest_posted_date": null,
                "latest_posted_date": null
            },
            "rows": []
        });

        let rendered = render_accounts(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("No accounts synced yet."));
        }
    }
}
