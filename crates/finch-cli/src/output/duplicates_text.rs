use std::io;

use serde_json::Value;

use super::format::{key_value_rows, simple_table};

pub fn render_duplicates(data: &Value) -> io::Result<String> {
    let user = data.get("user_id").and_then(Value::as_str).unwrap_or("");
    let scanned = data
        .get("transaction_count")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let candidates = data
        .get("candidate_count")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let mut lines = vec![format!("Duplicate candidates for user {user}"), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Transactions scanned:", scanned.to_string()),
            ("Candidates:", candidates.to_string()),
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
        lines.push("  No duplicate candidates found.".to_string());
        return Ok(lines.join("\n"));
    }

    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                text(row, "posted_date"),
                text(row, "amount"),
                text(row, "account"),
                text(row, "description"),
                text(row, "payee"),
                row.get("group_size")
                    .and_then(Value::as_i64)
                    .unwrap_or(0)
                    .to_string(),
                if row.get("same_account").and_then(Value::as_bool) == Some(true) {
                    "yes".to_string()
                } else {
                    "no".to_string()
                },
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.push(String::new());
    lines.extend(simple_table(
        &[
            "Posted",
            "Amount",
            "Account",
            "Description",
            "Payee",
            "Group",
            "Same acct",
        ],
        &table_rows,
    ));

    Ok(lines.join("\n"))
}

fn text(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}
