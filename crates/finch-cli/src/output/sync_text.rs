use std::io;

use serde_json::Value;

use super::format::key_value_rows;

pub fn render_sync(data: &Value) -> io::Result<String> {
    let provider = text_field(data, "provider");
    let user = text_field(data, "user_id");
    let phase = text_field(data, "phase");

    let mut lines = vec![format!("Sync {phase} ({provider}, user {user})")];

    if let Some(window) = data.get("window").filter(|value| !value.is_null()) {
        let start = text_field(window, "start");
        let end = text_field(window, "end");
        let months = window
            .get("months_back")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        lines.push(String::new());
        lines.push(format!("  Window:  {start} to {end} ({months} months)"));
    }

    lines.push(String::new());
    lines.push("  Upserted:".to_string());
    lines.extend(count_rows(data.get("success")));

    if data
        .get("failed")
        .and_then(Value::as_object)
        .is_some_and(|counts| !counts.is_empty())
    {
        lines.push(String::new());
        lines.push("  Failed:".to_string());
        lines.extend(count_rows(data.get("failed")));
    }

    if let Some(errors) = data.get("errors").and_then(Value::as_array)
        && !errors.is_empty()
    {
        lines.push(String::new());
        lines.push("  Issues:".to_string());
        for (index, issue) in errors.iter().enumerate() {
            let message = text_field(issue, "message");
            lines.push(format!("    {}. {message}", index + 1));
        }
    }

    Ok(lines.join("\n"))
}

fn count_rows(counts: Option<&Value>) -> Vec<String> {
    let Some(counts) = counts.and_then(Value::as_object) else {
        return vec!["    (none)".to_string()];
    };
    if counts.is_empty() {
        return vec!["    (none)".to_string()];
    }

    let entries = counts
        .iter()
        .map(|(kind, count)| (kind.as_str(), count.as_i64().unwrap_or(0).to_string()))
        .collect::<Vec<(&str, String)>>();
    key_value_rows(&entries, 4)
}

fn text_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_sync;

    #[test]
    fn renders_counts_window_and_issues() {
        let data = json!({
            "provider": "simplefin",
            "user_id": "u1",
            "phase": "completed",
            "success": {"transactions": 4},
            "failed": {"transactions": 1},
            "errors": [
                {"message": "Cannot parse `amount` for record `t9`: not a decimal", "context": null}
            ],
            "window": {"start": "2024-06-30", "end": "2024-12-31", "months_back": 6}
        });

        let rendered = render_sync(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Sync completed (simplefin, user u1)"));
            assert!(text.contains("2024-06-30 to 2024-12-31 (6 months)"));
            assert!(text.contains("transactions  4"));
            assert!(text.contains("Failed:"));
            assert!(text.contains("1. Cannot parse `amount`"));
        }
    }

    #[test]
    fn clean_sync_omits_failed_and_issue_sections() {
        let data = json!({
            "provider": "plaid",
            "user_id": "u1",
            "phase": "completed",
            "success": {"accounts": 2, "institutions": 1},
            "failed": {},
            "errors": []
        });

        let rendered = render_sync(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(!text.contains("Failed:"));
            assert!(!text.contains("Issues:"));
            assert!(text.contains("accounts      2"));
        }
    }
}
