use finch_core::CoreError;

pub fn render_error(error: &CoreError) -> String {
    let mut lines = vec![
        "Something went wrong.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];

    if let Some(context) = &error.context
        && let Some(fields) = context.as_object()
        && !fields.is_empty()
    {
        lines.push(String::new());
        lines.push("  Context:".to_string());
        for (key, value) in fields {
            let rendered = match value.as_str() {
                Some(text) => text.to_string(),
                None => value.to_string(),
            };
            lines.push(format!("    {key}: {rendered}"));
        }
    }

    lines.join("\n")
}
