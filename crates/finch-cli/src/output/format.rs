use std::cmp;

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    if entries.is_empty() {
        return Vec::new();
    }

    let label_width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

/// Left-aligned table with a header row, indented two spaces. Widths grow to
/// the longest cell; output is for terminals, not machine parsing.
pub fn simple_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    if headers.is_empty() {
        return Vec::new();
    }

    let mut widths = headers
        .iter()
        .map(|header| header.len())
        .collect::<Vec<usize>>();
    for row in rows {
        for (index, value) in row.iter().enumerate() {
            if let Some(slot) = widths.get_mut(index) {
                *slot = cmp::max(*slot, value.len());
            }
        }
    }

    let mut output = Vec::with_capacity(rows.len() + 1);
    output.push(format_row(
        &headers
            .iter()
            .map(|header| (*header).to_string())
            .collect::<Vec<String>>(),
        &widths,
    ));
    for row in rows {
        output.push(format_row(row, &widths));
    }
    output
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let pieces = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let value = cells.get(index).map(String::as_str).unwrap_or("");
            format!("{value:<width$}")
        })
        .collect::<Vec<String>>();
    format!("  {}", pieces.join("  ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::{key_value_rows, simple_table};

    #[test]
    fn key_value_rows_align_labels() {
        let rows = key_value_rows(
            &[
                ("Accounts:", "3".to_string()),
                ("Transactions:", "120".to_string()),
            ],
            2,
        );

        assert_eq!(rows[0], "  Accounts:      3");
        assert_eq!(rows[1], "  Transactions:  120");
    }

    #[test]
    fn simple_table_pads_to_widest_cell() {
        let rendered = simple_table(
            &["Account", "Amount"],
            &[vec!["chequing-main".to_string(), "-42.15".to_string()]],
        );

        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].starts_with("  Account"));
        assert!(rendered[1].contains("chequing-main"));
        assert!(rendered[1].contains("-42.15"));
    }
}
