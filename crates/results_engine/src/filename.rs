use results_core::ResultRecord;

/// Windows-safe download name: `resultado_{order}_{transmitted digits}.pdf`.
///
/// Every non-digit in the transmission date becomes `-`, so
/// `2024-01-05 10:00` turns into `2024-01-05-10-00`.
pub fn pdf_filename(record: &ResultRecord) -> String {
    let order = sanitize_component(&record.order);
    let date: String = record
        .transmitted
        .chars()
        .map(|c| if c.is_ascii_digit() { c } else { '-' })
        .collect();
    format!("resultado_{order}_{date}.pdf")
}

fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return "sin_orden".to_string();
    }
    let mut name = cleaned.to_string();
    if name.len() > 80 {
        let mut cut = 80;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order: &str, transmitted: &str) -> ResultRecord {
        ResultRecord {
            order: order.to_string(),
            license: "LAB01".to_string(),
            transmitted: transmitted.to_string(),
            pdf_url: "https://portal.example/pdf/a.pdf".to_string(),
        }
    }

    #[test]
    fn transmitted_date_becomes_dashed_digits() {
        assert_eq!(
            pdf_filename(&record("000123", "2024-01-05 10:00")),
            "resultado_000123_2024-01-05-10-00.pdf"
        );
    }

    #[test]
    fn unsafe_order_characters_are_replaced() {
        assert_eq!(
            pdf_filename(&record("A/B:7", "05/01/2024")),
            "resultado_A_B_7_05-01-2024.pdf"
        );
        assert_eq!(
            pdf_filename(&record("//", "2024")),
            "resultado_sin_orden_2024.pdf"
        );
    }
}
