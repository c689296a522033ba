//! Field normalization for text scraped off unstable pages.

/// Strips everything but digits and the decimal point, then parses.
/// Unparsable or empty input yields `0.0`.
///
/// `"NT$1,234"` → `1234.0`, `"$0"` → `0.0`.
pub fn parse_price(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Normalizes the first `YYYY[.-/]M[.-/]D` occurrence into `YYYY-MM-DD`.
/// Text with no date pattern passes through raw.
///
/// `"2025.3.7 訂購"` → `"2025-03-07"`.
pub fn normalize_date(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    match find_date(text) {
        Some((y, m, d)) => format!("{y:04}-{m:02}-{d:02}"),
        None => text.to_string(),
    }
}

fn find_date(text: &str) -> Option<(u32, u32, u32)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            if let Some(parsed) = parse_date_at(text, i) {
                return Some(parsed);
            }
            // Skip past this digit run before trying again.
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    None
}

fn parse_date_at(text: &str, start: usize) -> Option<(u32, u32, u32)> {
    let mut rest = &text[start..];
    let year = take_digits(&mut rest, 4, 4)?;
    take_separator(&mut rest)?;
    let month = take_digits(&mut rest, 1, 2)?;
    take_separator(&mut rest)?;
    let day = take_digits(&mut rest, 1, 2)?;
    if (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some((year, month, day))
    } else {
        None
    }
}

fn take_digits(rest: &mut &str, min: usize, max: usize) -> Option<u32> {
    let len = rest
        .as_bytes()
        .iter()
        .take(max)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len < min {
        return None;
    }
    let value = rest[..len].parse().ok()?;
    *rest = &rest[len..];
    Some(value)
}

fn take_separator(rest: &mut &str) -> Option<()> {
    // The site renders dates with optional whitespace around the separator
    // ("2025. 3. 7 訂購").
    let trimmed = rest.trim_start();
    let first = trimmed.chars().next()?;
    if matches!(first, '.' | '-' | '/') {
        *rest = trimmed[first.len_utf8()..].trim_start();
        Some(())
    } else {
        None
    }
}

/// Keeps only `[A-Za-z0-9-]`, the character set of real Coupang order ids.
pub fn sanitize_order_id(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Leading integer out of text like `"2 件"`, floored at 1.
pub fn parse_quantity(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_strips_currency_markers() {
        assert_eq!(parse_price("NT$1,234"), 1234.0);
        assert_eq!(parse_price("$0"), 0.0);
        assert_eq!(parse_price("＄2,500"), 2500.0);
        assert_eq!(parse_price("1234.56 元"), 1234.56);
    }

    #[test]
    fn price_unparsable_is_zero() {
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("免費"), 0.0);
    }

    #[test]
    fn date_canonicalizes_dot_form() {
        assert_eq!(normalize_date("2025.3.7 訂購"), "2025-03-07");
        assert_eq!(normalize_date("2025. 3. 7 訂購"), "2025-03-07");
        assert_eq!(normalize_date("2024/12/01"), "2024-12-01");
        assert_eq!(normalize_date("2024-1-9"), "2024-01-09");
    }

    #[test]
    fn date_without_pattern_passes_through() {
        assert_eq!(normalize_date("昨天送達"), "昨天送達");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn date_rejects_out_of_range_components() {
        // 13th month is not a date; raw text is preserved.
        assert_eq!(normalize_date("2025.13.7"), "2025.13.7");
    }

    #[test]
    fn order_id_keeps_ascii_and_hyphen() {
        assert_eq!(sanitize_order_id("訂單 #A-123 "), "A-123");
    }

    #[test]
    fn quantity_defaults_and_floors() {
        assert_eq!(parse_quantity("3 件"), 3);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("0 件"), 1);
    }
}
