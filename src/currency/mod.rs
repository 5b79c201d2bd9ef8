//! Amount formatting for display.

/// Formats `amount` with two decimals, thousands grouping and `symbol` in front,
/// e.g. `-€1,234.50`.
pub fn format_amount(amount: f64, symbol: &str) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
