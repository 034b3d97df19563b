//! Digit grouping for amounts shown in the form.
//!
//! Inputs keep the raw numeric string; grouping is only applied when a value
//! is displayed and stripped again when the user edits it.

const GROUP_SEPARATOR: char = ',';

/// Group the integer digits of a numeric string in threes (`1234567` ->
/// `1,234,567`). A leading `-` and any fractional part are kept as-is;
/// anything that is not a plain number is returned unchanged.
pub fn format_number(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let (sign, unsigned) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }

    let mut grouped = String::with_capacity(value.len() + integer.len() / 3);
    grouped.push_str(sign);
    let lead = integer.len() % 3;
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (idx + 3 - lead) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Strip grouping separators back out of a displayed value.
pub fn unformat_number(value: &str) -> String {
    value.chars().filter(|ch| *ch != GROUP_SEPARATOR).collect()
}

/// Grouped rendering of a computed amount.
pub fn format_amount(amount: i64) -> String {
    format_number(&amount.to_string())
}
