//! Brazilian Real formatting.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol, followed by a non-breaking space in formatted output.
pub const CURRENCY_SYMBOL: &str = "R$";

/// Formats `amount` as Brazilian Real: `R$ 1.234,56`, with `.` grouping
/// thousands, `,` before exactly two decimals and a non-breaking space after
/// the symbol. Negative amounts get a leading `-`.
///
/// Amounts are rounded half away from zero; a value that rounds to zero is
/// never shown as negative.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = format!("{:.2}", rounded.abs());
    let (reais, centavos) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut formatted = String::with_capacity(digits.len() + 8);
    if negative {
        formatted.push('-');
    }
    formatted.push_str(CURRENCY_SYMBOL);
    formatted.push('\u{a0}');
    formatted.push_str(&group_thousands(reais));
    formatted.push(',');
    formatted.push_str(centavos);
    formatted
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_format_with_thousands_separator() {
        assert_eq!(format_currency(dec("1234.56")), "R$\u{a0}1.234,56");
        assert_eq!(format_currency(dec("1234567.8")), "R$\u{a0}1.234.567,80");
    }

    #[test]
    fn test_format_small_and_zero_amounts() {
        assert_eq!(format_currency(Decimal::ZERO), "R$\u{a0}0,00");
        assert_eq!(format_currency(dec("0.5")), "R$\u{a0}0,50");
        assert_eq!(format_currency(dec("0.05")), "R$\u{a0}0,05");
        assert_eq!(format_currency(dec("999")), "R$\u{a0}999,00");
        assert_eq!(format_currency(dec("1000")), "R$\u{a0}1.000,00");
    }

    #[test]
    fn test_format_negative_amount() {
        assert_eq!(format_currency(dec("-1234.56")), "-R$\u{a0}1.234,56");
        assert_eq!(format_currency(dec("-0.001")), "R$\u{a0}0,00");
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        assert_eq!(format_currency(dec("10.005")), "R$\u{a0}10,01");
        assert_eq!(format_currency(dec("10.004")), "R$\u{a0}10,00");
        assert_eq!(format_currency(dec("-10.005")), "-R$\u{a0}10,01");
    }

    #[test]
    fn test_format_extreme_amounts() {
        let formatted = format_currency(Decimal::MAX);
        assert!(formatted.starts_with("R$\u{a0}79.228."));
        assert!(formatted.ends_with(",00"));
        assert!(format_currency(Decimal::MIN).starts_with("-R$\u{a0}79.228."));
    }

    #[test]
    fn test_formatted_string_parses_back_to_rounded_amount() {
        let amount = dec("98765.432");
        let formatted = format_currency(amount);
        let numeric = formatted
            .trim_start_matches(CURRENCY_SYMBOL)
            .trim_start_matches('\u{a0}')
            .replace('.', "")
            .replace(',', ".");
        assert_eq!(dec(&numeric), dec("98765.43"));
    }
}
