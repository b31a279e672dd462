use crate::models::transactions::Cents;

pub fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Renders typed input as a BRL amount, reading the digits as centavos:
/// `"8000"` becomes `"R$ 80,00"`. Input without digits renders as `""`.
pub fn format_currency(raw: &str) -> String {
    let digits = digits(raw);
    if digits.is_empty() {
        return String::new();
    }

    let trimmed = digits.trim_start_matches('0');
    let padded = format!("{:0>3}", trimmed);
    let (int_part, frac_part) = padded.split_at(padded.len() - 2);

    format!("R$ {},{}", group_thousands(int_part), frac_part)
}

/// Reads the centavo amount back out of formatted or raw input.
pub fn parse_cents(display: &str) -> Option<Cents> {
    let digits = digits(display);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok().map(Cents)
}

pub fn format_cents(amount: Cents) -> String {
    format_currency(&amount.0.to_string())
}

pub fn format_reais(reais: f64) -> String {
    let formatted = format_cents(Cents::from_reais(reais.abs()));
    if reais <= -0.005 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

fn group_thousands(int_part: &str) -> String {
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_digits_as_centavos() {
        assert_eq!(format_currency("8000"), "R$ 80,00");
        assert_eq!(format_currency("5"), "R$ 0,05");
        assert_eq!(format_currency("000"), "R$ 0,00");
        assert_eq!(format_currency("123456789"), "R$ 1.234.567,89");
        assert_eq!(format_currency("R$ 1.000,00"), "R$ 1.000,00");
        assert_eq!(format_currency("12a3"), "R$ 1,23");
    }

    #[test]
    fn input_without_digits_renders_empty() {
        assert_eq!(format_currency(""), "");
        assert_eq!(format_currency("R$ ,"), "");
        assert_eq!(parse_cents("abc"), None);
    }

    #[test]
    fn stripping_a_formatted_amount_gives_back_the_integer() {
        for raw in ["8000", "0080", "1", "99999999", "100000000000", "2000"] {
            let formatted = format_currency(raw);
            let expected: u64 = raw.parse().unwrap();
            assert_eq!(parse_cents(&formatted), Some(Cents(expected)), "{}", raw);
        }
        assert_eq!(digits(&format_currency("8000")), "8000");
    }

    #[test]
    fn long_inputs_do_not_overflow_formatting() {
        let raw = "123456789012345678901234567890";
        assert_eq!(
            format_currency(raw),
            "R$ 1.234.567.890.123.456.789.012.345.678,90"
        );
        assert_eq!(parse_cents(raw), None);
    }

    #[test]
    fn reais_are_shown_with_sign() {
        assert_eq!(format_reais(1234.5), "R$ 1.234,50");
        assert_eq!(format_reais(0.0), "R$ 0,00");
        assert_eq!(format_reais(-20.0), "-R$ 20,00");
    }
}
