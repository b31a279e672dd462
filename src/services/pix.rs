use super::formatting::digits;
use crate::models::pix::PixKeyType;

const KEY_DIGITS: usize = 11;

/// Applies the progressive mask for `kind` to whatever has been typed so far.
pub fn format_key(kind: PixKeyType, value: &str) -> String {
    match kind {
        PixKeyType::Cpf => format_cpf(value),
        PixKeyType::Phone => format_phone(value),
        PixKeyType::Email => value.to_string(),
    }
}

/// Format check only: CPF check digits are not verified.
pub fn validate_key(kind: PixKeyType, value: &str) -> bool {
    match kind {
        PixKeyType::Cpf | PixKeyType::Phone => digits(value).len() == KEY_DIGITS,
        PixKeyType::Email => is_valid_email(value),
    }
}

/// The key as the gateway expects it: bare digits for CPF and phone.
pub fn submission_key(kind: PixKeyType, value: &str) -> String {
    match kind {
        PixKeyType::Cpf | PixKeyType::Phone => digits(value),
        PixKeyType::Email => value.trim().to_string(),
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// `000.000.000-00`, truncated at eleven digits.
pub fn format_cpf(value: &str) -> String {
    let digits: Vec<char> = digits(value).chars().take(KEY_DIGITS).collect();
    let mut formatted = String::with_capacity(14);

    for (i, c) in digits.iter().enumerate() {
        match i {
            3 | 6 => formatted.push('.'),
            9 => formatted.push('-'),
            _ => {}
        }
        formatted.push(*c);
    }
    formatted
}

/// `(00) 00000-0000`, truncated at eleven digits.
pub fn format_phone(value: &str) -> String {
    let digits: Vec<char> = digits(value).chars().take(KEY_DIGITS).collect();
    if digits.len() <= 2 {
        return digits.into_iter().collect();
    }

    let mut formatted = String::with_capacity(15);
    formatted.push('(');
    for (i, c) in digits.iter().enumerate() {
        match i {
            2 => formatted.push_str(") "),
            7 => formatted.push('-'),
            _ => {}
        }
        formatted.push(*c);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_mask_grows_with_input() {
        assert_eq!(format_cpf("123"), "123");
        assert_eq!(format_cpf("1234"), "123.4");
        assert_eq!(format_cpf("1234567"), "123.456.7");
        assert_eq!(format_cpf("1234567890"), "123.456.789-0");
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
        assert_eq!(format_cpf("123456789012345"), "123.456.789-01");
        assert_eq!(format_cpf("123.456.789-01"), "123.456.789-01");
    }

    #[test]
    fn phone_mask_grows_with_input() {
        assert_eq!(format_phone("1"), "1");
        assert_eq!(format_phone("11"), "11");
        assert_eq!(format_phone("119"), "(11) 9");
        assert_eq!(format_phone("1198765"), "(11) 98765");
        assert_eq!(format_phone("11987654"), "(11) 98765-4");
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("119876543210"), "(11) 98765-4321");
    }

    #[test]
    fn digit_keys_need_exactly_eleven_digits() {
        for kind in [PixKeyType::Cpf, PixKeyType::Phone] {
            assert!(validate_key(kind, "12345678901"));
            assert!(validate_key(kind, "123.456.789-01"));
            assert!(!validate_key(kind, "1234567890"));
            assert!(!validate_key(kind, "123456789012"));
            assert!(!validate_key(kind, ""));
        }
        assert!(validate_key(PixKeyType::Cpf, "000.000.000-00"));
    }

    #[test]
    fn email_keys_follow_the_simple_pattern() {
        assert!(validate_key(PixKeyType::Email, "ana@mail.com"));
        assert!(validate_key(PixKeyType::Email, "a@b.c"));
        assert!(validate_key(PixKeyType::Email, "a@b.c.d"));
        assert!(!validate_key(PixKeyType::Email, "ana.mail.com"));
        assert!(!validate_key(PixKeyType::Email, "ana@mailcom"));
        assert!(!validate_key(PixKeyType::Email, "ana@.com"));
        assert!(!validate_key(PixKeyType::Email, "ana@mail."));
        assert!(!validate_key(PixKeyType::Email, "@mail.com"));
        assert!(!validate_key(PixKeyType::Email, "ana@@mail.com"));
        assert!(!validate_key(PixKeyType::Email, "ana maria@mail.com"));
    }

    #[test]
    fn submission_keeps_email_and_strips_masks() {
        assert_eq!(submission_key(PixKeyType::Cpf, "123.456.789-01"), "12345678901");
        assert_eq!(submission_key(PixKeyType::Phone, "(11) 98765-4321"), "11987654321");
        assert_eq!(submission_key(PixKeyType::Email, " ana@mail.com "), "ana@mail.com");
        assert_eq!(format_key(PixKeyType::Email, "ana@"), "ana@");
    }
}
