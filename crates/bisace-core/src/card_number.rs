//! Card number normalization.
//!
//! The access engine stores card numbers left-padded with `0` to a fixed
//! width, and stores the raw code data as the uppercase hex encoding of the
//! padded number.

/// Width card numbers are padded to unless a tenant overrides it.
pub const DEFAULT_CARD_NUMBER_LENGTH: usize = 12;

/// Left-pad `number` with `0` to `width` characters.
///
/// Surrounding whitespace is removed first. Numbers already at or beyond
/// `width` are returned unchanged.
pub fn pad_card_number(number: &str, width: usize) -> String {
    let number = number.trim();
    let len = number.chars().count();
    if len >= width {
        return number.to_string();
    }
    let mut padded = "0".repeat(width - len);
    padded.push_str(number);
    padded
}

/// Uppercase hex encoding of the bytes of a (padded) card number.
pub fn card_code_data(padded_number: &str) -> String {
    padded_number
        .bytes()
        .map(|b| format!("{b:02X}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_numbers() {
        assert_eq!(pad_card_number("1234", 12), "000000001234");
        assert_eq!(pad_card_number("  77 ", 4), "0077");
    }

    #[test]
    fn long_numbers_are_unchanged() {
        assert_eq!(pad_card_number("1234567890123", 12), "1234567890123");
        assert_eq!(pad_card_number("123456789012", 12), "123456789012");
    }

    #[test]
    fn code_data_is_uppercase_hex() {
        assert_eq!(card_code_data("0012"), "30303132");
        assert_eq!(card_code_data("AB"), "4142");
        assert_eq!(card_code_data(""), "");
    }
}
