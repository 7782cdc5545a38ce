//! Byte classification for the scanner.
//!
//! All functions operate on raw UTF-8 bytes. Any byte `>= 0x80` is treated as
//! part of an identifier, so a multi-byte character is never split by a token
//! boundary.

/// Returned by [`byte_at`] when reading past the end of the input.
pub const EOI: u8 = 0x1A;

/// The byte at `offset`, or [`EOI`] past the end.
#[inline]
#[must_use]
pub fn byte_at(src: &[u8], offset: usize) -> u8 {
    src.get(offset).copied().unwrap_or(EOI)
}

#[inline]
#[must_use]
pub const fn is_end_of_input(b: u8) -> bool {
    b == EOI
}

#[inline]
#[must_use]
pub const fn is_whitespace(b: u8) -> bool {
    (b <= 0x20 && b != EOI) || b == 0x7F
}

#[inline]
#[must_use]
pub const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline]
#[must_use]
pub const fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// Characters that may continue an identifier.
#[inline]
#[must_use]
pub const fn is_identifier_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#' || b >= 0x80
}

/// Characters that may start an unquoted identifier.
#[inline]
#[must_use]
pub const fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

/// Characters that can start a punctuation/operator token.
#[inline]
#[must_use]
pub const fn is_symbol(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')'
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b'+'
            | b'-'
            | b'*'
            | b'/'
            | b'%'
            | b'^'
            | b'='
            | b'>'
            | b'<'
            | b'~'
            | b'!'
            | b'?'
            | b'&'
            | b'|'
            | b'.'
            | b':'
            | b'#'
            | b','
            | b';'
            | b'@'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_past_end() {
        assert_eq!(byte_at(b"ab", 1), b'b');
        assert_eq!(byte_at(b"ab", 2), EOI);
        assert!(is_end_of_input(byte_at(b"", 0)));
    }

    #[test]
    fn whitespace_classes() {
        for b in [b' ', b'\t', b'\n', b'\r', 0x00, 0x7F] {
            assert!(is_whitespace(b), "{b:#x}");
        }
        assert!(!is_whitespace(EOI));
        assert!(!is_whitespace(b'a'));
    }

    #[test]
    fn identifier_classes() {
        assert!(is_identifier_start(b'a'));
        assert!(is_identifier_start(b'$'));
        assert!(is_identifier_start(0xC3));
        assert!(!is_identifier_start(b'1'));
        assert!(!is_identifier_start(b'#'));
        assert!(is_identifier_char(b'#'));
        assert!(is_identifier_char(b'9'));
        assert!(!is_identifier_char(b'.'));
    }

    #[test]
    fn symbol_classes() {
        for b in b"()[]{}+-*/%^=><~!?&|.:#,;@" {
            assert!(is_symbol(*b), "{}", *b as char);
        }
        assert!(!is_symbol(b'\''));
        assert!(!is_symbol(b'`'));
    }
}
