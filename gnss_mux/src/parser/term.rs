//! Field scanners shared by the NMEA and Unicore ASCII parsers.
//!
//! A term is the text between two delimiters. Scanners skip leading
//! spaces, accept one leading `-` and stop at the first byte they do not
//! understand, so an empty or garbled field yields zero instead of an error.

use num_traits::float::FloatCore;

use crate::parser::buffer::FixedBuffer;

/// Bounded term buffer, bytes beyond `N` are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Term<const N: usize> {
    buf: FixedBuffer<N>,
}

impl<const N: usize> Term<N> {
    pub(crate) fn push(&mut self, byte: u8) {
        let _ = self.buf.push(byte);
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub(crate) fn number(&self) -> i32 {
        parse_number(self.as_bytes())
    }

    pub(crate) fn double(&self) -> f64 {
        parse_real(self.as_bytes())
    }

    pub(crate) fn float(&self) -> f32 {
        parse_real(self.as_bytes())
    }

    pub(crate) fn character(&self) -> Option<char> {
        parse_char(self.as_bytes())
    }
}

fn skip_spaces(term: &[u8]) -> &[u8] {
    let start = term.iter().position(|b| *b != b' ').unwrap_or(term.len());
    &term[start..]
}

fn split_sign(term: &[u8]) -> (bool, &[u8]) {
    match term.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, term),
    }
}

/// Parses a signed decimal integer.
pub fn parse_number(term: &[u8]) -> i32 {
    let (minus, digits) = split_sign(skip_spaces(term));
    let value = digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i32, |acc, b| {
            acc.wrapping_mul(10).wrapping_add(i32::from(b - b'0'))
        });
    if minus {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Parses a signed fixed-point decimal such as `-4717.11399`, no exponent.
pub fn parse_real<T: FloatCore>(term: &[u8]) -> T {
    let ten = cast::<T>(10);
    let (minus, mut rest) = split_sign(skip_spaces(term));
    let mut value = T::zero();
    let mut power = T::one();

    while let Some((b, tail)) = rest.split_first().filter(|(b, _)| b.is_ascii_digit()) {
        value = value * ten + cast::<T>(b - b'0');
        rest = tail;
    }
    if let Some((b'.', tail)) = rest.split_first() {
        rest = tail;
    }
    while let Some((b, tail)) = rest.split_first().filter(|(b, _)| b.is_ascii_digit()) {
        value = value * ten + cast::<T>(b - b'0');
        power = power * ten;
        rest = tail;
    }

    let value = value / power;
    if minus {
        -value
    } else {
        value
    }
}

/// First non-space character of the term.
pub fn parse_char(term: &[u8]) -> Option<char> {
    skip_spaces(term).first().map(|b| char::from(*b))
}

/// Reads `count` decimal digits starting at `offset`, `None` if any is missing.
pub(crate) fn parse_fixed_digits(term: &[u8], offset: usize, count: usize) -> Option<u32> {
    let digits = term.get(offset..offset + count)?;
    digits.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

fn cast<T: FloatCore>(v: u8) -> T {
    <T as num_traits::NumCast>::from(v).unwrap_or_else(T::zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_skips_spaces_and_handles_sign() {
        assert_eq!(parse_number(b"08"), 8);
        assert_eq!(parse_number(b"  -42"), -42);
        assert_eq!(parse_number(b"12abc"), 12);
        assert_eq!(parse_number(b""), 0);
        assert_eq!(parse_number(b"-"), 0);
    }

    #[test]
    fn number_wraps_instead_of_panicking() {
        let _ = parse_number(b"99999999999999999999");
    }

    #[test]
    fn real_parsing() {
        let v: f64 = parse_real(b"4717.11399");
        assert!((v - 4717.11399).abs() < 1e-9);
        let v: f64 = parse_real(b" -0.5");
        assert!((v + 0.5).abs() < 1e-12);
        let v: f32 = parse_real(b"1.01");
        assert!((v - 1.01).abs() < 1e-6);
        let v: f32 = parse_real(b"499");
        assert_eq!(v, 499.0);
        let v: f64 = parse_real(b"");
        assert_eq!(v, 0.0);
    }

    #[test]
    fn char_parsing() {
        assert_eq!(parse_char(b"N"), Some('N'));
        assert_eq!(parse_char(b"  E"), Some('E'));
        assert_eq!(parse_char(b""), None);
    }

    #[test]
    fn fixed_digits() {
        assert_eq!(parse_fixed_digits(b"092725.00", 0, 2), Some(9));
        assert_eq!(parse_fixed_digits(b"092725.00", 2, 2), Some(27));
        assert_eq!(parse_fixed_digits(b"0927", 4, 2), None);
        assert_eq!(parse_fixed_digits(b"09x7", 2, 2), None);
    }

    #[test]
    fn term_truncates_at_capacity() {
        let mut term = Term::<4>::default();
        for b in b"123456" {
            term.push(*b);
        }
        assert_eq!(term.as_bytes(), b"1234");
        assert_eq!(term.number(), 1234);
        term.clear();
        assert!(term.as_bytes().is_empty());
        assert_eq!(term.character(), None);
    }
}
