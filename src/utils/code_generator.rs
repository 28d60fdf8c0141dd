//! Short code generation and format validation.
//!
//! Codes are drawn from a 62-symbol alphanumeric alphabet using the operating
//! system's cryptographically secure random source.

use std::ops::RangeInclusive;

/// Symbols a short code may contain, in index order.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Accepted short code lengths.
pub const CODE_LENGTH_RANGE: RangeInclusive<usize> = 4..=8;

/// Length used when the caller does not ask for a specific one.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Random bytes consumed per generated symbol.
const BYTES_PER_SYMBOL: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum CodeGeneratorError {
    #[error("Short code length must be between 4 and 8, got {0}")]
    InvalidLength(usize),

    #[error("Random source failure: {0}")]
    RandomSource(getrandom::Error),
}

/// Generates a random short code of `length` symbols.
///
/// Each symbol combines two random bytes into a `u16` before reducing it
/// modulo the alphabet size, which keeps the modulo bias below 0.1%.
///
/// # Errors
///
/// Returns [`CodeGeneratorError::InvalidLength`] when `length` is outside
/// [`CODE_LENGTH_RANGE`], and [`CodeGeneratorError::RandomSource`] if the OS
/// random source fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(6)?;
/// assert_eq!(code.len(), 6);
/// assert!(is_valid_format(&code));
/// ```
pub fn generate_code(length: usize) -> Result<String, CodeGeneratorError> {
    generate_code_with(length, getrandom::fill)
}

/// Generates a short code using the given random source.
///
/// `fill` must overwrite the whole buffer it is handed.
pub fn generate_code_with<F>(length: usize, mut fill: F) -> Result<String, CodeGeneratorError>
where
    F: FnMut(&mut [u8]) -> Result<(), getrandom::Error>,
{
    if !CODE_LENGTH_RANGE.contains(&length) {
        return Err(CodeGeneratorError::InvalidLength(length));
    }

    let mut buffer = [0u8; BYTES_PER_SYMBOL * 8];
    let buffer = &mut buffer[..length * BYTES_PER_SYMBOL];
    fill(buffer).map_err(CodeGeneratorError::RandomSource)?;

    let code = buffer
        .chunks_exact(BYTES_PER_SYMBOL)
        .map(|pair| {
            let value = u16::from_be_bytes([pair[0], pair[1]]) as usize;
            ALPHABET[value % ALPHABET.len()] as char
        })
        .collect();

    Ok(code)
}

/// Returns true if `code` has an accepted length and only alphabet symbols.
pub fn is_valid_format(code: &str) -> bool {
    CODE_LENGTH_RANGE.contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_all_lengths() {
        for length in CODE_LENGTH_RANGE {
            for _ in 0..200 {
                let code = generate_code(length).unwrap();
                assert_eq!(code.len(), length);
                assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
            }
        }
    }

    #[test]
    fn test_generate_code_rejects_out_of_range_lengths() {
        for length in [0, 1, 3, 9, 12, 100] {
            let result = generate_code(length);
            assert!(
                matches!(result, Err(CodeGeneratorError::InvalidLength(l)) if l == length),
                "length {} should be rejected",
                length
            );
        }
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code(8).unwrap()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_symbol_mapping_uses_two_bytes() {
        // 0x0000 -> 'A', 0x0001 -> 'B', 0x003D (61) -> '9', 0x003E (62) wraps to 'A'
        let bytes = [0x00, 0x00, 0x00, 0x01, 0x00, 0x3D, 0x00, 0x3E];
        let code = generate_code_with(4, |buf| {
            buf.copy_from_slice(&bytes);
            Ok(())
        })
        .unwrap();

        assert_eq!(code, "AB9A");
    }

    #[test]
    fn test_high_byte_contributes() {
        // 0x0100 = 256, 256 % 62 = 8 -> 'I'
        let code = generate_code_with(4, |buf| {
            for pair in buf.chunks_exact_mut(2) {
                pair.copy_from_slice(&[0x01, 0x00]);
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(code, "IIII");
    }

    #[test]
    fn test_random_source_failure_is_propagated() {
        let result = generate_code_with(6, |_| Err(getrandom::Error::UNSUPPORTED));
        assert!(matches!(result, Err(CodeGeneratorError::RandomSource(_))));
    }

    #[test]
    fn test_alphabet_is_62_unique_symbols() {
        let unique: HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
    }

    #[test]
    fn test_is_valid_format() {
        assert!(is_valid_format("abc123"));
        assert!(is_valid_format("ABCD"));
        assert!(is_valid_format("aZ09aZ09"));

        assert!(!is_valid_format("aB3"));
        assert!(!is_valid_format("abc-123"));
        assert!(!is_valid_format("abcdefghi"));
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("abc_12"));
        assert!(!is_valid_format("abcé1"));
    }
}
