//! Access token value types.

use std::fmt;
use std::ops::Deref;

use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

pub const TOKEN_PREFIX: &str = "LAB";
pub const TOKEN_GROUP_LEN: usize = 4;

const TOKEN_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
// Largest multiple of the alphabet size below u32::MAX; draws at or above it are rejected.
const UNBIASED_LIMIT: u32 = u32::MAX - (u32::MAX % TOKEN_ALPHABET.len() as u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenFormatError {
    #[error("Token cannot be empty")]
    Empty,
    #[error("Token must look like LAB-XXXX-YYYY")]
    Malformed,
}

/// Normalized `LAB-XXXX-YYYY` token string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenString(String);

impl TokenString {
    /// Trims and upper-cases client input before validating its shape.
    pub fn parse(raw: &str) -> Result<Self, TokenFormatError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(TokenFormatError::Empty);
        }
        let mut parts = normalized.split('-');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(TOKEN_PREFIX), Some(first), Some(second), None)
                if is_group(first) && is_group(second) =>
            {
                Ok(Self(normalized))
            }
            _ => Err(TokenFormatError::Malformed),
        }
    }

    /// Builds a token from a source of uniform `u32` draws.
    pub fn generate(mut next_u32: impl FnMut() -> u32) -> Self {
        let mut value = String::with_capacity(TOKEN_PREFIX.len() + 2 * (TOKEN_GROUP_LEN + 1));
        value.push_str(TOKEN_PREFIX);
        for _ in 0..2 {
            value.push('-');
            for _ in 0..TOKEN_GROUP_LEN {
                value.push(pick_symbol(&mut next_u32));
            }
        }
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe form that masks the second group, e.g. `LAB-AB12-****`.
    pub fn redacted(&self) -> String {
        let visible = TOKEN_PREFIX.len() + TOKEN_GROUP_LEN + 2;
        format!("{}{}", &self.0[..visible], "*".repeat(TOKEN_GROUP_LEN))
    }
}

fn is_group(group: &str) -> bool {
    group.len() == TOKEN_GROUP_LEN && group.bytes().all(|b| TOKEN_ALPHABET.contains(&b))
}

fn pick_symbol(next_u32: &mut impl FnMut() -> u32) -> char {
    loop {
        let draw = next_u32();
        if draw < UNBIASED_LIMIT {
            let index = (draw % TOKEN_ALPHABET.len() as u32) as usize;
            return char::from(TOKEN_ALPHABET[index]);
        }
    }
}

impl fmt::Display for TokenString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for TokenString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TokenString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Single-use credential for one terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: TokenString,
    issued_at: DateTime<Utc>,
    consumed: bool,
}

impl AccessToken {
    pub fn new(value: TokenString, issued_at: DateTime<Utc>) -> Self {
        Self {
            value,
            issued_at,
            consumed: false,
        }
    }

    pub fn value(&self) -> &TokenString {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Marks the token consumed. Returns `false` when it already was.
    pub fn consume(&mut self) -> bool {
        !std::mem::replace(&mut self.consumed, true)
    }

    pub fn restore(&mut self) {
        self.consumed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let token = TokenString::parse("  lab-ab12-cd34\n").unwrap();
        assert_eq!(token.as_str(), "LAB-AB12-CD34");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert_eq!(TokenString::parse("   "), Err(TokenFormatError::Empty));
        for raw in [
            "LAB-ABC-DEFG",
            "LAB-ABCD-EFGH-IJKL",
            "LAB-AB_D-EFGH",
            "XYZ-ABCD-EFGH",
            "LABABCDEFGH",
        ] {
            assert_eq!(
                TokenString::parse(raw),
                Err(TokenFormatError::Malformed),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_redacted_hides_second_group() {
        let token = TokenString::parse("LAB-AB12-CD34").unwrap();
        assert_eq!(token.redacted(), "LAB-AB12-****");
        assert!(!token.redacted().contains("CD34"));
    }

    #[test]
    fn test_generate_matches_format() {
        let mut n = 0u32;
        let token = TokenString::generate(|| {
            n = n.wrapping_add(7);
            n
        });
        assert_eq!(TokenString::parse(token.as_str()).unwrap(), token);
        assert_eq!(token.len(), 13);
    }

    #[test]
    fn test_generate_rejects_biased_draws() {
        let mut draws = [u32::MAX, UNBIASED_LIMIT, 0].into_iter().cycle();
        let token = TokenString::generate(|| draws.next().unwrap_or(0));
        assert_eq!(token.as_str(), "LAB-AAAA-AAAA");
    }

    #[test]
    fn test_consume_only_once() {
        let mut token = AccessToken::new(TokenString::parse("LAB-AAAA-BBBB").unwrap(), Utc::now());
        assert!(token.consume());
        assert!(!token.consume());
        token.restore();
        assert!(!token.is_consumed());
    }
}
