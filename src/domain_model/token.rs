use std::fmt;
use std::str::FromStr;

/// Length in bytes of each half of a token.
pub const TOKEN_PART_BYTES: usize = 16;

/// Length in hex characters of each half of a token on the wire.
pub const TOKEN_PART_HEX_LEN: usize = TOKEN_PART_BYTES * 2;

pub const TOKEN_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPart {
    Identifier,
    Verifier,
}

impl fmt::Display for TokenPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPart::Identifier => write!(f, "identifier"),
            TokenPart::Verifier => write!(f, "verifier"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedToken {
    #[error("missing '.' separator")]
    MissingSeparator,
    #[error("more than one '.' separator")]
    TooManySeparators,
    #[error("{part} has length {len}, expected 32")]
    InvalidLength { part: TokenPart, len: usize },
    #[error("{part} is not lowercase hex")]
    InvalidHex { part: TokenPart },
}

/// A session token: public identifier plus secret verifier.
///
/// Wire form is `hex(identifier) + "." + hex(verifier)`, both halves 32
/// lowercase hex characters. `Debug` never prints the verifier.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    identifier: String,
    verifier: [u8; TOKEN_PART_BYTES],
}

impl SessionToken {
    pub fn from_parts(
        identifier: [u8; TOKEN_PART_BYTES],
        verifier: [u8; TOKEN_PART_BYTES],
    ) -> Self {
        SessionToken {
            identifier: hex::encode(identifier),
            verifier,
        }
    }

    /// Hex identifier, the key under which the session is stored.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn verifier(&self) -> &[u8] {
        &self.verifier
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.identifier,
            TOKEN_SEPARATOR,
            hex::encode(self.verifier)
        )
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("identifier", &self.identifier)
            .field("verifier", &"<redacted>")
            .finish()
    }
}

impl FromStr for SessionToken {
    type Err = MalformedToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (identifier, verifier) = s
            .split_once(TOKEN_SEPARATOR)
            .ok_or(MalformedToken::MissingSeparator)?;
        if verifier.contains(TOKEN_SEPARATOR) {
            return Err(MalformedToken::TooManySeparators);
        }

        let identifier_bytes = decode_part(identifier, TokenPart::Identifier)?;
        let verifier = decode_part(verifier, TokenPart::Verifier)?;
        Ok(SessionToken::from_parts(identifier_bytes, verifier))
    }
}

fn decode_part(part: &str, which: TokenPart) -> Result<[u8; TOKEN_PART_BYTES], MalformedToken> {
    if part.len() != TOKEN_PART_HEX_LEN {
        return Err(MalformedToken::InvalidLength {
            part: which,
            len: part.len(),
        });
    }
    // hex::decode also accepts uppercase, which would never match a stored identifier
    if !part.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(MalformedToken::InvalidHex { part: which });
    }

    let mut out = [0u8; TOKEN_PART_BYTES];
    hex::decode_to_slice(part, &mut out).map_err(|_| MalformedToken::InvalidHex { part: which })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "00112233445566778899aabbccddeeff";
    const VERIFIER: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn parses_and_formats_wire_form() {
        let wire = format!("{ID}.{VERIFIER}");
        let token: SessionToken = wire.parse().unwrap();

        assert_eq!(token.identifier(), ID);
        assert_eq!(token.verifier(), hex::decode(VERIFIER).unwrap().as_slice());
        assert_eq!(token.to_string(), wire);
    }

    #[test]
    fn from_parts_encodes_lowercase_hex() {
        let token = SessionToken::from_parts([0xAB; TOKEN_PART_BYTES], [0x0F; TOKEN_PART_BYTES]);
        assert_eq!(
            token.to_string(),
            format!("{}.{}", "ab".repeat(16), "0f".repeat(16))
        );
    }

    #[test]
    fn rejects_missing_separator() {
        assert_eq!(
            "not-a-token".parse::<SessionToken>(),
            Err(MalformedToken::MissingSeparator)
        );
        assert_eq!("".parse::<SessionToken>(), Err(MalformedToken::MissingSeparator));
    }

    #[test]
    fn rejects_extra_separator() {
        let wire = format!("{ID}.{VERIFIER}.{VERIFIER}");
        assert_eq!(
            wire.parse::<SessionToken>(),
            Err(MalformedToken::TooManySeparators)
        );
    }

    #[test]
    fn rejects_short_verifier() {
        let wire = format!("{ID}.12345678");
        assert_eq!(
            wire.parse::<SessionToken>(),
            Err(MalformedToken::InvalidLength {
                part: TokenPart::Verifier,
                len: 8
            })
        );
    }

    #[test]
    fn rejects_empty_identifier() {
        let wire = format!(".{VERIFIER}");
        assert_eq!(
            wire.parse::<SessionToken>(),
            Err(MalformedToken::InvalidLength {
                part: TokenPart::Identifier,
                len: 0
            })
        );
    }

    #[test]
    fn rejects_non_hex_and_uppercase() {
        let bad = format!("{}.{VERIFIER}", "zz".repeat(16));
        assert_eq!(
            bad.parse::<SessionToken>(),
            Err(MalformedToken::InvalidHex {
                part: TokenPart::Identifier
            })
        );

        let upper = format!("{ID}.{}", VERIFIER.to_uppercase());
        assert_eq!(
            upper.parse::<SessionToken>(),
            Err(MalformedToken::InvalidHex {
                part: TokenPart::Verifier
            })
        );
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        let wire = format!("{}.{VERIFIER}", "é".repeat(16));
        assert_eq!(
            wire.parse::<SessionToken>(),
            Err(MalformedToken::InvalidHex {
                part: TokenPart::Identifier
            })
        );
    }

    #[test]
    fn debug_redacts_verifier() {
        let token: SessionToken = format!("{ID}.{VERIFIER}").parse().unwrap();
        let debug = format!("{token:?}");
        assert!(debug.contains(ID));
        assert!(!debug.contains(VERIFIER));
    }
}
