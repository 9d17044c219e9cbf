use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

const PAIR_TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PAIR_TOKEN_LEN: usize = 8;
const RELAY_WS_TOKEN_BYTES: usize = 24;

/// 8 uniform characters from the 36-symbol alphabet, drawn from a
/// cryptographic RNG (`spec.md` §4.1). `spec.md` §9 flags the resulting
/// modulo bias (256 mod 36 ≠ 0) as acceptable as specified, not a bug to fix
/// here.
pub fn generate_pair_token() -> Result<String, rand::Error> {
    let mut raw = [0u8; PAIR_TOKEN_LEN];
    OsRng.try_fill_bytes(&mut raw)?;
    Ok(raw
        .iter()
        .map(|b| PAIR_TOKEN_ALPHABET[(*b as usize) % PAIR_TOKEN_ALPHABET.len()] as char)
        .collect())
}

/// 24 cryptographic random bytes, base64url without padding (`spec.md` §4.1).
pub fn generate_relay_ws_token() -> Result<String, rand::Error> {
    let mut raw = [0u8; RELAY_WS_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut raw)?;
    Ok(URL_SAFE_NO_PAD.encode(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_token_is_eight_chars_from_alphabet() {
        let token = generate_pair_token().unwrap();
        assert_eq!(token.len(), PAIR_TOKEN_LEN);
        assert!(token
            .bytes()
            .all(|b| PAIR_TOKEN_ALPHABET.contains(&b)));
    }

    #[test]
    fn relay_ws_token_has_no_padding() {
        let token = generate_relay_ws_token().unwrap();
        assert!(!token.contains('='));
        assert!(!token.is_empty());
    }
}
