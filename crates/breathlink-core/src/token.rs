//! Pairing-token generation.
//!
//! Tokens are the shared secret a peer must present during the handshake.
//! One token is generated per listening period; static pairing mode skips
//! generation and uses a pre-shared token instead.

use rand::seq::SliceRandom;

/// Token length in characters.
pub const TOKEN_LEN: usize = 6;

/// Alphabet tokens are drawn from.
const TOKEN_SYMBOLS: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a fresh pairing token: [`TOKEN_LEN`] distinct
/// uppercase-alphanumeric characters.
///
/// Characters are sampled without replacement, so a token never repeats a
/// symbol — peers type these by hand off a screen, and distinct symbols cut
/// down on transcription mistakes.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    TOKEN_SYMBOLS.choose_multiple(&mut rng, TOKEN_LEN).map(|&byte| char::from(byte)).collect()
}

/// Whether `token` has the shape of a pairing token: exactly [`TOKEN_LEN`]
/// uppercase-alphanumeric ASCII characters.
///
/// Used to reject unusable pre-shared tokens at configuration time rather
/// than at handshake time.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
