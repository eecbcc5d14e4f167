//! Room code generation.

use liars_dice_protocol::RoomCode;
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws a random room code of `len` characters from the thread RNG.
pub(crate) fn generate(len: usize) -> RoomCode {
    generate_with(&mut rand::rng(), len)
}

/// Draws a room code from `rng`. `len` is clamped to what
/// [`RoomCode::parse`] accepts.
pub(crate) fn generate_with(rng: &mut impl Rng, len: usize) -> RoomCode {
    let len = len.clamp(1, RoomCode::MAX_LEN);
    let raw: String = (0..len)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    RoomCode::parse(&raw).expect("alphabet characters are valid room code characters")
}
