//! SADP checksum.
//!
//! This is not the Internet checksum. Words are summed into two interleaved
//! accumulators, a trailing word goes into a third, and the result is folded
//! twice before the complement. The second argument is the sender's
//! client-type discriminant (0x42 for tools, 0xF6 for devices); it selects how
//! many bytes of the frame are covered.

use crate::error::{Result, SadpError};

/// Discriminant used by discovery tools (high byte of client type 0x4201).
pub const CLIENT_DISCRIMINANT: u32 = 0x42;

/// Discriminant used by devices (high byte of client type 0xF601).
pub const SERVER_DISCRIMINANT: u32 = 0xF6;

/// Compute the checksum of `words` for the given client-type discriminant.
///
/// Fails with [`SadpError::ChecksumOutOfBounds`] when `words` is too short
/// for the number of bytes the discriminant covers.
pub fn checksum(words: &[u16], discriminant: u32) -> Result<u16> {
    let needed = words_required(discriminant);
    if words.len() < needed {
        return Err(SadpError::ChecksumOutOfBounds {
            discriminant,
            needed,
            available: words.len(),
        });
    }

    let mut remaining = discriminant;
    let mut var1: u32 = 0;
    let mut var2: u32 = 0;
    let mut var3: u32 = 0;
    let mut pos = 0usize;

    if remaining & !1 > 3 {
        let rounds = ((remaining - 4) >> 2) + 1;
        for _ in 0..rounds {
            remaining = remaining.wrapping_sub(4);
            var1 = var1.wrapping_add(words[pos] as u32);
            var2 = var2.wrapping_add(words[pos + 1] as u32);
            pos += 2;
        }
    }

    if remaining > 1 {
        var3 = words[pos] as u32;
        pos += 1;
        remaining -= 2;
    }

    let mut sum = var3.wrapping_add(var1).wrapping_add(var2);
    if remaining != 0 {
        sum = sum.wrapping_add((words[pos] & 0xFF) as u32);
    }

    sum = (sum >> 16) + (sum & 0xFFFF);
    Ok(!((sum >> 16).wrapping_add(sum)) as u16)
}

/// Number of 16-bit words `checksum` reads for `discriminant`.
pub fn words_required(discriminant: u32) -> usize {
    let mut remaining = discriminant;
    let mut count = 0usize;
    if remaining & !1 > 3 {
        let rounds = ((remaining - 4) >> 2) + 1;
        count += 2 * rounds as usize;
        remaining -= 4 * rounds;
    }
    if remaining > 1 {
        count += 1;
        remaining -= 2;
    }
    if remaining != 0 {
        count += 1;
    }
    count
}

/// Reinterpret a byte buffer as little-endian 16-bit words.
///
/// An odd trailing byte becomes the low byte of a final word.
pub fn words_le(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match *pair {
            [lo, hi] => u16::from_le_bytes([lo, hi]),
            [lo] => lo as u16,
            _ => 0,
        })
        .collect()
}
