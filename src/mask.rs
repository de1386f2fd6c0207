//! Payload masking (RFC 6455 Section 5.3)
//!
//! Client-to-server frames carry a 4-byte masking key; payload byte `i` is
//! XORed with `key[i % 4]`. The transform is its own inverse, so the same
//! functions mask and unmask. Masking is transport-level obfuscation, not
//! encryption.
//!
//! Both functions take a rotation cursor (which key byte lines up with the
//! first input byte) and return the cursor for the byte after the last.
//! Feeding the returned value into the next call makes masking a payload in
//! N pieces byte-for-byte identical to masking it in one piece, whatever the
//! split points.

/// XOR `buf` in place with the rotating key and return the next rotation.
///
/// Pass `offset = 0` at the start of a frame's payload; pass the returned
/// value for the following fragment of the same frame.
pub fn apply_mask(buf: &mut [u8], key: [u8; 4], offset: u8) -> u8 {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= key[(i + offset as usize) % 4];
    }
    ((buf.len() + offset as usize) % 4) as u8
}

/// Copying form of [`apply_mask`]: reads `src`, writes the transformed bytes
/// into `dst`, returns the next rotation.
///
/// `dst` must be at least as long as `src`; bytes of `dst` past `src.len()`
/// are left untouched.
pub fn apply_mask_into(dst: &mut [u8], src: &[u8], key: [u8; 4], offset: u8) -> u8 {
    debug_assert!(dst.len() >= src.len());
    for (i, (d, s)) in dst.iter_mut().zip(src).enumerate() {
        *d = s ^ key[(i + offset as usize) % 4];
    }
    ((src.len() + offset as usize) % 4) as u8
}
