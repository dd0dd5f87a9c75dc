#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Commonly used types in lith.
//!
//! This crate contains the content-addressed hash type, the Keccak-256
//! helper, the canonical trie constants and the Merkle-Patricia node
//! primitives shared by the rest of the workspace.

mod account;
mod bits;
pub mod trie;

pub use account::TrieAccount;
pub use bits::H256;

use hex_literal::hex;

/// Root hash of an empty trie, KEC(RLP("")).
pub const EMPTY_ROOT: H256 =
    H256(hex!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"));

/// Keccak-256 hash of empty code, KEC("").
pub const KECCAK_EMPTY: H256 =
    H256(hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"));

/// Returns the keccak256 hash for the given data.
#[inline]
pub fn keccak256(data: impl AsRef<[u8]>) -> H256 {
    use tiny_keccak::{Hasher, Keccak};

    let mut buf = [0u8; 32];
    let mut hasher = Keccak::v256();
    hasher.update(data.as_ref());
    hasher.finalize(&mut buf);
    buf.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input_is_the_empty_code_hash() {
        assert_eq!(keccak256([]), KECCAK_EMPTY);
    }

    #[test]
    fn keccak_of_empty_string_rlp_is_the_empty_trie_root() {
        // RLP("") is the single byte 0x80.
        assert_eq!(keccak256([0x80]), EMPTY_ROOT);
    }
}
