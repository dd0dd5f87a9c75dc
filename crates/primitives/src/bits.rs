//! Fixed hash types
use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;

construct_fixed_hash! {
    /// 32-byte content hash. Keys every node in the state and storage tries
    /// as well as contract code; always the Keccak-256 of the value it names.
    pub struct H256(32);
}

impl_fixed_hash_serde!(H256, 32);
