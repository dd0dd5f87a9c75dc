use crate::H256;
use alloy_rlp::{Buf, Header};

/// The two trailing fields of an RLP account record, which are all state sync
/// needs to discover a contract's storage trie and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieAccount {
    /// Root of the account's storage trie.
    pub storage_root: H256,
    /// Keccak-256 of the account's code.
    pub code_hash: H256,
}

impl TrieAccount {
    /// Reads the storage root and code hash out of an encoded account record
    /// without materializing nonce or balance.
    pub fn decode_roots(mut buf: &[u8]) -> Result<Self, alloy_rlp::Error> {
        let header = Header::decode(&mut buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString)
        }
        if buf.len() != header.payload_length {
            return Err(alloy_rlp::Error::UnexpectedLength)
        }
        // Skip nonce and balance unparsed.
        for _ in 0..2 {
            let item = Header::decode(&mut buf)?;
            if item.list {
                return Err(alloy_rlp::Error::UnexpectedList)
            }
            if buf.len() < item.payload_length {
                return Err(alloy_rlp::Error::InputTooShort)
            }
            buf.advance(item.payload_length);
        }
        let storage_root = decode_hash(&mut buf)?;
        let code_hash = decode_hash(&mut buf)?;
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength)
        }
        Ok(Self { storage_root, code_hash })
    }
}

fn decode_hash(buf: &mut &[u8]) -> Result<H256, alloy_rlp::Error> {
    let item = Header::decode(buf)?;
    if item.list {
        return Err(alloy_rlp::Error::UnexpectedList)
    }
    if item.payload_length != 32 || buf.len() < 32 {
        return Err(alloy_rlp::Error::UnexpectedLength)
    }
    let hash = H256::from_slice(&buf[..32]);
    buf.advance(32);
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keccak256, EMPTY_ROOT, KECCAK_EMPTY};
    use alloy_rlp::Encodable;

    fn encode_account(nonce: u64, balance: u64, storage_root: H256, code_hash: H256) -> Vec<u8> {
        let payload_length =
            nonce.length() + balance.length() + 33 + 33;
        let mut out = Vec::new();
        Header { list: true, payload_length }.encode(&mut out);
        nonce.encode(&mut out);
        balance.encode(&mut out);
        storage_root.as_bytes().encode(&mut out);
        code_hash.as_bytes().encode(&mut out);
        out
    }

    #[test]
    fn reads_trailing_roots() {
        let storage_root = keccak256(b"storage");
        let code_hash = keccak256(b"code");
        for (nonce, balance) in [(0, 0), (1, 1), (u64::MAX, u64::MAX)] {
            let encoded = encode_account(nonce, balance, storage_root, code_hash);
            let account = TrieAccount::decode_roots(&encoded).unwrap();
            assert_eq!(account.storage_root, storage_root);
            assert_eq!(account.code_hash, code_hash);
        }
    }

    #[test]
    fn empty_account_uses_canonical_constants() {
        let encoded = encode_account(0, 0, EMPTY_ROOT, KECCAK_EMPTY);
        let account = TrieAccount::decode_roots(&encoded).unwrap();
        assert_eq!(account.storage_root, EMPTY_ROOT);
        assert_eq!(account.code_hash, KECCAK_EMPTY);
    }

    #[test]
    fn rejects_short_records() {
        let mut out = Vec::new();
        Header { list: true, payload_length: 2 }.encode(&mut out);
        0u64.encode(&mut out);
        0u64.encode(&mut out);
        assert!(TrieAccount::decode_roots(&out).is_err());
    }
}
