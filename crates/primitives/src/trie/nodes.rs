use super::Nibbles;
use crate::H256;
use alloy_rlp::{Buf, BufMut, Encodable, Header, EMPTY_STRING_CODE};
use thiserror::Error;

/// Errors that can occur when decoding raw bytes into a trie node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeDecodeError {
    /// The bytes are not valid RLP.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
    /// A trie node is always an RLP list.
    #[error("node is not an RLP list")]
    NotAList,
    /// Trie nodes carry either 2 items (leaf, extension) or 17 (branch).
    #[error("expected 2 or 17 items, got {0}")]
    ItemCount(usize),
    /// The hex-prefix path of a leaf or extension node is malformed.
    #[error("malformed hex-prefix path")]
    InvalidPath,
    /// A child slot holds something other than a 32-byte hash, an embedded
    /// node or the empty string.
    #[error("invalid child reference")]
    InvalidChild,
    /// Fixed-width keys never terminate inside a branch, so the 17th slot
    /// must be empty.
    #[error("unexpected value in branch node")]
    ValueInBranch,
    /// The input continues past the node list.
    #[error("unexpected trailing bytes")]
    TrailingBytes,
}

/// Reference to a child node: either its content hash, or the child's whole
/// encoding embedded in the parent when it is shorter than a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    /// The child is addressed by the Keccak-256 of its encoding.
    Hash(H256),
    /// The child's raw RLP, inlined. Embedded children need no fetch.
    Inline(Vec<u8>),
}

/// A node with up to 16 children, one per key digit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchNode {
    /// Child references indexed by nibble; `None` marks an empty slot.
    pub children: [Option<ChildRef>; 16],
}

/// A node compressing a run of single-child branches into one path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNode {
    /// The shared key segment.
    pub path: Nibbles,
    /// The single child at the end of the segment.
    pub child: ChildRef,
}

/// A terminal node holding a value at the end of its key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    /// The remainder of the key below the parent.
    pub path: Nibbles,
    /// The stored value; an RLP account record in the account trie.
    pub value: Vec<u8>,
}

/// The three shapes a decoded trie node can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieNode {
    /// Multi-child interior node.
    Branch(BranchNode),
    /// Single-child interior node with path compression.
    Extension(ExtensionNode),
    /// Terminal value node.
    Leaf(LeafNode),
}

/// One RLP item of a node list: its header kind, payload, and the raw bytes
/// spanning header plus payload.
struct RawItem<'a> {
    list: bool,
    payload: &'a [u8],
    raw: &'a [u8],
}

fn split_items(mut payload: &[u8]) -> Result<Vec<RawItem<'_>>, NodeDecodeError> {
    let mut items = Vec::with_capacity(17);
    while !payload.is_empty() {
        let start = payload;
        let header = Header::decode(&mut payload)?;
        if payload.len() < header.payload_length {
            return Err(alloy_rlp::Error::InputTooShort.into())
        }
        let data = &payload[..header.payload_length];
        payload.advance(header.payload_length);
        let raw_len = start.len() - payload.len();
        items.push(RawItem { list: header.list, payload: data, raw: &start[..raw_len] });
    }
    Ok(items)
}

fn decode_child(item: &RawItem<'_>) -> Result<Option<ChildRef>, NodeDecodeError> {
    if item.list {
        return Ok(Some(ChildRef::Inline(item.raw.to_vec())))
    }
    match item.payload.len() {
        0 => Ok(None),
        32 => Ok(Some(ChildRef::Hash(H256::from_slice(item.payload)))),
        _ => Err(NodeDecodeError::InvalidChild),
    }
}

impl TrieNode {
    /// Decodes raw node bytes into their shape.
    ///
    /// The caller is expected to have verified that the bytes hash to the
    /// node's content address; this only checks structure.
    pub fn decode(mut buf: &[u8]) -> Result<Self, NodeDecodeError> {
        let header = Header::decode(&mut buf)?;
        if !header.list {
            return Err(NodeDecodeError::NotAList)
        }
        if buf.len() < header.payload_length {
            return Err(alloy_rlp::Error::InputTooShort.into())
        }
        if buf.len() > header.payload_length {
            return Err(NodeDecodeError::TrailingBytes)
        }

        let items = split_items(buf)?;
        match items.len() {
            17 => {
                let value = &items[16];
                if value.list || !value.payload.is_empty() {
                    return Err(NodeDecodeError::ValueInBranch)
                }
                let mut children: [Option<ChildRef>; 16] = Default::default();
                for (slot, item) in children.iter_mut().zip(&items[..16]) {
                    *slot = decode_child(item)?;
                }
                Ok(Self::Branch(BranchNode { children }))
            }
            2 => {
                let path_item = &items[0];
                if path_item.list {
                    return Err(NodeDecodeError::InvalidPath)
                }
                let (path, is_leaf) = Nibbles::decode_path(path_item.payload)
                    .ok_or(NodeDecodeError::InvalidPath)?;
                if is_leaf {
                    if items[1].list {
                        return Err(NodeDecodeError::InvalidChild)
                    }
                    Ok(Self::Leaf(LeafNode { path, value: items[1].payload.to_vec() }))
                } else {
                    let child =
                        decode_child(&items[1])?.ok_or(NodeDecodeError::InvalidChild)?;
                    Ok(Self::Extension(ExtensionNode { path, child }))
                }
            }
            count => Err(NodeDecodeError::ItemCount(count)),
        }
    }

    /// RLP encodes the node.
    pub fn rlp(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        self.encode(&mut out);
        out
    }
}

fn child_length(child: Option<&ChildRef>) -> usize {
    match child {
        None => 1,
        Some(ChildRef::Hash(_)) => 33,
        Some(ChildRef::Inline(raw)) => raw.len(),
    }
}

fn encode_child(child: Option<&ChildRef>, out: &mut dyn BufMut) {
    match child {
        None => out.put_u8(EMPTY_STRING_CODE),
        Some(ChildRef::Hash(hash)) => hash.as_bytes().encode(out),
        Some(ChildRef::Inline(raw)) => out.put_slice(raw),
    }
}

impl Encodable for BranchNode {
    fn encode(&self, out: &mut dyn BufMut) {
        let payload_length =
            self.children.iter().map(|child| child_length(child.as_ref())).sum::<usize>() + 1;
        Header { list: true, payload_length }.encode(out);
        for child in &self.children {
            encode_child(child.as_ref(), out);
        }
        out.put_u8(EMPTY_STRING_CODE);
    }

    fn length(&self) -> usize {
        let payload_length =
            self.children.iter().map(|child| child_length(child.as_ref())).sum::<usize>() + 1;
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Encodable for ExtensionNode {
    fn encode(&self, out: &mut dyn BufMut) {
        let path = self.path.encode_path(false);
        let payload_length = path.as_slice().length() + child_length(Some(&self.child));
        Header { list: true, payload_length }.encode(out);
        path.as_slice().encode(out);
        encode_child(Some(&self.child), out);
    }

    fn length(&self) -> usize {
        let path = self.path.encode_path(false);
        let payload_length = path.as_slice().length() + child_length(Some(&self.child));
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Encodable for LeafNode {
    fn encode(&self, out: &mut dyn BufMut) {
        let path = self.path.encode_path(true);
        let payload_length = path.as_slice().length() + self.value.as_slice().length();
        Header { list: true, payload_length }.encode(out);
        path.as_slice().encode(out);
        self.value.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        let path = self.path.encode_path(true);
        let payload_length = path.as_slice().length() + self.value.as_slice().length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Encodable for TrieNode {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Branch(node) => node.encode(out),
            Self::Extension(node) => node.encode(out),
            Self::Leaf(node) => node.encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Branch(node) => node.length(),
            Self::Extension(node) => node.length(),
            Self::Leaf(node) => node.length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keccak256;
    use assert_matches::assert_matches;

    fn leaf(path: &[u8], value: &[u8]) -> LeafNode {
        LeafNode { path: Nibbles::from_nibbles(path), value: value.to_vec() }
    }

    #[test]
    fn leaf_round_trip() {
        let node = leaf(&[1, 2, 3], b"some value");
        let encoded = TrieNode::Leaf(node.clone()).rlp();
        assert_eq!(encoded.len(), TrieNode::Leaf(node.clone()).length());
        assert_eq!(TrieNode::decode(&encoded).unwrap(), TrieNode::Leaf(node));
    }

    #[test]
    fn branch_round_trip() {
        let mut children: [Option<ChildRef>; 16] = Default::default();
        children[0] = Some(ChildRef::Hash(keccak256(b"left")));
        children[7] = Some(ChildRef::Hash(keccak256(b"right")));
        let node = BranchNode { children };
        let encoded = TrieNode::Branch(node.clone()).rlp();
        assert_eq!(TrieNode::decode(&encoded).unwrap(), TrieNode::Branch(node));
    }

    #[test]
    fn extension_round_trip() {
        let node = ExtensionNode {
            path: Nibbles::from_nibbles(&[0xa, 0xb]),
            child: ChildRef::Hash(keccak256(b"child")),
        };
        let encoded = TrieNode::Extension(node.clone()).rlp();
        assert_eq!(TrieNode::decode(&encoded).unwrap(), TrieNode::Extension(node));
    }

    #[test]
    fn embedded_child_decodes_inline() {
        // A tiny leaf encodes to fewer than 32 bytes and gets embedded in its
        // parent rather than referenced by hash.
        let small = TrieNode::Leaf(leaf(&[1], &[0x2a])).rlp();
        assert!(small.len() < 32);

        let node = ExtensionNode {
            path: Nibbles::from_nibbles(&[3]),
            child: ChildRef::Inline(small.clone()),
        };
        let encoded = TrieNode::Extension(node.clone()).rlp();
        assert_matches!(
            TrieNode::decode(&encoded).unwrap(),
            TrieNode::Extension(ExtensionNode { child: ChildRef::Inline(raw), .. }) if raw == small
        );
    }

    #[test]
    fn rejects_malformed_nodes() {
        // Not a list.
        assert_matches!(TrieNode::decode(&[0x80]), Err(NodeDecodeError::NotAList));
        // A list of three strings.
        let mut bad = Vec::new();
        Header { list: true, payload_length: 3 }.encode(&mut bad);
        bad.extend([0x01, 0x02, 0x03]);
        assert_matches!(TrieNode::decode(&bad), Err(NodeDecodeError::ItemCount(3)));
        // Trailing garbage after a valid node.
        let mut encoded = TrieNode::Leaf(leaf(&[1], b"v")).rlp();
        encoded.push(0x00);
        assert_matches!(TrieNode::decode(&encoded), Err(NodeDecodeError::TrailingBytes));
    }

    #[test]
    fn rejects_value_in_branch() {
        let mut out = Vec::new();
        // 16 empty children plus a one-byte value in the 17th slot.
        Header { list: true, payload_length: 17 }.encode(&mut out);
        for _ in 0..16 {
            out.push(EMPTY_STRING_CODE);
        }
        out.push(0x01);
        assert_matches!(TrieNode::decode(&out), Err(NodeDecodeError::ValueInBranch));
    }
}
