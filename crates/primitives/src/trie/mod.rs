//! Merkle-Patricia trie node primitives.
//!
//! The sync engine treats the trie as a bag of content-addressed records;
//! this module provides the path arithmetic ([`Nibbles`]) and the decoding of
//! raw node bytes into their three shapes ([`TrieNode`]).

mod nibbles;
mod nodes;

pub use nibbles::Nibbles;
pub use nodes::{BranchNode, ChildRef, ExtensionNode, LeafNode, NodeDecodeError, TrieNode};
