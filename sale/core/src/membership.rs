// Copyright (c) 2024 The Botho Foundation

//! Allow-list membership proofs.
//!
//! Each allow-list is committed to by a single Keccak-256 root. Leaves are
//! the left-padded 32-byte encoding of an [`Address`]; interior nodes hash
//! the *sorted* pair of their children, so a proof is just the list of
//! sibling hashes from the leaf up to the root with no left/right flags.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::address::Address;

/// A 32-byte hash value.
pub type Hash32 = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("allow-list is empty")]
    EmptyList,

    #[error("invalid hash: {0}")]
    InvalidHash(String),
}

/// Hash two nodes in canonical (sorted) order.
pub fn hash_sorted_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Check that `candidate` belongs to the set committed to by `root`.
///
/// Non-membership is reported as `false`; deciding what that means is left
/// to the caller.
pub fn verify(root: &Hash32, candidate: &Address, proof: &[Hash32]) -> bool {
    let computed = proof
        .iter()
        .fold(candidate.to_word(), |node, sibling| {
            hash_sorted_pair(&node, sibling)
        });
    computed == *root
}

/// Parse a `0x`-prefixed (or bare) 64 character hex string.
pub fn parse_hash(s: &str) -> Result<Hash32, MembershipError> {
    let s = s.trim();
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let mut out = [0u8; 32];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| MembershipError::InvalidHash(format!("{}: {}", s, e)))?;
    Ok(out)
}

/// Format a hash as `0x`-prefixed lowercase hex.
pub fn format_hash(hash: &Hash32) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Serde adapter for a single hex-encoded hash.
pub mod hash_hex {
    use super::{format_hash, parse_hash, Hash32};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(hash: &Hash32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_hash(hash))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Hash32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s).map_err(serde::de::Error::custom)
    }
}

/// A membership proof path: sibling hashes from leaf to root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipProof(Vec<Hash32>);

impl MembershipProof {
    pub fn new(nodes: Vec<Hash32>) -> Self {
        Self(nodes)
    }

    pub fn nodes(&self) -> &[Hash32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn verify(&self, root: &Hash32, candidate: &Address) -> bool {
        verify(root, candidate, &self.0)
    }

    /// Parse a proof from a list of hex strings.
    pub fn from_hex<S: AsRef<str>>(nodes: &[S]) -> Result<Self, MembershipError> {
        nodes
            .iter()
            .map(|n| parse_hash(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(format_hash).collect()
    }
}

impl From<Vec<Hash32>> for MembershipProof {
    fn from(nodes: Vec<Hash32>) -> Self {
        Self(nodes)
    }
}

impl Serialize for MembershipProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MembershipProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let nodes = Vec::<String>::deserialize(deserializer)?;
        Self::from_hex(&nodes).map_err(serde::de::Error::custom)
    }
}

/// A full membership tree, used off-ledger to produce roots and proofs.
///
/// Leaves are sorted before the tree is built and an odd node at the end of
/// a layer is promoted unchanged to the next layer. A repeated entry stays a
/// separate leaf.
#[derive(Debug, Clone)]
pub struct MembershipTree {
    layers: Vec<Vec<Hash32>>,
}

impl MembershipTree {
    pub fn new<I>(members: I) -> Result<Self, MembershipError>
    where
        I: IntoIterator<Item = Address>,
    {
        let mut leaves: Vec<Hash32> = members.into_iter().map(|a| a.to_word()).collect();
        leaves.sort_unstable();
        if leaves.is_empty() {
            return Err(MembershipError::EmptyList);
        }

        let mut layers = vec![leaves];
        while layers[layers.len() - 1].len() > 1 {
            let next = layers[layers.len() - 1]
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_sorted_pair(a, b),
                    [a] => *a,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }

        Ok(Self { layers })
    }

    pub fn root(&self) -> Hash32 {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Proof for `member`, or `None` if it is not in the tree.
    pub fn proof(&self, member: &Address) -> Option<MembershipProof> {
        let leaf = member.to_word();
        let mut index = self.layers[0].binary_search(&leaf).ok()?;
        let mut nodes = Vec::with_capacity(self.layers.len());
        for layer in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = layer.get(index ^ 1) {
                nodes.push(*sibling);
            }
            index /= 2;
        }
        Some(MembershipProof(nodes))
    }
}
