//! Fixed-height Merkle registry over the public keys of a trust list.
//!
//! The registry commits to public keys only: two certificates carrying the
//! same key occupy the same conceptual slot regardless of their metadata.
//! Keys are canonicalized into 116-bit limbs, low limb first, so the leaf
//! preimage is independent of incidental encoding details such as leading
//! zero octets. Unused slots hold the all-zero leaf.

use {
    crate::{
        cert::SubjectPublicKey,
        error::{Error, Result},
        trust_list::TrustList,
    },
    sha2::{Digest, Sha256},
    subtle::ConstantTimeEq,
};

/// Default tree height, giving 2048 slots. The full ICAO PKD holds on the
/// order of a thousand CSCA certificates.
pub const DEFAULT_MERKLE_HEIGHT: u32 = 11;

const LEAF_DOMAIN: &[u8] = b"emrtd-trust:leaf:v1";
const NODE_DOMAIN: &[u8] = b"emrtd-trust:node:v1";

/// Hash of an unoccupied slot.
pub const EMPTY_LEAF: [u8; 32] = [0; 32];

/// Merkle tree over trust-list public keys, all levels retained for witness
/// extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustRegistry {
    height: u32,
    keys: Vec<SubjectPublicKey>,
    /// `levels[0]` is the leaf layer, `levels[height]` the single root.
    levels: Vec<Vec<[u8; 32]>>,
}

/// Sibling path proving one leaf against the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub index: u64,
    /// Bottom-up, one sibling per level.
    pub siblings: Vec<[u8; 32]>,
}

impl TrustRegistry {
    /// Build a registry over the trust list's keys, in list order.
    pub fn build(trust_list: &TrustList, height: u32) -> Result<Self> {
        let capacity = 1usize
            .checked_shl(height)
            .filter(|&capacity| trust_list.len() <= capacity)
            .ok_or(Error::CapacityExceeded {
                size: trust_list.len(),
                height,
            })?;

        let keys: Vec<SubjectPublicKey> = trust_list
            .iter()
            .map(|certificate| certificate.public_key.clone())
            .collect();

        let mut leaves = vec![EMPTY_LEAF; capacity];
        for (slot, key) in leaves.iter_mut().zip(&keys) {
            *slot = leaf_hash(key);
        }

        let mut levels = Vec::with_capacity(height as usize + 1);
        levels.push(leaves);
        for _ in 0..height {
            let below = levels.last().map_or(&[] as &[_], Vec::as_slice);
            let above = below
                .chunks_exact(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
            levels.push(above);
        }

        Ok(Self {
            height,
            keys,
            levels,
        })
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn root(&self) -> [u8; 32] {
        self.levels[self.height as usize][0]
    }

    /// Slot of the first occurrence of a key.
    pub fn index_of(&self, key: &SubjectPublicKey) -> Option<usize> {
        self.keys.iter().position(|candidate| candidate == key)
    }

    /// Witness for the first slot holding `key`.
    pub fn witness_for(&self, key: &SubjectPublicKey) -> Option<Witness> {
        self.witness_at(self.index_of(key)?)
    }

    /// Witness for a slot, occupied or not.
    pub fn witness_at(&self, index: usize) -> Option<Witness> {
        if index >= self.levels[0].len() {
            return None;
        }
        let siblings = (0..self.height as usize)
            .map(|level| self.levels[level][(index >> level) ^ 1])
            .collect();
        Some(Witness {
            index: index as u64,
            siblings,
        })
    }
}

impl Witness {
    /// Fold the sibling path over a leaf, yielding the implied root.
    pub fn recompute_root(&self, leaf: [u8; 32]) -> [u8; 32] {
        let mut node = leaf;
        for (level, sibling) in self.siblings.iter().enumerate() {
            node = if (self.index >> level) & 1 == 0 {
                node_hash(&node, sibling)
            } else {
                node_hash(sibling, &node)
            };
        }
        node
    }

    pub fn verify(&self, root: [u8; 32], leaf: [u8; 32]) -> bool {
        self.recompute_root(leaf)[..].ct_eq(&root[..]).into()
    }
}

/// Domain-separated leaf digest of a canonicalized public key.
///
/// RSA keys hash the exponent limbs then the modulus limbs; EC keys hash the
/// x then y coordinate limbs. The key family is bound by a discriminant
/// octet.
pub fn leaf_hash(key: &SubjectPublicKey) -> [u8; 32] {
    let mut hasher = Sha256::new_with_prefix(LEAF_DOMAIN);
    match key {
        SubjectPublicKey::Rsa {
            modulus,
            public_exponent,
        } => {
            hasher.update([0x01]);
            update_limbs(&mut hasher, public_exponent);
            update_limbs(&mut hasher, modulus);
        }
        SubjectPublicKey::Ec { x, y, .. } => {
            hasher.update([0x02]);
            update_limbs(&mut hasher, x);
            update_limbs(&mut hasher, y);
        }
    }
    hasher.finalize().into()
}

fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new_with_prefix(NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Feed a big-endian unsigned integer into the hasher as 116-bit limbs, low
/// limb first, each limb a 16-byte big-endian block. Leading zero octets of
/// the input do not affect the limbs.
fn update_limbs(hasher: &mut Sha256, big_endian: &[u8]) {
    let stripped = match big_endian.iter().position(|&byte| byte != 0) {
        Some(first) => &big_endian[first..],
        None => &[],
    };
    let mut value = stripped.to_vec();
    if value.is_empty() {
        hasher.update([0u8; 16]);
        return;
    }
    while !value.is_empty() {
        let mut limb = [0u8; 16];
        let take = value.len().min(14);
        limb[16 - take..].copy_from_slice(&value[value.len() - take..]);
        value.truncate(value.len() - take);
        if !value.is_empty() {
            // Bits 112..116 of the limb come from the next byte up; the
            // remainder shifts right by those four bits.
            limb[1] = value[value.len() - 1] & 0x0f;
            let mut carry = 0u8;
            for byte in &mut value {
                let shifted = (carry << 4) | (*byte >> 4);
                carry = *byte & 0x0f;
                *byte = shifted;
            }
            if value.first() == Some(&0) {
                value.remove(0);
            }
        }
        hasher.update(limb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mirrors the packing in update_limbs, observable here as plain limbs.
    fn limbs_of(big_endian: &[u8]) -> Vec<[u8; 16]> {
        let mut value = big_endian.to_vec();
        while value.first() == Some(&0) {
            value.remove(0);
        }
        if value.is_empty() {
            return vec![[0u8; 16]];
        }
        let mut limbs = Vec::new();
        while !value.is_empty() {
            let mut limb = [0u8; 16];
            let take = value.len().min(14);
            limb[16 - take..].copy_from_slice(&value[value.len() - take..]);
            value.truncate(value.len() - take);
            if !value.is_empty() {
                limb[1] = value[value.len() - 1] & 0x0f;
                let mut carry = 0u8;
                for byte in &mut value {
                    let shifted = (carry << 4) | (*byte >> 4);
                    carry = *byte & 0x0f;
                    *byte = shifted;
                }
                if value.first() == Some(&0) {
                    value.remove(0);
                }
            }
            limbs.push(limb);
        }
        limbs
    }

    #[test]
    fn small_values_fit_one_limb() {
        let limbs = limbs_of(&[0x01, 0x00, 0x01]);
        assert_eq!(limbs.len(), 1);
        let mut expected = [0u8; 16];
        expected[13..].copy_from_slice(&[0x01, 0x00, 0x01]);
        assert_eq!(limbs[0], expected);
    }

    #[test]
    fn leading_zeros_do_not_change_limbs() {
        assert_eq!(limbs_of(&[0x00, 0x00, 0x42]), limbs_of(&[0x42]));
    }

    #[test]
    fn fifteen_bytes_split_across_two_limbs() {
        // 15 bytes is 120 bits: 116 go into the low limb, 4 into the high.
        let input: Vec<u8> = (1..=15).collect();
        let limbs = limbs_of(&input);
        assert_eq!(limbs.len(), 2);
        // Low limb: bytes 2..=15 of the input in positions 2..16, plus the
        // low nibble of byte 1 at position 1.
        let mut low = [0u8; 16];
        low[2..].copy_from_slice(&input[1..]);
        low[1] = input[0] & 0x0f;
        assert_eq!(limbs[0], low);
        // High limb: the top 4 bits of byte 1.
        let mut high = [0u8; 16];
        high[15] = input[0] >> 4;
        assert_eq!(limbs[1], high);
    }

    #[test]
    fn leaf_hash_distinguishes_key_families_and_values() {
        let rsa = SubjectPublicKey::Rsa {
            modulus: vec![0xab; 256],
            public_exponent: vec![0x01, 0x00, 0x01],
        };
        let ec = SubjectPublicKey::Ec {
            curve: crate::cert::EcCurve::P256,
            x: vec![0x11; 32],
            y: vec![0x22; 32],
        };
        assert_ne!(leaf_hash(&rsa), leaf_hash(&ec));
        assert_ne!(leaf_hash(&rsa), EMPTY_LEAF);

        let mut other = rsa.clone();
        if let SubjectPublicKey::Rsa { modulus, .. } = &mut other {
            modulus[0] ^= 1;
        }
        assert_ne!(leaf_hash(&rsa), leaf_hash(&other));
    }

    #[test]
    fn leaf_hash_ignores_leading_zero_octets() {
        let padded = SubjectPublicKey::Ec {
            curve: crate::cert::EcCurve::P256,
            x: [vec![0x00; 2], vec![0x11; 30]].concat(),
            y: vec![0x22; 32],
        };
        let stripped = SubjectPublicKey::Ec {
            curve: crate::cert::EcCurve::P256,
            x: vec![0x11; 30],
            y: vec![0x22; 32],
        };
        assert_eq!(leaf_hash(&padded), leaf_hash(&stripped));
    }

    #[test]
    fn witness_paths_round_trip() {
        let keys: Vec<SubjectPublicKey> = (0u8..5)
            .map(|i| SubjectPublicKey::Ec {
                curve: crate::cert::EcCurve::P256,
                x: vec![i + 1; 32],
                y: vec![i + 7; 32],
            })
            .collect();
        let registry = {
            let mut leaves = vec![EMPTY_LEAF; 8];
            for (slot, key) in leaves.iter_mut().zip(&keys) {
                *slot = leaf_hash(key);
            }
            let mut levels = vec![leaves];
            for _ in 0..3 {
                let below = levels.last().unwrap();
                let above: Vec<[u8; 32]> = below
                    .chunks_exact(2)
                    .map(|pair| node_hash(&pair[0], &pair[1]))
                    .collect();
                levels.push(above);
            }
            TrustRegistry {
                height: 3,
                keys: keys.clone(),
                levels,
            }
        };

        let root = registry.root();
        for (index, key) in keys.iter().enumerate() {
            let witness = registry.witness_for(key).unwrap();
            assert_eq!(witness.index, index as u64);
            assert!(witness.verify(root, leaf_hash(key)));
            assert!(!witness.verify(root, EMPTY_LEAF));
        }
        // Unoccupied slots prove emptiness.
        let witness = registry.witness_at(6).unwrap();
        assert!(witness.verify(root, EMPTY_LEAF));
        assert!(registry.witness_at(8).is_none());
    }

    #[test]
    fn sibling_order_follows_index_bits() {
        let leaf = [7u8; 32];
        let sibling = [9u8; 32];
        let left = Witness {
            index: 0,
            siblings: vec![sibling],
        };
        let right = Witness {
            index: 1,
            siblings: vec![sibling],
        };
        assert_eq!(left.recompute_root(leaf), node_hash(&leaf, &sibling));
        assert_eq!(right.recompute_root(leaf), node_hash(&sibling, &leaf));
    }
}
