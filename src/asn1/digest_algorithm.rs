//! Digest algorithms admissible in an LDS Security Object.
//!
//! ICAO 9303-10 4.6.2 allows the SHA-2 and SHA-3 families (SHA-1 excluded);
//! the OID table below mirrors the NIST hash algorithm arc
//! `2.16.840.1.101.3.4.2`.

use {
    crate::error::{Error, Result},
    der::asn1::ObjectIdentifier as Oid,
    sha2::Digest,
    sha3::digest::{ExtendableOutput, Update, XofReader},
};

pub const ID_SHA256: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.1");
pub const ID_SHA384: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.2");
pub const ID_SHA512: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.3");
pub const ID_SHA512_224: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.5");
pub const ID_SHA512_256: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.6");
pub const ID_SHA3_224: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.7");
pub const ID_SHA3_256: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.8");
pub const ID_SHA3_384: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.9");
pub const ID_SHA3_512: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.10");
pub const ID_SHAKE128: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.11");
pub const ID_SHAKE256: Oid = Oid::new_unwrap("2.16.840.1.101.3.4.2.12");

/// Fixed prefix of the signed-attributes encoding before the LDS digest.
///
/// The outer SET header (2 bytes), the complete content-type attribute
/// (23 bytes) and the message-digest attribute header (17 bytes) are all
/// structurally constant across digest algorithms; only the digest value
/// after this prefix varies in length.
pub const LDS_DIGEST_OFFSET_IN_SIGNED_ATTRS: usize = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Shake128,
    Shake256,
}

impl DigestAlgorithm {
    pub const ALL: [Self; 11] = [
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha512_224,
        Self::Sha512_256,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Shake128,
        Self::Shake256,
    ];

    pub fn from_oid(oid: Oid) -> Result<Self> {
        Ok(match oid {
            ID_SHA256 => Self::Sha256,
            ID_SHA384 => Self::Sha384,
            ID_SHA512 => Self::Sha512,
            ID_SHA512_224 => Self::Sha512_224,
            ID_SHA512_256 => Self::Sha512_256,
            ID_SHA3_224 => Self::Sha3_224,
            ID_SHA3_256 => Self::Sha3_256,
            ID_SHA3_384 => Self::Sha3_384,
            ID_SHA3_512 => Self::Sha3_512,
            ID_SHAKE128 => Self::Shake128,
            ID_SHAKE256 => Self::Shake256,
            _ => return Err(Error::UnsupportedDigestAlgorithm(oid)),
        })
    }

    pub const fn oid(self) -> Oid {
        match self {
            Self::Sha256 => ID_SHA256,
            Self::Sha384 => ID_SHA384,
            Self::Sha512 => ID_SHA512,
            Self::Sha512_224 => ID_SHA512_224,
            Self::Sha512_256 => ID_SHA512_256,
            Self::Sha3_224 => ID_SHA3_224,
            Self::Sha3_256 => ID_SHA3_256,
            Self::Sha3_384 => ID_SHA3_384,
            Self::Sha3_512 => ID_SHA3_512,
            Self::Shake128 => ID_SHAKE128,
            Self::Shake256 => ID_SHAKE256,
        }
    }

    /// Digest output size in bytes. SHAKE outputs are fixed at the lengths
    /// the LDS uses them with.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Sha3_256 | Self::Sha512_256 | Self::Shake256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
            Self::Sha512_224 | Self::Sha3_224 | Self::Shake128 => 28,
        }
    }

    /// Structural length of the hash algorithm identifier inside the LDS
    /// Security Object encoding. Constant 19 except for the three OIDs whose
    /// last arc needs two decimal digits.
    pub const fn oid_len(self) -> usize {
        match self {
            Self::Sha3_512 | Self::Shake128 | Self::Shake256 => 20,
            _ => 19,
        }
    }

    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha384 => sha2::Sha384::digest(data).to_vec(),
            Self::Sha512 => sha2::Sha512::digest(data).to_vec(),
            Self::Sha512_224 => sha2::Sha512_224::digest(data).to_vec(),
            Self::Sha512_256 => sha2::Sha512_256::digest(data).to_vec(),
            Self::Sha3_224 => sha3::Sha3_224::digest(data).to_vec(),
            Self::Sha3_256 => sha3::Sha3_256::digest(data).to_vec(),
            Self::Sha3_384 => sha3::Sha3_384::digest(data).to_vec(),
            Self::Sha3_512 => sha3::Sha3_512::digest(data).to_vec(),
            Self::Shake128 => Self::shake::<sha3::Shake128>(data, self.digest_len()),
            Self::Shake256 => Self::shake::<sha3::Shake256>(data, self.digest_len()),
        }
    }

    fn shake<X: ExtendableOutput + Default>(data: &[u8], len: usize) -> Vec<u8> {
        let mut hasher = X::default();
        hasher.update(data);
        let mut out = vec![0; len];
        hasher.finalize_xof().read(&mut out);
        out
    }
}

/// Offset of the DG1 digest inside the LDS Security Object encoding.
///
/// All tag/length framing around the hash algorithm identifier is fixed-size
/// for the supported algorithms, so the offset depends only on the
/// identifier's own length.
pub const fn dg1_offset_in_lds(algo: DigestAlgorithm) -> usize {
    10 + algo.oid_len()
}
