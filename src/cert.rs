//! X.509 certificate data model for trust-list and document-signer
//! certificates.
//!
//! Decoding goes as deep as the chain validator and the trust registry need:
//! distinguished names, the validity window, the key identifier extensions
//! and a fully parsed subject public key. The raw TBS and certificate
//! encodings are kept alongside so signatures can be verified and the
//! certificate re-serialized byte-exactly.

use {
    crate::error::{Error, Result},
    const_oid::{
        db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1},
        AssociatedOid, ObjectIdentifier as Oid,
    },
    der::{asn1::UintRef, Decode, Encode, Sequence},
    sha1::{Digest, Sha1},
    std::{fmt, time::SystemTime},
    tracing::warn,
    x509_cert::{
        ext::pkix::{AuthorityKeyIdentifier, SubjectKeyIdentifier},
        name::Name,
        spki::SubjectPublicKeyInfoOwned,
        Certificate as X509Certificate,
    },
};

pub const ID_SECP_256_K_1: Oid = Oid::new_unwrap("1.3.132.0.10");

/// A decoded certificate. Immutable once decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    pub issuer: Name,
    pub subject: Name,
    pub serial_number: Vec<u8>,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
    /// Outer signatureAlgorithm OID.
    pub signature_algorithm: Oid,
    pub public_key: SubjectPublicKey,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    tbs_bytes: Vec<u8>,
    signature_bytes: Vec<u8>,
    der_bytes: Vec<u8>,
}

/// Subject public key, exhaustive over the key families the chain validator
/// and registry support.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubjectPublicKey {
    Rsa {
        /// Big-endian, leading zeros stripped.
        modulus: Vec<u8>,
        public_exponent: Vec<u8>,
    },
    Ec {
        curve: EcCurve,
        /// Fixed-width big-endian affine coordinates.
        x: Vec<u8>,
        y: Vec<u8>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
    Secp256k1,
}

impl EcCurve {
    pub fn from_oid(oid: Oid) -> Result<Self> {
        Ok(match oid {
            SECP_256_R_1 => Self::P256,
            SECP_384_R_1 => Self::P384,
            SECP_521_R_1 => Self::P521,
            ID_SECP_256_K_1 => Self::Secp256k1,
            _ => return Err(Error::UnsupportedPublicKey(oid)),
        })
    }

    pub const fn oid(self) -> Oid {
        match self {
            Self::P256 => SECP_256_R_1,
            Self::P384 => SECP_384_R_1,
            Self::P521 => SECP_521_R_1,
            Self::Secp256k1 => ID_SECP_256_K_1,
        }
    }

    /// Affine coordinate width in bytes.
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P256 | Self::Secp256k1 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

/// RFC 8017 A.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct RsaPublicKeyValue<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

impl SubjectPublicKey {
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let key_bytes = spki
            .subject_public_key
            .as_bytes()
            .ok_or(Error::SchemaMismatch("subjectPublicKey BIT STRING"))?;
        match spki.algorithm.oid {
            RSA_ENCRYPTION => {
                let key = RsaPublicKeyValue::from_der(key_bytes)
                    .map_err(|_| Error::SchemaMismatch("RSAPublicKey"))?;
                Ok(Self::Rsa {
                    modulus: key.modulus.as_bytes().to_vec(),
                    public_exponent: key.public_exponent.as_bytes().to_vec(),
                })
            }
            ID_EC_PUBLIC_KEY => {
                let params = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or(Error::SchemaMismatch("ECParameters"))?;
                let curve_oid = params
                    .decode_as::<Oid>()
                    .map_err(|_| Error::UnsupportedPublicKey(ID_EC_PUBLIC_KEY))?;
                let curve = EcCurve::from_oid(curve_oid)?;
                let len = curve.coordinate_len();
                // Uncompressed SEC1 point only.
                if key_bytes.len() != 1 + 2 * len || key_bytes[0] != 0x04 {
                    return Err(Error::SchemaMismatch("uncompressed EC point"));
                }
                Ok(Self::Ec {
                    curve,
                    x: key_bytes[1..=len].to_vec(),
                    y: key_bytes[1 + len..].to_vec(),
                })
            }
            oid => Err(Error::UnsupportedPublicKey(oid)),
        }
    }

    /// SEC1 uncompressed point encoding. Empty for RSA keys.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        match self {
            Self::Rsa { .. } => Vec::new(),
            Self::Ec { x, y, .. } => {
                let mut out = Vec::with_capacity(1 + x.len() + y.len());
                out.push(0x04);
                out.extend_from_slice(x);
                out.extend_from_slice(y);
                out
            }
        }
    }
}

/// 160-bit content fingerprint of a certificate's TBS bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 20]);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl Certificate {
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let cert = X509Certificate::from_der(bytes)?;
        let tbs = &cert.tbs_certificate;
        let tbs_bytes = tbs.to_der()?;

        let not_before = tbs.validity.not_before.to_system_time();
        let not_after = tbs.validity.not_after.to_system_time();
        if not_before >= not_after {
            return Err(Error::SchemaMismatch("certificate validity window"));
        }

        let mut subject_key_id = None;
        let mut authority_key_id = None;
        for ext in tbs.extensions.iter().flatten() {
            if ext.extn_id == SubjectKeyIdentifier::OID {
                match SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes()) {
                    Ok(ski) => subject_key_id = Some(ski.0.as_bytes().to_vec()),
                    Err(err) => warn!(%err, "ignoring malformed subject key identifier"),
                }
            } else if ext.extn_id == AuthorityKeyIdentifier::OID {
                match AuthorityKeyIdentifier::from_der(ext.extn_value.as_bytes()) {
                    Ok(aki) => {
                        authority_key_id = aki.key_identifier.map(|id| id.as_bytes().to_vec());
                    }
                    Err(err) => warn!(%err, "ignoring malformed authority key identifier"),
                }
            }
        }

        Ok(Self {
            issuer: tbs.issuer.clone(),
            subject: tbs.subject.clone(),
            serial_number: tbs.serial_number.as_bytes().to_vec(),
            not_before,
            not_after,
            signature_algorithm: cert.signature_algorithm.oid,
            public_key: SubjectPublicKey::from_spki(&tbs.subject_public_key_info)?,
            subject_key_id,
            authority_key_id,
            tbs_bytes,
            signature_bytes: cert
                .signature
                .as_bytes()
                .ok_or(Error::SchemaMismatch("signature BIT STRING"))?
                .to_vec(),
            der_bytes: bytes.to_vec(),
        })
    }

    /// Raw TBSCertificate encoding, the message the issuer signed.
    pub fn tbs_bytes(&self) -> &[u8] {
        &self.tbs_bytes
    }

    /// Raw signatureValue bytes.
    pub fn signature_bytes(&self) -> &[u8] {
        &self.signature_bytes
    }

    /// Complete DER encoding as decoded.
    pub fn as_der(&self) -> &[u8] {
        &self.der_bytes
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(Sha1::digest(&self.tbs_bytes).into())
    }

    /// Whether subject and issuer coincide, i.e. a self-signed root.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}
