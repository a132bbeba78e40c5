//! Signature verification over pre-hashed messages.
//!
//! The chain validator always hashes the message itself with the digest
//! algorithm named by the signature algorithm, then hands the digest here.
//! RSA verification is PKCS#1 v1.5 over the DigestInfo for that digest;
//! ECDSA verification takes the digest directly as the prehash.

use {
    crate::{
        asn1::DigestAlgorithm,
        cert::{EcCurve, SubjectPublicKey},
        error::{Error, Result},
    },
    const_oid::{
        db::rfc5912::{
            ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512, ID_EC_PUBLIC_KEY,
            RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
            SHA_512_WITH_RSA_ENCRYPTION,
        },
        ObjectIdentifier as Oid,
    },
    ecdsa::signature::hazmat::PrehashVerifier,
    rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey},
};

/// A signature algorithm paired with the digest it is computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    RsaPkcs1v15(DigestAlgorithm),
    Ecdsa(DigestAlgorithm),
}

impl SignatureAlgorithm {
    /// Resolve a fully qualified signature algorithm OID, as found in a
    /// certificate's signatureAlgorithm field.
    pub fn from_oid(oid: Oid) -> Result<Self> {
        Ok(match oid {
            SHA_256_WITH_RSA_ENCRYPTION => Self::RsaPkcs1v15(DigestAlgorithm::Sha256),
            SHA_384_WITH_RSA_ENCRYPTION => Self::RsaPkcs1v15(DigestAlgorithm::Sha384),
            SHA_512_WITH_RSA_ENCRYPTION => Self::RsaPkcs1v15(DigestAlgorithm::Sha512),
            ECDSA_WITH_SHA_256 => Self::Ecdsa(DigestAlgorithm::Sha256),
            ECDSA_WITH_SHA_384 => Self::Ecdsa(DigestAlgorithm::Sha384),
            ECDSA_WITH_SHA_512 => Self::Ecdsa(DigestAlgorithm::Sha512),
            _ => return Err(Error::UnsupportedSignatureAlgorithm(oid)),
        })
    }

    /// Resolve a SignerInfo signature algorithm. CMS signers commonly name
    /// the bare key algorithm here and carry the digest separately, so the
    /// digest from the SignerInfo is used for those.
    pub fn from_signer(oid: Oid, digest: DigestAlgorithm) -> Result<Self> {
        match oid {
            RSA_ENCRYPTION => match digest {
                DigestAlgorithm::Sha256 | DigestAlgorithm::Sha384 | DigestAlgorithm::Sha512 => {
                    Ok(Self::RsaPkcs1v15(digest))
                }
                _ => Err(Error::UnsupportedSignatureAlgorithm(oid)),
            },
            ID_EC_PUBLIC_KEY => Ok(Self::Ecdsa(digest)),
            _ => Self::from_oid(oid),
        }
    }

    pub const fn digest_algorithm(self) -> DigestAlgorithm {
        match self {
            Self::RsaPkcs1v15(digest) | Self::Ecdsa(digest) => digest,
        }
    }
}

/// Verify `signature` over `message` with `key`.
///
/// Any mismatch between key family and algorithm, undecodable key or
/// signature material, or verification failure proper collapses to
/// [`Error::SignatureInvalid`]; callers scanning candidate issuers treat all
/// of these the same way.
pub fn verify(
    key: &SubjectPublicKey,
    algorithm: SignatureAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let digest = algorithm.digest_algorithm().hash(message);
    match (key, algorithm) {
        (
            SubjectPublicKey::Rsa {
                modulus,
                public_exponent,
            },
            SignatureAlgorithm::RsaPkcs1v15(digest_algorithm),
        ) => {
            let key = RsaPublicKey::new_with_max_size(
                BigUint::from_bytes_be(modulus),
                BigUint::from_bytes_be(public_exponent),
                8192,
            )
            .map_err(|_| Error::SignatureInvalid)?;
            let padding = match digest_algorithm {
                DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
                DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
                DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
                _ => return Err(Error::SignatureInvalid),
            };
            key.verify(padding, &digest, signature)
                .map_err(|_| Error::SignatureInvalid)
        }
        (SubjectPublicKey::Ec { curve, .. }, SignatureAlgorithm::Ecdsa(_)) => {
            let sec1 = key.to_sec1_bytes();
            macro_rules! verify_on {
                ($module:ident) => {{
                    let key = $module::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                        .map_err(|_| Error::SignatureInvalid)?;
                    let signature = $module::ecdsa::Signature::from_der(signature)
                        .map_err(|_| Error::SignatureInvalid)?;
                    key.verify_prehash(&digest, &signature)
                        .map_err(|_| Error::SignatureInvalid)
                }};
            }
            match curve {
                EcCurve::P256 => verify_on!(p256),
                EcCurve::P384 => verify_on!(p384),
                EcCurve::P521 => verify_on!(p521),
                EcCurve::Secp256k1 => verify_on!(k256),
            }
        }
        _ => Err(Error::SignatureInvalid),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        ecdsa::signature::hazmat::PrehashSigner,
        rsa::{traits::PublicKeyParts, RsaPrivateKey},
        sha2::{Digest, Sha256},
    };

    #[test]
    fn signer_oid_resolution() {
        assert_eq!(
            SignatureAlgorithm::from_signer(RSA_ENCRYPTION, DigestAlgorithm::Sha256).unwrap(),
            SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha256)
        );
        assert_eq!(
            SignatureAlgorithm::from_signer(ID_EC_PUBLIC_KEY, DigestAlgorithm::Sha384).unwrap(),
            SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha384)
        );
        assert_eq!(
            SignatureAlgorithm::from_signer(ECDSA_WITH_SHA_256, DigestAlgorithm::Sha256).unwrap(),
            SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256)
        );
        assert!(SignatureAlgorithm::from_oid(RSA_ENCRYPTION).is_err());
    }

    #[test]
    fn rsa_sign_verify_round_trip() {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let message = b"machine readable zone";
        let digest = Sha256::digest(message);
        let signature = private
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .unwrap();

        let key = SubjectPublicKey::Rsa {
            modulus: private.n().to_bytes_be(),
            public_exponent: private.e().to_bytes_be(),
        };
        let algorithm = SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha256);
        verify(&key, algorithm, message, &signature).unwrap();

        let mut tampered = signature;
        tampered[0] ^= 1;
        assert_eq!(
            verify(&key, algorithm, message, &tampered),
            Err(Error::SignatureInvalid)
        );
    }

    #[test]
    fn ecdsa_sign_verify_round_trip() {
        let signing = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let message = b"security object";
        let digest = Sha256::digest(message);
        let signature: p256::ecdsa::Signature = signing.sign_prehash(&digest).unwrap();
        let der = signature.to_der();

        let point = signing.verifying_key().to_encoded_point(false);
        let key = SubjectPublicKey::Ec {
            curve: EcCurve::P256,
            x: point.x().unwrap().to_vec(),
            y: point.y().unwrap().to_vec(),
        };
        let algorithm = SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256);
        verify(&key, algorithm, message, der.as_bytes()).unwrap();
        assert_eq!(
            verify(&key, algorithm, b"other message", der.as_bytes()),
            Err(Error::SignatureInvalid)
        );
    }
}
