//! Error taxonomy for trust-list building, SOD decoding and chain validation.
//!
//! Malformed ASN.1 is always fatal to the structure being parsed. A
//! well-formed structure of the wrong shape is fatal to that item only.
//! "No issuer found" is an expected outcome of scanning a partial trust-list
//! shard; it only becomes [`Error::IssuerNotFound`] at the final gate of the
//! document authentication chain.

use {const_oid::ObjectIdentifier as Oid, std::fmt, thiserror::Error};

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// ASN.1 tag/length violation, e.g. a length prefix overrunning the
    /// buffer.
    #[error("malformed DER/BER encoding: {0}")]
    MalformedEncoding(String),

    /// Well-formed ASN.1 that does not match the expected CMS/X.509 shape.
    #[error("ASN.1 structure does not match the expected shape of {0}")]
    SchemaMismatch(&'static str),

    #[error("unsupported CMS content type {0}")]
    UnsupportedContentType(Oid),

    #[error("unsupported digest algorithm {0}")]
    UnsupportedDigestAlgorithm(Oid),

    #[error("unsupported signature algorithm {0}")]
    UnsupportedSignatureAlgorithm(Oid),

    #[error("unsupported subject public key algorithm {0}")]
    UnsupportedPublicKey(Oid),

    #[error("CMS SignedData carries no encapsulated content")]
    MissingContent,

    #[error("CMS SignedData carries no signer info")]
    MissingSignerInfo,

    /// A recomputed digest was not found at its structurally fixed offset.
    /// Signals tampering or a wrong algorithm assumption.
    #[error("digest not contained at the expected offset ({0})")]
    ContainmentMismatch(Containment),

    #[error("cryptographic signature verification failed")]
    SignatureInvalid,

    /// All trust-list candidates were exhausted without a verifying issuer.
    #[error("no trust-list candidate verifies the certificate")]
    IssuerNotFound,

    #[error("trust list of {size} entries exceeds registry capacity 2^{height}")]
    CapacityExceeded { size: usize, height: u32 },
}

/// Which fixed-offset containment check of the authentication chain failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
    /// DG1 digest inside the LDS Security Object bytes.
    Dg1InLds,
    /// LDS digest inside the signed-attributes bytes.
    LdsInSignedAttrs,
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dg1InLds => f.write_str("DG1 digest in LDS security object"),
            Self::LdsInSignedAttrs => f.write_str("LDS digest in signed attributes"),
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Self::MalformedEncoding(err.to_string())
    }
}
