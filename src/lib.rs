//! eMRTD trust-chain toolkit.
//!
//! Builds CSCA trust lists out of ICAO PKD master-list LDIF exports, decodes
//! EF.SOD Document Security Objects, authenticates a document's machine
//! readable zone against a trust list through the full passive
//! authentication chain, and commits trust-list public keys into a
//! fixed-height Merkle registry with membership witnesses.
//!
//! The typical flow:
//!
//! ```no_run
//! # fn main() -> emrtd_trust::Result<()> {
//! use emrtd_trust::{authenticate, Sod, TrustList, TrustRegistry, DEFAULT_MERKLE_HEIGHT};
//!
//! let ldif = std::fs::read_to_string("icaopkd-002-complete.ldif").unwrap();
//! let trust_list = TrustList::from_ldif_sources([ldif.as_str()])?;
//!
//! let sod = Sod::from_bytes(&std::fs::read("EF_SOD.bin").unwrap())?;
//! let dg1 = std::fs::read("EF_DG1.bin").unwrap();
//! let csca = authenticate(&sod, &dg1, &trust_list)?;
//!
//! let registry = TrustRegistry::build(&trust_list, DEFAULT_MERKLE_HEIGHT)?;
//! let witness = registry.witness_for(&csca.public_key);
//! # let _ = witness;
//! # Ok(())
//! # }
//! ```

pub mod asn1;
pub mod cert;
pub mod chain;
pub mod crypto;
pub mod error;
pub mod registry;
pub mod sod;
pub mod trust_list;

pub use self::{
    asn1::DigestAlgorithm,
    cert::{Certificate, EcCurve, Fingerprint, SubjectPublicKey},
    chain::{authenticate, find_issuer, IssuerSearch},
    crypto::SignatureAlgorithm,
    error::{Containment, Error, Result},
    registry::{TrustRegistry, Witness, DEFAULT_MERKLE_HEIGHT},
    sod::Sod,
    trust_list::TrustList,
};
