//! Pure ASN1 types, no application logic.
//!
//! The CMS envelopes (ContentInfo, SignedData) come from the [`cms`] crate
//! and are narrowed here into the shapes ICAO 9303 requires. Structures that
//! need to be walked generically, such as the certificate SET inside a CSCA
//! master list, are decoded into the [`TaggedValue`] tree instead so that a
//! single malformed member does not poison the whole structure.

mod digest_algorithm;
mod lds_security_object;
pub mod tlv;

pub use self::{
    digest_algorithm::{
        dg1_offset_in_lds, DigestAlgorithm, LDS_DIGEST_OFFSET_IN_SIGNED_ATTRS,
    },
    lds_security_object::{DataGroupHash, LdsSecurityObject},
    tlv::TaggedValue,
};
use {
    crate::error::{Error, Result},
    cms::{content_info::ContentInfo, signed_data::SignedData},
    const_oid::db::rfc5911::ID_SIGNED_DATA,
    der::{asn1::ObjectIdentifier as Oid, Any, Decode, Sequence, ValueOrd},
};

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct AnyAlgorithmIdentifier {
    pub algorithm:  Oid,
    pub parameters: Option<Any>,
}

/// Decode a CMS ContentInfo envelope.
pub fn content_info_from_der(bytes: &[u8]) -> Result<ContentInfo> {
    Ok(ContentInfo::from_der(bytes)?)
}

/// Extract the SignedData from a ContentInfo.
///
/// The contentType must be id-signedData per [RFC 5652]; master lists and
/// SODs are both distributed this way (ICAO 9303-12 9, 9303-10 4.6.2).
pub fn signed_data_from_content_info(info: &ContentInfo) -> Result<SignedData> {
    if info.content_type != ID_SIGNED_DATA {
        return Err(Error::UnsupportedContentType(info.content_type));
    }
    info.content
        .decode_as::<SignedData>()
        .map_err(|_| Error::SchemaMismatch("CMS SignedData"))
}
