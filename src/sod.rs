//! EF.SOD, the Document Security Object of an eMRTD (ICAO 9303-10 4.6.2).
//!
//! The file as read from the chip starts with a 4-byte application tag and
//! length that is not part of the CMS structure; the ContentInfo begins at
//! offset 4. Inside is a SignedData whose eContent is an OCTET STRING
//! wrapping the LDS Security Object, signed by exactly one Document Signer
//! whose certificate rides along in the certificates field.

use {
    crate::{
        asn1::{
            content_info_from_der, signed_data_from_content_info, DigestAlgorithm,
            LdsSecurityObject,
        },
        cert::Certificate,
        crypto::SignatureAlgorithm,
        error::{Error, Result},
    },
    cms::cert::CertificateChoices,
    der::{asn1::OctetString, Decode, Encode},
    std::collections::BTreeMap,
};

/// Data groups are numbered 1 through 16 (ICAO 9303-10 4.6.2.3).
const MAX_DATA_GROUP: u64 = 16;

/// A decoded Document Security Object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sod {
    /// CMS SignedData version.
    pub version: u64,
    /// Digest algorithm of the data group hashes, from the LDS.
    pub digest_algorithm: DigestAlgorithm,
    /// Data group digests keyed by data group number.
    pub data_group_hashes: BTreeMap<u8, Vec<u8>>,
    /// Raw LDS Security Object encoding, the content the signer digested.
    pub lds_bytes: Vec<u8>,
    /// Signed attributes re-encoded under their universal SET tag, the exact
    /// message the document signer signed.
    pub signed_attrs_bytes: Vec<u8>,
    pub signature: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub document_signer: Certificate,
}

impl Sod {
    /// Decode an EF.SOD file as read from the chip, including its 4-byte
    /// prefix.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() <= 4 {
            return Err(Error::MalformedEncoding(
                "EF.SOD shorter than its 4-byte prefix".into(),
            ));
        }
        let info = content_info_from_der(&bytes[4..])?;
        let signed = signed_data_from_content_info(&info)?;

        let content = signed
            .encap_content_info
            .econtent
            .ok_or(Error::MissingContent)?;
        let lds_bytes = content.decode_as::<OctetString>()?.into_bytes();
        let lds = LdsSecurityObject::from_der(&lds_bytes)
            .map_err(|_| Error::SchemaMismatch("LDS security object"))?;
        let digest_algorithm = DigestAlgorithm::from_oid(lds.hash_algorithm.algorithm)?;

        let mut data_group_hashes = BTreeMap::new();
        for entry in &lds.data_group_hash_values {
            let number = entry.data_group_number;
            if !(1..=MAX_DATA_GROUP).contains(&number) {
                return Err(Error::SchemaMismatch("data group number"));
            }
            let digest = entry.data_group_hash_value.as_bytes();
            if digest.len() != digest_algorithm.digest_len() {
                return Err(Error::SchemaMismatch("data group digest length"));
            }
            #[allow(clippy::cast_possible_truncation)]
            if data_group_hashes
                .insert(number as u8, digest.to_vec())
                .is_some()
            {
                return Err(Error::SchemaMismatch("duplicate data group number"));
            }
        }

        let signer = signed
            .signer_infos
            .0
            .iter()
            .next()
            .ok_or(Error::MissingSignerInfo)?;
        let signer_digest = DigestAlgorithm::from_oid(signer.digest_alg.oid)?;
        let signature_algorithm =
            SignatureAlgorithm::from_signer(signer.signature_algorithm.oid, signer_digest)?;
        let signed_attrs = signer
            .signed_attrs
            .as_ref()
            .ok_or(Error::SchemaMismatch("signedAttrs"))?;
        // SignedAttributes re-serialize under the universal SET tag here,
        // which is the form the signature covers (RFC 5652 5.4).
        let signed_attrs_bytes = signed_attrs.to_der()?;

        let document_signer = signed
            .certificates
            .as_ref()
            .into_iter()
            .flat_map(|certs| certs.0.iter())
            .find_map(|choice| match choice {
                CertificateChoices::Certificate(cert) => Some(cert),
                _ => None,
            })
            .ok_or(Error::SchemaMismatch("document signer certificate"))?;
        let document_signer = Certificate::from_der(&document_signer.to_der()?)?;

        Ok(Self {
            version: signed.version as u64,
            digest_algorithm,
            data_group_hashes,
            lds_bytes,
            signed_attrs_bytes,
            signature: signer.signature.as_bytes().to_vec(),
            signature_algorithm,
            document_signer,
        })
    }

    /// Digest recorded for a data group, if present.
    pub fn data_group_hash(&self, number: u8) -> Option<&[u8]> {
        self.data_group_hashes.get(&number).map(Vec::as_slice)
    }
}
