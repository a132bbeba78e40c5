//! CSCA trust lists built from ICAO PKD master-list LDIF exports.
//!
//! A PKD export is an LDIF file whose entries carry a base64 CMS SignedData
//! blob under the `pkdMasterListContent` attribute. Each SignedData wraps a
//! CscaMasterList (ICAO 9303-12 9): a SEQUENCE of a version INTEGER and a SET
//! of complete X.509 certificates. Several states cross-publish each other's
//! CSCA certificates, so the same certificate shows up in many master lists;
//! the list deduplicates on TBS fingerprint.

use {
    crate::{
        asn1::{content_info_from_der, signed_data_from_content_info, TaggedValue},
        cert::{Certificate, Fingerprint},
        error::{Error, Result},
    },
    base64::{prelude::BASE64_STANDARD, Engine},
    der::{asn1::OctetString, Encode, Header, Length, Tag},
    std::collections::HashSet,
    tracing::{debug, warn},
};

/// LDIF attribute carrying a base64 master-list blob. The double colon marks
/// base64 transfer encoding per RFC 2849.
const PKD_MASTER_LIST_ATTRIBUTE: &str = "pkdMasterListContent:: ";

const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";

/// Deduplicated collection of CSCA certificates, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrustList {
    certificates: Vec<Certificate>,
    fingerprints: HashSet<Fingerprint>,
}

impl TrustList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trust list from one or more LDIF documents.
    pub fn from_ldif_sources<'a>(sources: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut list = Self::new();
        for source in sources {
            list.add_ldif(source)?;
        }
        Ok(list)
    }

    /// Merge every master list found in an LDIF document.
    ///
    /// An undecodable base64 record or CMS envelope fails the call; a single
    /// malformed certificate inside an otherwise valid master list is logged
    /// and skipped.
    pub fn add_ldif(&mut self, ldif: &str) -> Result<()> {
        for record in extract_master_list_records(ldif) {
            let der = BASE64_STANDARD
                .decode(&record)
                .map_err(|err| Error::MalformedEncoding(err.to_string()))?;
            self.add_master_list(&der)?;
        }
        Ok(())
    }

    /// Merge a single DER-encoded master-list SignedData envelope.
    pub fn add_master_list(&mut self, der: &[u8]) -> Result<()> {
        let info = content_info_from_der(der)?;
        let signed = signed_data_from_content_info(&info)?;
        let content = signed
            .encap_content_info
            .econtent
            .ok_or(Error::MissingContent)?;
        let content = content.decode_as::<OctetString>()?;

        // CscaMasterList ::= SEQUENCE { version INTEGER, certList SET OF Certificate }
        let master_list = TaggedValue::decode(content.as_bytes())?;
        let elements = master_list.as_sequence()?;
        let cert_set = elements
            .get(1)
            .ok_or(Error::SchemaMismatch("CscaMasterList"))?
            .as_set()?;

        let mut added = 0usize;
        for member in cert_set {
            match Certificate::from_der(member.raw()) {
                Ok(certificate) => {
                    if self.push(certificate) {
                        added += 1;
                    }
                }
                Err(err) => warn!(%err, "skipping malformed master-list certificate"),
            }
        }
        debug!(total = cert_set.len(), added, "merged master list");
        Ok(())
    }

    /// Add a certificate unless an identical one is already present.
    /// Returns whether it was added.
    pub fn push(&mut self, certificate: Certificate) -> bool {
        if self.fingerprints.insert(certificate.fingerprint()) {
            self.certificates.push(certificate);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Certificate> {
        self.certificates.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter()
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn contains_fingerprint(&self, fingerprint: Fingerprint) -> bool {
        self.fingerprints.contains(&fingerprint)
    }

    /// Serialize as a SEQUENCE of the raw certificate encodings.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let content: usize = self.certificates.iter().map(|cert| cert.as_der().len()).sum();
        let header = Header::new(Tag::Sequence, Length::try_from(content)?)?;
        let mut out = Vec::with_capacity(content + 8);
        header.encode_to_vec(&mut out)?;
        for certificate in &self.certificates {
            out.extend_from_slice(certificate.as_der());
        }
        Ok(out)
    }

    /// Decode a list serialized by [`Self::to_der`]. Deduplication applies.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let sequence = TaggedValue::decode(bytes)?;
        let mut list = Self::new();
        for member in sequence.as_sequence()? {
            list.push(Certificate::from_der(member.raw())?);
        }
        Ok(list)
    }

    /// Serialize as concatenated PEM certificate blocks.
    pub fn to_pem(&self) -> String {
        let mut out = String::new();
        for certificate in &self.certificates {
            out.push_str(PEM_HEADER);
            out.push('\n');
            let encoded = BASE64_STANDARD.encode(certificate.as_der());
            for chunk in encoded.as_bytes().chunks(64) {
                // Chunks of valid base64 stay valid UTF-8.
                out.push_str(core::str::from_utf8(chunk).unwrap_or_default());
                out.push('\n');
            }
            out.push_str(PEM_FOOTER);
            out.push('\n');
        }
        out
    }

    /// Decode concatenated PEM certificate blocks. Deduplication applies.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let mut list = Self::new();
        let mut body: Option<String> = None;
        for line in pem.lines() {
            let line = line.trim();
            if line == PEM_HEADER {
                body = Some(String::new());
            } else if line == PEM_FOOTER {
                let encoded = body
                    .take()
                    .ok_or_else(|| Error::MalformedEncoding("PEM footer without header".into()))?;
                let der = BASE64_STANDARD
                    .decode(encoded)
                    .map_err(|err| Error::MalformedEncoding(err.to_string()))?;
                list.push(Certificate::from_der(&der)?);
            } else if let Some(body) = &mut body {
                body.push_str(line);
            }
        }
        if body.is_some() {
            return Err(Error::MalformedEncoding("unterminated PEM block".into()));
        }
        Ok(list)
    }
}

impl<'a> IntoIterator for &'a TrustList {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

/// Pull the base64 payload of every `pkdMasterListContent` attribute out of
/// an LDIF document, unfolding RFC 2849 continuation lines (a leading space
/// continues the previous line).
fn extract_master_list_records(ldif: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current: Option<String> = None;
    for line in ldif.lines() {
        if let Some(payload) = line.strip_prefix(PKD_MASTER_LIST_ATTRIBUTE) {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(payload.to_string());
        } else if let (Some(record), Some(continuation)) = (&mut current, line.strip_prefix(' ')) {
            record.push_str(continuation);
        } else if let Some(record) = current.take() {
            records.push(record);
        }
    }
    if let Some(record) = current {
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfolds_continuation_lines() {
        let ldif = "dn: o=example\n\
                    pkdMasterListContent:: AAAA\n \
                    BBBB\n \
                    CCCC\n\
                    objectClass: top\n";
        assert_eq!(extract_master_list_records(ldif), vec!["AAAABBBBCCCC"]);
    }

    #[test]
    fn collects_multiple_records() {
        let ldif = "pkdMasterListContent:: AAAA\n\
                    dn: o=next\n\
                    pkdMasterListContent:: BBBB\n \
                    CCCC";
        assert_eq!(
            extract_master_list_records(ldif),
            vec!["AAAA", "BBBBCCCC"]
        );
    }

    #[test]
    fn ignores_unrelated_attributes() {
        let ldif = "dn: o=example\ncn: no master list here\n";
        assert!(extract_master_list_records(ldif).is_empty());
    }

    #[test]
    fn record_terminated_by_end_of_input() {
        let ldif = "pkdMasterListContent:: ZZZZ";
        assert_eq!(extract_master_list_records(ldif), vec!["ZZZZ"]);
    }
}
