//! Passive authentication of a document against a trust list.
//!
//! The chain runs from the machine readable zone up to a CSCA certificate:
//! the DG1 digest must sit at its fixed offset inside the LDS Security
//! Object, the LDS digest at its fixed offset inside the signed attributes,
//! the document signer's signature must verify over the signed attributes,
//! and finally a trust-list candidate must verify the document signer
//! certificate itself. Issuer candidates are matched by authority/subject
//! key identifier when the leaf carries one, by distinguished name
//! otherwise, gated on the candidate's validity window covering the leaf's
//! issuance time.

use {
    crate::{
        asn1::{dg1_offset_in_lds, LDS_DIGEST_OFFSET_IN_SIGNED_ATTRS},
        cert::Certificate,
        crypto::{self, SignatureAlgorithm},
        error::{Containment, Error, Result},
        sod::Sod,
        trust_list::TrustList,
    },
    subtle::ConstantTimeEq,
    tracing::debug,
};

/// Outcome of scanning candidates for a certificate's issuer.
///
/// `NotFound` is a normal outcome: trust lists are distributed in shards and
/// a single shard often lacks the issuing CSCA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuerSearch<'a> {
    Found {
        issuer: &'a Certificate,
        /// Position within the candidate slice.
        index: usize,
    },
    NotFound,
}

impl<'a> IssuerSearch<'a> {
    pub const fn issuer(self) -> Option<&'a Certificate> {
        match self {
            Self::Found { issuer, .. } => Some(issuer),
            Self::NotFound => None,
        }
    }

    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Authenticate a document: given its EF.SOD and raw DG1 bytes, walk the
/// whole chain and return the trusted CSCA certificate that anchors it.
pub fn authenticate<'a>(
    sod: &Sod,
    dg1: &[u8],
    trust_list: &'a TrustList,
) -> Result<&'a Certificate> {
    let dg1_digest = sod.digest_algorithm.hash(dg1);
    assert_contains_at(
        &sod.lds_bytes,
        dg1_offset_in_lds(sod.digest_algorithm),
        &dg1_digest,
        Containment::Dg1InLds,
    )?;

    let signer_digest = sod.signature_algorithm.digest_algorithm();
    let lds_digest = signer_digest.hash(&sod.lds_bytes);
    assert_contains_at(
        &sod.signed_attrs_bytes,
        LDS_DIGEST_OFFSET_IN_SIGNED_ATTRS,
        &lds_digest,
        Containment::LdsInSignedAttrs,
    )?;

    crypto::verify(
        &sod.document_signer.public_key,
        sod.signature_algorithm,
        &sod.signed_attrs_bytes,
        &sod.signature,
    )?;

    match find_issuer(&sod.document_signer, trust_list.certificates()) {
        IssuerSearch::Found { issuer, .. } => Ok(issuer),
        IssuerSearch::NotFound => Err(Error::IssuerNotFound),
    }
}

/// Scan `candidates` in order for a certificate that issued `leaf`.
///
/// Key identifier linkage runs strictly first: when the leaf carries a
/// non-empty authority key identifier, every candidate with a byte-equal
/// subject key identifier is tried. Only when that phase produces no
/// verifying issuer does the search fall back to matching the candidate
/// subject name against the leaf issuer name. Within a phase the first
/// candidate whose signature verifies wins.
pub fn find_issuer<'a>(leaf: &Certificate, candidates: &'a [Certificate]) -> IssuerSearch<'a> {
    let algorithm = match SignatureAlgorithm::from_oid(leaf.signature_algorithm) {
        Ok(algorithm) => algorithm,
        Err(err) => {
            debug!(%err, "issuer search aborted");
            return IssuerSearch::NotFound;
        }
    };

    if let Some(aki) = leaf.authority_key_id.as_ref().filter(|aki| !aki.is_empty()) {
        let by_key_id = scan(leaf, candidates, algorithm, |candidate| {
            candidate.subject_key_id.as_ref() == Some(aki)
        });
        if by_key_id.is_found() {
            return by_key_id;
        }
    }
    scan(leaf, candidates, algorithm, |candidate| {
        candidate.subject == leaf.issuer
    })
}

fn scan<'a>(
    leaf: &Certificate,
    candidates: &'a [Certificate],
    algorithm: SignatureAlgorithm,
    matches: impl Fn(&Certificate) -> bool,
) -> IssuerSearch<'a> {
    for (index, candidate) in candidates.iter().enumerate() {
        if !matches(candidate) {
            continue;
        }
        // Validity is judged at the leaf's issuance, not at verification
        // time; CSCAs routinely outlive the documents they signed.
        if !(candidate.not_before <= leaf.not_before && leaf.not_before < candidate.not_after) {
            debug!(index, "candidate not valid at issuance");
            continue;
        }
        match crypto::verify(
            &candidate.public_key,
            algorithm,
            leaf.tbs_bytes(),
            leaf.signature_bytes(),
        ) {
            Ok(()) => {
                debug!(index, "issuer verified");
                return IssuerSearch::Found {
                    issuer: candidate,
                    index,
                };
            }
            Err(_) => debug!(index, "candidate signature did not verify"),
        }
    }
    IssuerSearch::NotFound
}

/// Constant-time check that `needle` occupies `haystack[offset..]` exactly.
fn assert_contains_at(
    haystack: &[u8],
    offset: usize,
    needle: &[u8],
    containment: Containment,
) -> Result<()> {
    let window = haystack
        .get(offset..offset + needle.len())
        .ok_or(Error::ContainmentMismatch(containment))?;
    if window.ct_eq(needle).into() {
        Ok(())
    } else {
        Err(Error::ContainmentMismatch(containment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_window_checks() {
        let haystack = [0u8, 1, 2, 3, 4, 5];
        assert_contains_at(&haystack, 2, &[2, 3], Containment::Dg1InLds).unwrap();
        assert_eq!(
            assert_contains_at(&haystack, 2, &[3, 3], Containment::Dg1InLds),
            Err(Error::ContainmentMismatch(Containment::Dg1InLds))
        );
        // Offset past the end is a mismatch, not a panic.
        assert_eq!(
            assert_contains_at(&haystack, 5, &[5, 0], Containment::LdsInSignedAttrs),
            Err(Error::ContainmentMismatch(Containment::LdsInSignedAttrs))
        );
    }
}
