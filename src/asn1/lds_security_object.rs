//! LDS Security Object, the signed digest manifest inside an EF.SOD.
//!
//! ICAO 9303-10 4.6.2.3:
//!
//! ```asn1
//! LDSSecurityObject ::= SEQUENCE {
//!     version            LDSSecurityObjectVersion,
//!     hashAlgorithm      DigestAlgorithmIdentifier,
//!     dataGroupHashValues SEQUENCE SIZE (2..ub-DataGroups) OF DataGroupHash }
//!
//! DataGroupHash ::= SEQUENCE {
//!     dataGroupNumber    DataGroupNumber,
//!     dataGroupHashValue OCTET STRING }
//! ```

use {
    super::AnyAlgorithmIdentifier,
    der::{asn1::OctetString, Sequence, ValueOrd},
};

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct LdsSecurityObject {
    pub version: u64,
    pub hash_algorithm: AnyAlgorithmIdentifier,
    pub data_group_hash_values: Vec<DataGroupHash>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence, ValueOrd)]
pub struct DataGroupHash {
    pub data_group_number: u64,
    pub data_group_hash_value: OctetString,
}
