//! Generic DER/BER tag-length-value tree.
//!
//! Schema-directed decoding (certificates, CMS envelopes) uses the typed
//! [`der`] derives elsewhere in this crate. This tree exists for the places
//! where the structure must be walked without a schema: pulling raw
//! certificate encodings out of a master list's eContent, where one rotten
//! member must not fail the whole SET. Every node keeps its complete raw
//! encoding so sub-structures can be re-serialized byte-exactly.

use {
    crate::error::{Error, Result},
    der::{asn1::ObjectIdentifier as Oid, Decode, Header, Reader, SliceReader, Tag},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedValue {
    raw:  Vec<u8>,
    kind: ValueKind,
}

/// Closed set of value shapes used by CMS ContentInfo and X.509 Certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// INTEGER content octets, big-endian two's complement.
    Integer(Vec<u8>),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    Sequence(Vec<TaggedValue>),
    Set(Vec<TaggedValue>),
    /// Any other constructed value (context-specific, application).
    Constructed { tag: Tag, elements: Vec<TaggedValue> },
    /// Any other primitive value.
    Primitive { tag: Tag, content: Vec<u8> },
}

impl TaggedValue {
    /// Decode a single value covering the whole input.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (value, consumed) = Self::decode_prefix(bytes)?;
        if consumed != bytes.len() {
            return Err(Error::MalformedEncoding(format!(
                "{} trailing bytes after value",
                bytes.len() - consumed
            )));
        }
        Ok(value)
    }

    /// Decode one value from the front of the input, returning the number of
    /// bytes consumed.
    fn decode_prefix(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut reader = SliceReader::new(bytes)
            .map_err(|err| Error::MalformedEncoding(err.to_string()))?;
        let header =
            Header::decode(&mut reader).map_err(|err| Error::MalformedEncoding(err.to_string()))?;
        let header_len = usize::try_from(reader.position())
            .map_err(|err| Error::MalformedEncoding(err.to_string()))?;
        let content_len = usize::try_from(header.length)
            .map_err(|err| Error::MalformedEncoding(err.to_string()))?;
        let total = header_len
            .checked_add(content_len)
            .ok_or_else(|| Error::MalformedEncoding("length overflow".into()))?;
        if total > bytes.len() {
            return Err(Error::MalformedEncoding(format!(
                "length {content_len} overruns buffer of {} bytes",
                bytes.len() - header_len
            )));
        }
        let content = &bytes[header_len..total];

        let kind = match header.tag {
            Tag::Integer => ValueKind::Integer(content.to_vec()),
            Tag::OctetString => ValueKind::OctetString(content.to_vec()),
            Tag::ObjectIdentifier => ValueKind::ObjectIdentifier(
                Oid::from_bytes(content).map_err(|err| Error::MalformedEncoding(err.to_string()))?,
            ),
            Tag::Sequence => ValueKind::Sequence(Self::decode_children(content)?),
            Tag::Set => ValueKind::Set(Self::decode_children(content)?),
            tag if tag.is_constructed() => ValueKind::Constructed {
                tag,
                elements: Self::decode_children(content)?,
            },
            tag => ValueKind::Primitive {
                tag,
                content: content.to_vec(),
            },
        };

        Ok((
            Self {
                raw: bytes[..total].to_vec(),
                kind,
            },
            total,
        ))
    }

    fn decode_children(mut content: &[u8]) -> Result<Vec<Self>> {
        let mut children = Vec::new();
        while !content.is_empty() {
            let (child, consumed) = Self::decode_prefix(content)?;
            children.push(child);
            content = &content[consumed..];
        }
        Ok(children)
    }

    /// Complete raw TLV encoding of this value.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn as_sequence(&self) -> Result<&[Self]> {
        match &self.kind {
            ValueKind::Sequence(elements) => Ok(elements),
            _ => Err(Error::SchemaMismatch("SEQUENCE")),
        }
    }

    pub fn as_set(&self) -> Result<&[Self]> {
        match &self.kind {
            ValueKind::Set(elements) => Ok(elements),
            _ => Err(Error::SchemaMismatch("SET")),
        }
    }

    pub fn as_integer(&self) -> Result<&[u8]> {
        match &self.kind {
            ValueKind::Integer(content) => Ok(content),
            _ => Err(Error::SchemaMismatch("INTEGER")),
        }
    }

    /// Small non-negative INTEGER value.
    pub fn as_u64(&self) -> Result<u64> {
        let content = self.as_integer()?;
        let digits = match content.split_first() {
            Some((0, rest)) => rest,
            _ => content,
        };
        if digits.len() > 8 || content.first().is_some_and(|byte| byte & 0x80 != 0) {
            return Err(Error::SchemaMismatch("small non-negative INTEGER"));
        }
        Ok(digits.iter().fold(0, |acc, &byte| (acc << 8) | u64::from(byte)))
    }

    pub fn as_octet_string(&self) -> Result<&[u8]> {
        match &self.kind {
            ValueKind::OctetString(content) => Ok(content),
            _ => Err(Error::SchemaMismatch("OCTET STRING")),
        }
    }

    pub fn as_oid(&self) -> Result<Oid> {
        match &self.kind {
            ValueKind::ObjectIdentifier(oid) => Ok(*oid),
            _ => Err(Error::SchemaMismatch("OBJECT IDENTIFIER")),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex};

    #[test]
    fn decode_nested_sequence() {
        // SEQUENCE { INTEGER 5, SET { OID 2.23.136.1.1.1 }, OCTET STRING }
        let bytes = hex!("300f 0201 05 3108 0606 678108010101 0400");
        let value = TaggedValue::decode(&bytes).unwrap();
        let elements = value.as_sequence().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].as_u64().unwrap(), 5);
        let set = elements[1].as_set().unwrap();
        assert_eq!(
            set[0].as_oid().unwrap(),
            Oid::new_unwrap("2.23.136.1.1.1")
        );
        assert_eq!(elements[2].as_octet_string().unwrap(), &[] as &[u8]);
        assert_eq!(value.raw(), &bytes);
        assert_eq!(set[0].raw(), &hex!("0606 678108010101"));
    }

    #[test]
    fn length_overrun_is_malformed() {
        // SEQUENCE claiming 4 content bytes but carrying only 2.
        let bytes = hex!("3004 0201");
        assert!(matches!(
            TaggedValue::decode(&bytes),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let bytes = hex!("0201 05 00");
        assert!(matches!(
            TaggedValue::decode(&bytes),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn context_specific_constructed() {
        // [0] EXPLICIT { INTEGER 1 }
        let bytes = hex!("a003 020101");
        let value = TaggedValue::decode(&bytes).unwrap();
        match value.kind() {
            ValueKind::Constructed { elements, .. } => {
                assert_eq!(elements[0].as_u64().unwrap(), 1);
            }
            other => panic!("expected constructed value, got {other:?}"),
        }
    }

    #[test]
    fn accessor_mismatch_is_schema_error() {
        let value = TaggedValue::decode(&hex!("0201 05")).unwrap();
        assert_eq!(value.as_sequence(), Err(Error::SchemaMismatch("SEQUENCE")));
        assert_eq!(
            value.as_octet_string(),
            Err(Error::SchemaMismatch("OCTET STRING"))
        );
    }
}
