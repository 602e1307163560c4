//! Request body reading and `application/x-www-form-urlencoded` decoding.

use std::io;
use std::io::Read;

use contact_intake_core::FormFields;

#[derive(Debug, PartialEq, Eq)]
pub enum Body {
    Complete(Vec<u8>),
    TooLarge,
}

/// Read at most `limit` bytes. One byte more means the body is too large.
pub fn read_body(reader: &mut dyn Read, limit: usize) -> io::Result<Body> {
    let mut buf = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    reader.take(cap).read_to_end(&mut buf)?;
    if buf.len() > limit {
        Ok(Body::TooLarge)
    } else {
        Ok(Body::Complete(buf))
    }
}

/// Decode a urlencoded body. Invalid UTF-8 is replaced, repeated keys keep
/// the last value.
pub fn decode_form(body: &[u8]) -> FormFields {
    url::form_urlencoded::parse(body).collect()
}
