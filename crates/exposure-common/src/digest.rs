//! Content digests used as persistent identifiers
//!
//! Identifiers only need to be stable and collision resistant in practice, so
//! MD5 is used and the 16 byte digest is base64 encoded (24 printable chars).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Compute MD5 digest of a string, base64 encoded with padding
pub fn md5_base64(input: &str) -> String {
    let digest = md5::compute(input.as_bytes());
    STANDARD.encode(digest.0)
}

/// Compute MD5 digest of the given parts joined by `delimiter`
///
/// The parts are streamed into the hasher so no joined copy is allocated.
pub fn md5_base64_joined<'a, I>(parts: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut context = md5::Context::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            context.consume(delimiter.as_bytes());
        }
        context.consume(part.as_bytes());
    }
    STANDARD.encode(context.compute().0)
}
