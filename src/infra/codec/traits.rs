//! Public codec traits. They decouple the TCTLM message structures from the
//! transport and give the message subset a uniform serialization API.
use crate::error::Error;

//==================================================================================TO_PAYLOAD
/// Serialize a message structure into a sequence of bytes.
///
/// Implemented by every TCTLM message the library sends.
pub trait ToPayload {
    /// Serialize the structure into the provided buffer.
    ///
    /// Returns the number of bytes written on success, or [`Error::Size`]
    /// when the buffer is too small.
    fn to_payload(&self, buffer: &mut [u8]) -> Result<usize, Error>;
}
//==================================================================================FROM_PAYLOAD
/// Deserialize a sequence of bytes into a message structure.
///
/// Implemented by every TCTLM telemetry the library reads. A response
/// shorter than the message layout yields [`Error::TlmSize`].
pub trait FromPayload: Sized {
    /// Deserialize a byte slice to produce a new instance.
    fn from_payload(payload: &[u8]) -> Result<Self, Error>;
}
