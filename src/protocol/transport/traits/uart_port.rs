//! UART link abstraction for the point-to-point TCTLM carrier.
use crate::error::Error;
use futures_util::Future;

/// Contract to move raw bytes over a serial link.
///
/// Reads are non-blocking: [`Error::Read`] when nothing is buffered, and a
/// short read (`Ok(n)` with `n < buf.len()`) is not an error. Writes block
/// until the bytes are handed to the driver and report failures as
/// [`Error::Write`].
pub trait UartPort {
    /// Discard everything currently buffered on the receive side.
    fn rx_flush(&mut self);

    /// Read up to `buf.len()` buffered bytes, returning how many were read.
    fn read<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = Result<usize, Error>> + 'a;

    /// Transmit all of `data`.
    fn write<'a>(&'a mut self, data: &'a [u8]) -> impl Future<Output = Result<(), Error>> + 'a;
}
