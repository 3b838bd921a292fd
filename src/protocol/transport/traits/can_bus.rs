//! Minimal abstraction for the CAN bus. Allows the library to plug into
//! various drivers (SocketCAN, embedded HAL, a simulated bus in tests).
use crate::error::Error;
use crate::protocol::transport::can_packet::CanPacket;
use futures_util::Future;

/// Contract to send and receive raw CAN packets.
///
/// Receive is non-blocking: when nothing is buffered the implementation
/// returns [`Error::Read`] immediately. Send may block until the bus
/// accepts the frame and reports driver failures as [`Error::Write`].
pub trait CanBus {
    /// Discard everything currently buffered on the receive side.
    fn rx_flush(&mut self);

    /// Retrieve the next buffered packet, or [`Error::Read`] when empty.
    fn recv(&mut self) -> impl Future<Output = Result<CanPacket, Error>>;

    /// Emit a packet on the bus.
    fn send<'a>(
        &'a mut self,
        packet: &'a CanPacket,
    ) -> impl Future<Output = Result<(), Error>> + 'a;
}
