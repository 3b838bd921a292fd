//! Stub hook implementation for carriers a build does not wire.
//!
//! Plays the role of overridable defaults: a master constructed with
//! `Unimplemented` for an unused carrier still compiles and links, and any
//! request routed to that carrier fails loudly with [`Error::Todo`].
use crate::error::Error;
use crate::protocol::transport::can_packet::CanPacket;
use crate::protocol::transport::traits::{CanBus, CspSocket, UartPort};

/// Placeholder satisfying every link-hook trait.
///
/// There is deliberately no [`Clock`](super::Clock) implementation: the
/// transport cannot operate without a real time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unimplemented;

impl CanBus for Unimplemented {
    fn rx_flush(&mut self) {}

    async fn recv(&mut self) -> Result<CanPacket, Error> {
        Err(Error::Todo)
    }

    async fn send<'a>(&'a mut self, _packet: &'a CanPacket) -> Result<(), Error> {
        Err(Error::Todo)
    }
}

impl UartPort for Unimplemented {
    fn rx_flush(&mut self) {}

    async fn read<'a>(&'a mut self, _buf: &'a mut [u8]) -> Result<usize, Error> {
        Err(Error::Todo)
    }

    async fn write<'a>(&'a mut self, _data: &'a [u8]) -> Result<(), Error> {
        Err(Error::Todo)
    }
}

impl CspSocket for Unimplemented {
    async fn send_to<'a>(
        &'a mut self,
        _dst: u8,
        _dst_port: u8,
        _src_port: u8,
        _data: &'a [u8],
        _timeout_ms: u32,
    ) -> Result<(), Error> {
        Err(Error::Todo)
    }

    async fn recv_from<'a>(
        &'a mut self,
        _port: u8,
        _buf: &'a mut [u8],
        _timeout_ms: u32,
    ) -> Result<usize, Error> {
        Err(Error::Todo)
    }
}
