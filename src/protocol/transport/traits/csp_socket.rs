//! Cubesat Space Protocol socket abstraction. The caller owns CSP routing
//! and buffer management; the library only hands payloads across.
use crate::error::Error;
use futures_util::Future;

/// Connectionless CSP send/receive pair, both bounded by the supplied
/// timeout in milliseconds.
pub trait CspSocket {
    /// Send `data` to `dst:dst_port`, sourced from `src_port`.
    ///
    /// The implementation constructs and owns the CSP packet, freeing it on
    /// a failed send, and reports the result of the underlying `csp_sendto`.
    fn send_to<'a>(
        &'a mut self,
        dst: u8,
        dst_port: u8,
        src_port: u8,
        data: &'a [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<(), Error>> + 'a;

    /// Receive the next packet addressed to `port` into `buf`, returning
    /// its length, or [`Error::CspRecvTimeout`] when nothing arrives in
    /// time.
    fn recv_from<'a>(
        &'a mut self,
        port: u8,
        buf: &'a mut [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<usize, Error>> + 'a;
}
