//! Error definitions shared across library modules.
//! The numeric codes returned by [`Error::code`] are stable: they are part
//! of the API contract and match the values reported by CubeSpace devices
//! and ground tooling.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Every failure the library can report, across all layers.
///
/// The first block is the general taxonomy, the `Tctlm*` block mirrors the
/// on-wire NACK reasons (see [`nack_status`]), and the `Csp*` block is
/// reserved for CSP hook implementations.
pub enum Error {
    /// Required argument was absent (reserved; kept for code stability).
    #[error("null argument")]
    Nullptr,
    /// Size incorrect.
    #[error("size incorrect")]
    Size,
    /// Size too low.
    #[error("size too low")]
    SizeLow,
    /// Size too high.
    #[error("size too high")]
    SizeHigh,
    /// Receive buffer overrun.
    #[error("buffer overrun")]
    Overrun,
    /// Parameter out of range.
    #[error("parameter out of range")]
    Param,
    /// Transaction timeout.
    #[error("timeout")]
    Timeout,
    /// TCTLM comms Nack.
    #[error("tctlm nack")]
    Nack,
    /// Busy.
    #[error("busy")]
    Busy,
    /// Bulk transfer frame error reported by the device.
    #[error("frame error")]
    Frame,
    /// Bulk transfer frame checksum mismatch.
    #[error("frame checksum mismatch")]
    Crc,
    /// Link read failure, or nothing buffered on a non-blocking read.
    #[error("read failure")]
    Read,
    /// Link write failure.
    #[error("write failure")]
    Write,
    /// CAN ID type error.
    #[error("can id type error")]
    CanId,
    /// CAN frame error.
    #[error("can frame error")]
    CanErr,
    /// NACK reason byte outside the documented table.
    #[error("unknown nack reason")]
    UknNack,
    /// Endpoint node type is invalid for the requested operation.
    #[error("invalid node type")]
    NodeType,
    /// File transfer device-internal error; inspect the status struct.
    #[error("file transfer internal error")]
    Ftp,
    /// Illegal argument combination.
    #[error("usage error")]
    Usage,
    /// Auto-discovery error.
    #[error("auto-discovery error")]
    AutoDiscovery,
    /// Image transfer device-internal error; inspect the status struct.
    #[error("image transfer internal error")]
    Img,
    /// Requested item does not exist on the device.
    #[error("does not exist")]
    Exist,
    /// Caller-supplied buffer provider violated its contract.
    #[error("user data error")]
    UserData,
    /// Caller's commit hook rejected the frame buffer.
    #[error("commit rejected")]
    Commit,
    /// Malformed TCTLM response framing.
    #[error("tctlm protocol error")]
    TctlmProtocol,
    /// General unexpected error.
    #[error("unknown error")]
    Unknown,
    /// Telemetry response size does not match the message layout.
    #[error("telemetry size error")]
    TlmSize,
    /// TCTLM response ID does not match the request.
    #[error("tctlm id mismatch")]
    TctlmId,

    /// TCTLM Nack - invalid ID.
    #[error("nack: invalid id")]
    TctlmInvalidId,
    /// TCTLM Nack - invalid parameter length.
    #[error("nack: invalid length")]
    TctlmInvalidLength,
    /// TCTLM Nack - invalid parameter data.
    #[error("nack: invalid parameter")]
    TctlmInvalidParam,
    /// TCTLM Nack - CRC failed.
    #[error("nack: crc failed")]
    TctlmCrc,
    /// TCTLM Nack - request not supported by this firmware.
    #[error("nack: not implemented")]
    TctlmNotImplemented,
    /// TCTLM Nack - firmware cannot accept another command right now.
    #[error("nack: busy")]
    TctlmBusy,
    /// TCTLM Nack - command not possible in the current firmware state.
    #[error("nack: sequence")]
    TctlmSequence,
    /// TCTLM Nack - internal request failure.
    #[error("nack: internal")]
    TctlmInternal,
    /// TCTLM Nack - pass-through request timeout.
    #[error("nack: pass-through timeout")]
    TctlmPassTimeout,
    /// TCTLM Nack - pass-through target invalid or disabled.
    #[error("nack: pass-through target")]
    TctlmPassTarget,

    /// CSP - receive timeout.
    #[error("csp receive timeout")]
    CspRecvTimeout,
    /// CSP - failed to acquire a buffer.
    #[error("csp buffer unavailable")]
    CspBufferNone,

    /// Hook not wired in this build.
    #[error("not implemented")]
    Todo,
}

impl Error {
    /// Stable numeric code for this error. `0` is reserved for success and
    /// is never returned here.
    pub const fn code(&self) -> i32 {
        match self {
            Error::Nullptr => 1,
            Error::Size => 2,
            Error::SizeLow => 3,
            Error::SizeHigh => 4,
            Error::Overrun => 5,
            Error::Param => 6,
            Error::Timeout => 7,
            Error::Nack => 8,
            Error::Busy => 9,
            Error::Frame => 10,
            Error::Crc => 11,
            Error::Read => 12,
            Error::Write => 13,
            Error::CanId => 14,
            Error::CanErr => 15,
            Error::UknNack => 16,
            Error::NodeType => 17,
            Error::Ftp => 18,
            Error::Usage => 19,
            Error::AutoDiscovery => 20,
            Error::Img => 21,
            Error::Exist => 22,
            Error::UserData => 23,
            Error::Commit => 24,
            Error::TctlmProtocol => 25,
            Error::Unknown => 26,
            Error::TlmSize => 27,
            Error::TctlmId => 28,
            Error::TctlmInvalidId => 50,
            Error::TctlmInvalidLength => 51,
            Error::TctlmInvalidParam => 52,
            Error::TctlmCrc => 53,
            Error::TctlmNotImplemented => 54,
            Error::TctlmBusy => 55,
            Error::TctlmSequence => 56,
            Error::TctlmInternal => 57,
            Error::TctlmPassTimeout => 58,
            Error::TctlmPassTarget => 59,
            Error::CspRecvTimeout => 70,
            Error::CspBufferNone => 71,
            Error::Todo => 65535,
        }
    }
}

/// Map an on-wire NACK reason byte to the transaction outcome.
///
/// Reason `0` is an acknowledgement carried in a NACK frame and is treated
/// as success; reasons outside `0..=10` map to [`Error::UknNack`].
pub fn nack_status(reason: u8) -> Result<(), Error> {
    match reason {
        0 => Ok(()),
        1 => Err(Error::TctlmInvalidId),
        2 => Err(Error::TctlmInvalidLength),
        3 => Err(Error::TctlmInvalidParam),
        4 => Err(Error::TctlmCrc),
        5 => Err(Error::TctlmNotImplemented),
        6 => Err(Error::TctlmBusy),
        7 => Err(Error::TctlmSequence),
        8 => Err(Error::TctlmInternal),
        9 => Err(Error::TctlmPassTimeout),
        10 => Err(Error::TctlmPassTarget),
        _ => Err(Error::UknNack),
    }
}
