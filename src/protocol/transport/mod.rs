//! TCTLM transport layer: CAN packet and extended-ID representations,
//! endpoint description, UART framing codec, link-hook traits, and the
//! master request/response engine.
//!
//! ## Timing constants
//!
//! The transport inserts small delays where devices require pacing or where
//! a non-blocking receive hook must be polled without monopolising the
//! executor.

pub mod can_id;
pub mod can_packet;
pub mod endpoint;
pub mod master;
pub mod traits;
pub mod uart_codec;

/// CAN packet data payload in bytes.
pub const CAN_DATA_BYTES: usize = 8;

/// Per-carrier request/response buffer size.
pub const COMMS_BUFFER_SIZE: usize = 512;

/// Largest TCTLM request or response payload.
pub const TCTLM_MAX_PAYLOAD: usize = 510;

/// First telemetry ID; everything below is a telecommand.
pub const TLM_ID_START: u8 = 128;

/// CSP destination port used for TCTLM.
pub const CSP_PORT_TCTLM: u8 = 8;

/// CSP destination port used for passthrough TCTLM.
pub const CSP_PORT_PASSTHROUGH: u8 = 48;

/// Size of the CubeSpace sub-header within a CSP packet.
pub const CSP_HEADER_SIZE: usize = 2;

/// Delay between consecutive CAN packets of one request when talking to a
/// CubeComputer node, which paces its receive path.
pub const INTER_PACKET_DELAY_MS: u32 = 1;

/// Delay between polls of an empty receive hook while waiting for a
/// response. Keeps the retry loop cooperative; the deadline accounting is
/// unaffected.
pub const RX_POLL_DELAY_MS: u32 = 1;
