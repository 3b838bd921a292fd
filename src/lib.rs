//! `cube-obc` library: OBC-side driver for CubeSpace ADCS products.
//! Exposes the TCTLM master transport (CAN extended-ID, CAN encapsulated in
//! CSP, UART byte-stream), the frame-by-frame bulk data transfer engine, and
//! the operation helpers (file uploads, upgrades, log and image downloads)
//! in a `no_std` environment. Link hooks and the clock are injected by the
//! caller through the traits in [`protocol::transport::traits`].
#![no_std]
//==================================================================================
/// Error taxonomy with stable numeric codes, and the NACK byte mapping.
pub mod error;
/// Byte-level payload codec shared by the hand-written TCTLM messages.
pub mod infra;
/// Protocol implementation: TCTLM master transport, message subset,
/// bulk data transfer, and operation choreographers.
pub mod protocol;
//==================================================================================

pub use error::Error;

/// Version triple reported by [`version`] and [`system_version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

/// Library version.
pub const fn version() -> Version {
    Version {
        major: 0,
        minor: 3,
        patch: 1,
    }
}

/// System version: the CubeSpace TCTLM API generation this library speaks.
pub const fn system_version() -> Version {
    Version {
        major: 5,
        minor: 0,
        patch: 0,
    }
}
