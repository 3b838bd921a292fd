//! Operation choreographers: each composes a setup telecommand, a status
//! poll, and (where applicable) a bulk data transfer into a single call
//! that runs the device's state machine to a deterministic terminal state.
//!
//! Failure semantics are uniform: transport errors bubble up verbatim,
//! while a device-internal error discovered through a status telemetry is
//! translated to a domain error and the last-read status struct is left in
//! the caller's out-parameter.
use crate::error::Error;
use crate::protocol::bulk::FrameBufferProvider;
use crate::protocol::messages::control_program::FTP_META_MAX;

pub mod bootloader;
pub mod common;
pub mod file_transfer;
pub mod image;
pub mod logs;

/// Read the meta block of a CubeSpace file through the buffer provider
/// without consuming it past the meta boundary.
///
/// The first two bytes of the file hold the meta block size (which counts
/// those two bytes). The size is peeked without committing, the full meta
/// block is re-read from the same position, and only then is the meta
/// portion committed, leaving the provider cursor at the start of the data
/// portion. The meta bytes land in `meta`; returns `(meta_size, data_size)`.
fn read_file_meta<P: FrameBufferProvider>(
    provider: &mut P,
    total_size: u32,
    meta: &mut [u8; FTP_META_MAX],
) -> Result<(u16, u32), Error> {
    let meta_size = {
        let buffer = provider.frame_buffer(2)?;
        if buffer.len() != 2 {
            return Err(Error::UserData);
        }
        u16::from_le_bytes([buffer[0], buffer[1]])
    };

    if meta_size as usize > FTP_META_MAX {
        return Err(Error::SizeHigh);
    }

    let data_size = total_size
        .checked_sub(meta_size as u32)
        .ok_or(Error::SizeLow)?;

    // Uncommitted peek above: this read starts from the file start again.
    {
        let buffer = provider.frame_buffer(meta_size)?;
        if buffer.len() != meta_size as usize {
            return Err(Error::UserData);
        }
        meta[..meta_size as usize].copy_from_slice(buffer);
    }

    provider.commit_frame_buffer(meta_size)?;

    Ok((meta_size, data_size))
}
