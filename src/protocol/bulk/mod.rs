//! Bulk data transfer engine.
//!
//! Rides on the master transport with only four wire primitives: the
//! `TransferFrame` cursor telecommand, the `Frame` write and read, and the
//! `FrameInfo` telemetry. Transfers are windowless and polled: exactly one
//! frame is outstanding per session, numbered 0,1,2,… as a wrapping `u16`.
//!
//! Payload storage stays with the caller through [`FrameBufferProvider`],
//! so a transfer never requires the whole file in RAM.
use crate::error::Error;
use crate::protocol::messages::transfer::{Frame, BDT_MAX_FRAME_SIZE};
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// Device-side timeout between `TransferFrame` telecommands before the
/// product cancels the transfer. The engine bounds its retries to the same
/// window.
pub const BDT_TIMEOUT_MS: u32 = 1000;

/// Backoff before retrying `TransferFrame` after a busy NACK.
const SET_FRAME_BUSY_BACKOFF_MS: u32 = 5;

/// Backoff between `FrameInfo` polls.
const POLL_FRAME_BACKOFF_MS: u32 = 10;

//==================================================================================PROVIDER
/// Caller-supplied frame storage.
///
/// The engine asks for exactly one frame-sized buffer at a time. On
/// download it fills the buffer and then commits it; on upload it reads
/// the buffer, transfers it, and commits once the device has verified the
/// frame. Commit is the signal to advance the cursor or flush to
/// non-volatile storage.
///
/// Contract: `frame_buffer` returns a slice of exactly `size` bytes, and
/// repeated calls without an intervening `commit_frame_buffer` re-read the
/// same position. The file-upload helpers rely on that to peek at the meta
/// block before the main transfer.
pub trait FrameBufferProvider {
    /// Borrow the next frame buffer. The slice is only valid for one frame.
    fn frame_buffer(&mut self, size: u16) -> Result<&mut [u8], Error>;

    /// The previously borrowed buffer has been fully handled; reject with
    /// [`Error::Commit`] to abort the transfer.
    fn commit_frame_buffer(&mut self, size: u16) -> Result<(), Error>;
}

//==================================================================================CHECKSUM
/// Upload verification checksum: XOR over the frame bytes, seeded `0xFF`.
/// The wire calls this field `checkSum`; the algorithm is not a CRC and
/// must stay bit-exact for compatibility.
pub fn frame_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0xFF, |acc, byte| acc ^ byte)
}

/// The one non-local inference the engine makes: a `TransferFrame` attempt
/// that timed out followed by a busy or invalid-parameter NACK means the
/// device accepted the frame but its acknowledgement was lost, and the
/// frame is still being processed.
fn ack_lost_but_frame_set(previous: Option<Error>) -> bool {
    previous == Some(Error::Timeout)
}

//==================================================================================ENGINE
impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Issue `TransferFrame(frame_number)`, retrying transient failures
    /// within [`BDT_TIMEOUT_MS`] of the last successful set.
    async fn bdt_set_frame_number(
        &mut self,
        endpoint: &Endpoint,
        last_set_time: &mut u32,
        frame_number: u16,
    ) -> Result<(), Error> {
        let mut previous: Option<Error> = None;

        loop {
            match self.set_transfer_frame(endpoint, frame_number).await {
                Ok(()) => {
                    // Capture the time of the last successful set; the poll
                    // window is measured from here.
                    *last_set_time = self.now_ms();
                    return Ok(());
                }
                Err(error) => {
                    let window_elapsed =
                        self.now_ms().wrapping_sub(*last_set_time) > BDT_TIMEOUT_MS;

                    match error {
                        Error::Timeout => {
                            if window_elapsed {
                                return Err(error);
                            }
                            // Retry immediately.
                        }
                        Error::TctlmBusy => {
                            if ack_lost_but_frame_set(previous) {
                                return Ok(());
                            }
                            if window_elapsed {
                                return Err(error);
                            }
                            self.delay_ms(SET_FRAME_BUSY_BACKOFF_MS).await;
                        }
                        Error::TctlmInvalidParam => {
                            if ack_lost_but_frame_set(previous) {
                                return Ok(());
                            }
                            if window_elapsed {
                                return Err(error);
                            }
                            // Retry immediately.
                        }
                        other => return Err(other),
                    }

                    previous = Some(error);
                }
            }
        }
    }

    /// Poll `FrameInfo` until the device reports `frame_number` processed,
    /// flags a frame error, or the window elapses. Returns
    /// `(frame_last, frame_error)`.
    async fn bdt_poll_frame_number(
        &mut self,
        endpoint: &Endpoint,
        last_set_time: u32,
        frame_number: u16,
    ) -> Result<(bool, bool), Error> {
        loop {
            self.delay_ms(POLL_FRAME_BACKOFF_MS).await;

            let result = self.get_frame_info(endpoint).await;

            if let Ok(info) = result {
                if info.frame_error {
                    return Ok((info.frame_last, true));
                }
                if info.frame_number == frame_number {
                    return Ok((info.frame_last, false));
                }
            }

            if self.now_ms().wrapping_sub(last_set_time) > BDT_TIMEOUT_MS {
                return Err(result.err().unwrap_or(Error::Timeout));
            }
        }
    }

    /// Write one frame and verify the device-computed checksum.
    async fn bdt_send_frame_verified(
        &mut self,
        endpoint: &Endpoint,
        frame: &Frame,
    ) -> Result<(), Error> {
        self.set_frame(endpoint, frame).await?;

        let info = self.get_frame_info(endpoint).await?;

        if info.check_sum != frame_checksum(frame.bytes()) {
            return Err(Error::Crc);
        }

        Ok(())
    }

    //==============================================================================DOWNLOAD
    /// Download a transfer prepared by one of the operation helpers,
    /// frame by frame, into the caller's buffers.
    pub async fn bulk_download<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        provider: &mut P,
    ) -> Result<(), Error> {
        let mut last_set_time = self.now_ms();
        let mut frame_number: u16 = 0;

        loop {
            self.bdt_set_frame_number(endpoint, &mut last_set_time, frame_number)
                .await?;

            let (frame_last, frame_error) = self
                .bdt_poll_frame_number(endpoint, last_set_time, frame_number)
                .await?;

            if frame_error {
                return Err(Error::Frame);
            }

            // Fetch the frame payload, retrying within the window.
            let frame = loop {
                match self.get_frame(endpoint).await {
                    Ok(frame) => break frame,
                    Err(error) => {
                        if self.now_ms().wrapping_sub(last_set_time) > BDT_TIMEOUT_MS {
                            return Err(error);
                        }
                    }
                }
            };

            if frame.frame_size == 0 && !frame_last {
                // An empty non-final frame is never an expected condition.
                return Err(Error::Unknown);
            }

            if frame.frame_size > 0 {
                let size = frame.frame_size;
                let buffer = provider.frame_buffer(size)?;
                if buffer.len() != size as usize {
                    return Err(Error::UserData);
                }
                buffer.copy_from_slice(frame.bytes());

                provider.commit_frame_buffer(size)?;

                frame_number = frame_number.wrapping_add(1);
            }

            if frame_last {
                return Ok(());
            }
        }
    }

    //==============================================================================UPLOAD
    /// Upload `size` bytes from the caller's buffers to a device prepared
    /// by one of the operation helpers.
    pub async fn bulk_upload<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        provider: &mut P,
        size: u32,
    ) -> Result<(), Error> {
        let mut last_set_time = self.now_ms();
        let mut frame_number: u16 = 0;
        let mut remaining = size;

        while remaining > 0 {
            let frame_size = remaining.min(BDT_MAX_FRAME_SIZE as u32) as u16;

            let mut frame = Frame::new();
            frame.frame_size = frame_size;
            {
                let buffer = provider.frame_buffer(frame_size)?;
                if buffer.len() != frame_size as usize {
                    return Err(Error::UserData);
                }
                frame.frame_bytes[..frame_size as usize].copy_from_slice(buffer);
            }

            // Write the frame until the device's checksum matches, bounded
            // by the transfer window. A checksum mismatch is terminal.
            loop {
                match self.bdt_send_frame_verified(endpoint, &frame).await {
                    Ok(()) => break,
                    Err(Error::Crc) => return Err(Error::Crc),
                    Err(error) => {
                        if self.now_ms().wrapping_sub(last_set_time) > BDT_TIMEOUT_MS {
                            return Err(error);
                        }
                    }
                }
            }

            provider.commit_frame_buffer(frame_size)?;

            self.bdt_set_frame_number(endpoint, &mut last_set_time, frame_number)
                .await?;

            let (_, frame_error) = self
                .bdt_poll_frame_number(endpoint, last_set_time, frame_number)
                .await?;

            if frame_error {
                return Err(Error::Frame);
            }

            remaining -= frame_size as u32;
            frame_number = frame_number.wrapping_add(1);
        }

        Ok(())
    }
}
