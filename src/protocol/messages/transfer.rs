//! Bulk data transfer wire primitives: the frame cursor telecommand, the
//! frame payload in both directions, and the frame status telemetry.
use crate::error::Error;
use crate::infra::codec::traits::{FromPayload, ToPayload};
use crate::infra::codec::{Reader, Writer};
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};
use crate::protocol::transport::endpoint::Endpoint;

/// Maximum payload carried by one bulk transfer frame.
pub const BDT_MAX_FRAME_SIZE: usize = 256;

/// `TransferFrame` telecommand: advances the device-side frame cursor.
pub const TRANSFER_FRAME_ID: u8 = 8;
/// `Frame` telecommand: carries one upload frame to the device.
pub const FRAME_WRITE_ID: u8 = 9;
/// `FrameInfo` telemetry: progress of the current frame.
pub const FRAME_INFO_ID: u8 = 136;
/// `Frame` telemetry: carries one download frame from the device.
pub const FRAME_READ_ID: u8 = 137;

//==================================================================================FRAME_INFO
/// Device-side view of the frame selected by the last `TransferFrame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frame number the device has processed.
    pub frame_number: u16,
    /// This frame is the last one of the transfer.
    pub frame_last: bool,
    /// The device failed to process the frame.
    pub frame_error: bool,
    /// Checksum over the frame bytes the device holds.
    pub check_sum: u8,
}

impl FromPayload for FrameInfo {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            frame_number: reader.get_u16()?,
            frame_last: reader.get_bool()?,
            frame_error: reader.get_bool()?,
            check_sum: reader.get_u8()?,
        })
    }
}

//==================================================================================FRAME
/// One bulk transfer frame: a size followed by up to
/// [`BDT_MAX_FRAME_SIZE`] payload bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Number of valid payload bytes.
    pub frame_size: u16,
    /// Payload buffer.
    pub frame_bytes: [u8; BDT_MAX_FRAME_SIZE],
}

impl Frame {
    pub fn new() -> Self {
        Self {
            frame_size: 0,
            frame_bytes: [0; BDT_MAX_FRAME_SIZE],
        }
    }

    /// The valid payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.frame_bytes[..self.frame_size as usize]
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl ToPayload for Frame {
    fn to_payload(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        if self.frame_size as usize > BDT_MAX_FRAME_SIZE {
            return Err(Error::SizeHigh);
        }
        let mut writer = Writer::new(buffer);
        writer.put_u16(self.frame_size)?;
        writer.put_bytes(self.bytes())?;
        Ok(writer.len())
    }
}

impl FromPayload for Frame {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        let frame_size = reader.get_u16()?;
        if frame_size as usize > BDT_MAX_FRAME_SIZE {
            return Err(Error::SizeHigh);
        }
        let mut frame = Frame::new();
        frame.frame_size = frame_size;
        reader.get_bytes(&mut frame.frame_bytes[..frame_size as usize])?;
        Ok(frame)
    }
}

//==================================================================================WRAPPERS
impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Set the device-side frame cursor.
    pub async fn set_transfer_frame(
        &mut self,
        endpoint: &Endpoint,
        frame_number: u16,
    ) -> Result<(), Error> {
        let request = frame_number.to_le_bytes();
        self.send_receive(endpoint, TRANSFER_FRAME_ID, &request)
            .await?;
        Ok(())
    }

    /// Write one upload frame to the device.
    pub async fn set_frame(&mut self, endpoint: &Endpoint, frame: &Frame) -> Result<(), Error> {
        let mut request = [0u8; 2 + BDT_MAX_FRAME_SIZE];
        let len = frame.to_payload(&mut request)?;
        self.send_receive(endpoint, FRAME_WRITE_ID, &request[..len])
            .await?;
        Ok(())
    }

    /// Read the progress of the current frame.
    pub async fn get_frame_info(&mut self, endpoint: &Endpoint) -> Result<FrameInfo, Error> {
        let response = self.send_receive(endpoint, FRAME_INFO_ID, &[]).await?;
        FrameInfo::from_payload(response)
    }

    /// Read one download frame from the device.
    pub async fn get_frame(&mut self, endpoint: &Endpoint) -> Result<Frame, Error> {
        let response = self.send_receive(endpoint, FRAME_READ_ID, &[]).await?;
        Frame::from_payload(response)
    }
}
