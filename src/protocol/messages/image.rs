//! Image transfer messages: capture/download setup, transfer status, and
//! the stored-image catalogue walk.
use super::wire_enum;
use crate::error::Error;
use crate::infra::codec::traits::{FromPayload, ToPayload};
use crate::infra::codec::{Reader, Writer};
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// `ImageTransferSetup` telecommand.
pub const IMAGE_TRANSFER_SETUP_ID: u8 = 50;
/// `ImageTransferStatus` telemetry.
pub const IMAGE_TRANSFER_STATUS_ID: u8 = 178;
/// `ImageFileInfo` telemetry.
pub const IMAGE_FILE_INFO_ID: u8 = 179;

wire_enum! {
    /// What the image transfer setup asks the device to do.
    pub enum ImageOpCode {
        None = 0,
        /// Capture an image and store it.
        CaptureStore = 1,
        /// Capture an image and stream it directly.
        CaptureDownload = 2,
        /// Stream a stored image.
        Download = 3,
        /// Restart the stored-image catalogue walk.
        InfoReset = 4,
    }
}

wire_enum! {
    /// Image transfer engine state.
    pub enum ImageTransferState {
        Idle = 0,
        BusyCapture = 1,
        BusyStore = 2,
        BusyDownload = 3,
    }
}

wire_enum! {
    /// Optical sensor behind the node an image operation targets.
    pub enum AbstractNode {
        None = 0,
        CubeSenseCam1 = 1,
        CubeSenseCam2 = 2,
        CubeStarCam = 3,
    }
}

//==================================================================================SETUP
/// Image transfer setup telecommand.
#[derive(Debug, Clone, Copy)]
pub struct ImageTransferSetup {
    pub op_code: ImageOpCode,
    /// Sensor a capture targets.
    pub node_type: AbstractNode,
    /// Stored image a download targets.
    pub file_handle: u32,
}

impl Default for ImageTransferSetup {
    fn default() -> Self {
        Self {
            op_code: ImageOpCode::None,
            node_type: AbstractNode::None,
            file_handle: 0,
        }
    }
}

impl ToPayload for ImageTransferSetup {
    fn to_payload(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let mut writer = Writer::new(buffer);
        writer.put_u8(self.op_code.into())?;
        writer.put_u8(self.node_type.into())?;
        writer.put_u32(self.file_handle)?;
        Ok(writer.len())
    }
}

//==================================================================================STATUS
/// Image transfer status telemetry; `error_code` carries the device's
/// internal error, zero when healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransferStatus {
    pub state: ImageTransferState,
    pub error_code: i32,
    pub size_bytes: u32,
}

impl Default for ImageTransferStatus {
    fn default() -> Self {
        Self {
            state: ImageTransferState::Idle,
            error_code: 0,
            size_bytes: 0,
        }
    }
}

impl FromPayload for ImageTransferStatus {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            state: ImageTransferState::from_raw(reader.get_u8()?).ok_or(Error::Param)?,
            error_code: reader.get_i32()?,
            size_bytes: reader.get_u32()?,
        })
    }
}

/// One entry of the stored-image catalogue walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageFileInfo {
    pub file_handle: u32,
    pub size: u32,
    pub capture_time: u32,
    /// The entry describes an existing image.
    pub is_valid: bool,
    /// First entry of the walk.
    pub first: bool,
    /// Last entry of the walk.
    pub last: bool,
}

impl FromPayload for ImageFileInfo {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            file_handle: reader.get_u32()?,
            size: reader.get_u32()?,
            capture_time: reader.get_u32()?,
            is_valid: reader.get_bool()?,
            first: reader.get_bool()?,
            last: reader.get_bool()?,
        })
    }
}

//==================================================================================WRAPPERS
impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Configure the next image transfer operation.
    pub async fn set_image_transfer_setup(
        &mut self,
        endpoint: &Endpoint,
        setup: &ImageTransferSetup,
    ) -> Result<(), Error> {
        let mut request = [0u8; 8];
        let len = setup.to_payload(&mut request)?;
        self.send_receive(endpoint, IMAGE_TRANSFER_SETUP_ID, &request[..len])
            .await?;
        Ok(())
    }

    /// Read the image transfer status.
    pub async fn get_image_transfer_status(
        &mut self,
        endpoint: &Endpoint,
    ) -> Result<ImageTransferStatus, Error> {
        let response = self
            .send_receive(endpoint, IMAGE_TRANSFER_STATUS_ID, &[])
            .await?;
        ImageTransferStatus::from_payload(response)
    }

    /// Read the next stored-image catalogue entry.
    pub async fn get_image_file_info(
        &mut self,
        endpoint: &Endpoint,
    ) -> Result<ImageFileInfo, Error> {
        let response = self.send_receive(endpoint, IMAGE_FILE_INFO_ID, &[]).await?;
        ImageFileInfo::from_payload(response)
    }
}
