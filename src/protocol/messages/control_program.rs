//! Control-program file transfer messages: setup, status, and the stored
//! file catalogue.
use super::wire_enum;
use crate::error::Error;
use crate::infra::codec::traits::{FromPayload, ToPayload};
use crate::infra::codec::{Reader, Writer};
use crate::protocol::transport::endpoint::{Endpoint, NodeType};
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// `FileTransferSetup` telecommand.
pub const FILE_TRANSFER_SETUP_ID: u8 = 40;
/// `FileTransferStatus` telemetry.
pub const FILE_TRANSFER_STATUS_ID: u8 = 168;
/// `FileInfo` telemetry.
pub const FILE_INFO_ID: u8 = 169;

/// Largest meta block a `FileTransferSetup` can carry.
pub const FTP_META_MAX: usize = 256;

wire_enum! {
    /// What the file transfer setup asks the device to do.
    pub enum FtpOpCode {
        None = 0,
        Upload = 1,
        Upgrade = 2,
        Info = 3,
    }
}

wire_enum! {
    /// File transfer engine state.
    pub enum FtpState {
        Idle = 0,
        Busy = 1,
        Error = 2,
    }
}

wire_enum! {
    /// Upgrade sub-state of the file transfer engine.
    pub enum FtpUpgradeState {
        UpgradeIdle = 0,
        UpgradePending = 1,
        UpgradeBusy = 2,
        UpgradeError = 3,
    }
}

wire_enum! {
    /// Physical port a node upgrade can be forced onto.
    pub enum NodePort {
        None = 0,
        Port1 = 1,
        Port2 = 2,
        Port3 = 3,
        Port4 = 4,
    }
}

wire_enum! {
    /// Which program of a node an upgrade targets.
    pub enum ProgramType {
        Invalid = 0,
        Bootloader = 1,
        ControlProgram = 2,
    }
}

wire_enum! {
    /// Stored file selector.
    pub enum FtpFile {
        None = 0,
        ControlProgram = 1,
        Configuration = 2,
    }
}

//==================================================================================SETUP
/// File transfer setup telecommand. Fields irrelevant to the selected
/// `op_code` stay at their defaults.
#[derive(Debug, Clone, Copy)]
pub struct FileTransferSetup {
    pub op_code: FtpOpCode,
    /// Node an upgrade targets.
    pub node: NodeType,
    /// Program of the node an upgrade targets.
    pub program: ProgramType,
    /// Force the upgrade onto a specific port, `None` for auto-discovery.
    pub force_port: NodePort,
    /// Stored file an info request targets.
    pub file: FtpFile,
    /// Serial interface integer of the target node.
    pub serial_int: u32,
    meta_len: u16,
    meta: [u8; FTP_META_MAX],
}

impl Default for FileTransferSetup {
    fn default() -> Self {
        Self {
            op_code: FtpOpCode::None,
            node: NodeType::Invalid,
            program: ProgramType::Invalid,
            force_port: NodePort::None,
            file: FtpFile::None,
            serial_int: 0,
            meta_len: 0,
            meta: [0; FTP_META_MAX],
        }
    }
}

impl FileTransferSetup {
    /// Attach the CubeSpace file meta block to an upload setup.
    pub fn set_meta_data(&mut self, meta: &[u8]) -> Result<(), Error> {
        if meta.len() > FTP_META_MAX {
            return Err(Error::SizeHigh);
        }
        self.meta[..meta.len()].copy_from_slice(meta);
        self.meta_len = meta.len() as u16;
        Ok(())
    }

    /// The attached meta block.
    pub fn meta_data(&self) -> &[u8] {
        &self.meta[..self.meta_len as usize]
    }
}

impl ToPayload for FileTransferSetup {
    fn to_payload(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let mut writer = Writer::new(buffer);
        writer.put_u8(self.op_code.into())?;
        writer.put_u8(self.node as u8)?;
        writer.put_u8(self.program.into())?;
        writer.put_u8(self.force_port.into())?;
        writer.put_u8(self.file.into())?;
        writer.put_u32(self.serial_int)?;
        writer.put_u16(self.meta_len)?;
        writer.put_bytes(self.meta_data())?;
        Ok(writer.len())
    }
}

//==================================================================================STATUS
/// File transfer status telemetry; `error_code` carries the device's
/// internal error, zero when healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTransferStatus {
    pub state: FtpState,
    pub upgrade_state: FtpUpgradeState,
    pub error_code: i32,
    pub bytes_transferred: u32,
}

impl Default for FileTransferStatus {
    fn default() -> Self {
        Self {
            state: FtpState::Idle,
            upgrade_state: FtpUpgradeState::UpgradeIdle,
            error_code: 0,
            bytes_transferred: 0,
        }
    }
}

impl FromPayload for FileTransferStatus {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            state: FtpState::from_raw(reader.get_u8()?).ok_or(Error::Param)?,
            upgrade_state: FtpUpgradeState::from_raw(reader.get_u8()?).ok_or(Error::Param)?,
            error_code: reader.get_i32()?,
            bytes_transferred: reader.get_u32()?,
        })
    }
}

/// Catalogue entry for one stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub file: FtpFile,
    pub size: u32,
    pub crc: u16,
}

impl Default for FileInfo {
    fn default() -> Self {
        Self {
            file: FtpFile::None,
            size: 0,
            crc: 0,
        }
    }
}

impl FromPayload for FileInfo {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            file: FtpFile::from_raw(reader.get_u8()?).ok_or(Error::Param)?,
            size: reader.get_u32()?,
            crc: reader.get_u16()?,
        })
    }
}

//==================================================================================WRAPPERS
impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Configure the next file transfer operation.
    pub async fn set_file_transfer_setup(
        &mut self,
        endpoint: &Endpoint,
        setup: &FileTransferSetup,
    ) -> Result<(), Error> {
        let mut request = [0u8; 16 + FTP_META_MAX];
        let len = setup.to_payload(&mut request)?;
        self.send_receive(endpoint, FILE_TRANSFER_SETUP_ID, &request[..len])
            .await?;
        Ok(())
    }

    /// Read the file transfer status.
    pub async fn get_file_transfer_status(
        &mut self,
        endpoint: &Endpoint,
    ) -> Result<FileTransferStatus, Error> {
        let response = self
            .send_receive(endpoint, FILE_TRANSFER_STATUS_ID, &[])
            .await?;
        FileTransferStatus::from_payload(response)
    }

    /// Read the catalogue entry selected by the last info setup.
    pub async fn get_file_info(&mut self, endpoint: &Endpoint) -> Result<FileInfo, Error> {
        let response = self.send_receive(endpoint, FILE_INFO_ID, &[]).await?;
        FileInfo::from_payload(response)
    }
}
