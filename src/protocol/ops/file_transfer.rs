//! CubeComputer control-program file operations: CubeSpace file upload,
//! node upgrades, and the stored-file catalogue.
use super::read_file_meta;
use crate::error::Error;
use crate::protocol::bulk::FrameBufferProvider;
use crate::protocol::messages::control_program::{
    FileInfo, FileTransferSetup, FileTransferStatus, FtpFile, FtpOpCode, FtpState,
    FtpUpgradeState, NodePort, ProgramType, FTP_META_MAX,
};
use crate::protocol::transport::endpoint::{Endpoint, NodeType};
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// CubeComputer upload to external storage requires up to 1 s to
/// initialize.
const UPLOAD_POLL_WINDOW_MS: u32 = 1000;
const UPLOAD_POLL_BACKOFF_MS: u32 = 50;

/// Upgrades reflash a node and may run for minutes.
const UPGRADE_POLL_WINDOW_MS: u32 = 120_000;
const UPGRADE_POLL_BACKOFF_MS: u32 = 500;

const INFO_POLL_WINDOW_MS: u32 = 3000;
const INFO_POLL_BACKOFF_MS: u32 = 50;

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Poll `FileTransferStatus` until its `state` matches or the device
    /// reports an internal error; the last-read status is left in `status`.
    pub async fn poll_ftp_state(
        &mut self,
        endpoint: &Endpoint,
        state: FtpState,
        backoff_ms: u32,
        timeout_ms: u32,
        status: &mut FileTransferStatus,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            *status = self.get_file_transfer_status(endpoint).await?;

            if status.state == state || status.error_code != 0 {
                return Ok(());
            }

            if waited >= timeout_ms {
                return Err(Error::Timeout);
            }

            self.delay_ms(backoff_ms).await;
            waited += backoff_ms;
        }
    }

    /// Same poll against the upgrade sub-state.
    pub async fn poll_ftp_upgrade_state(
        &mut self,
        endpoint: &Endpoint,
        state: FtpUpgradeState,
        backoff_ms: u32,
        timeout_ms: u32,
        status: &mut FileTransferStatus,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            *status = self.get_file_transfer_status(endpoint).await?;

            if status.upgrade_state == state || status.error_code != 0 {
                return Ok(());
            }

            if waited >= timeout_ms {
                return Err(Error::Timeout);
            }

            self.delay_ms(backoff_ms).await;
            waited += backoff_ms;
        }
    }

    /// Upload a CubeSpace file of `size` bytes to the CubeComputer
    /// control-program's file store.
    ///
    /// Mirrors the bootloader upload, but the meta block travels inside a
    /// `FileTransferSetup` and progress is reported through
    /// `FileTransferStatus`. On a device-internal error the call fails
    /// with [`Error::Ftp`] and `status` holds the device's reason.
    pub async fn upload_cubespace_file<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        size: u32,
        provider: &mut P,
        status: &mut FileTransferStatus,
    ) -> Result<(), Error> {
        if endpoint.node_type == NodeType::Invalid {
            return Err(Error::NodeType);
        }

        *status = FileTransferStatus::default();

        let mut meta = [0u8; FTP_META_MAX];
        let (meta_size, data_size) = read_file_meta(provider, size, &mut meta)?;

        let mut setup = FileTransferSetup::default();
        setup.op_code = FtpOpCode::Upload;
        setup.set_meta_data(&meta[..meta_size as usize])?;

        self.set_file_transfer_setup(endpoint, &setup).await?;

        self.poll_ftp_state(
            endpoint,
            FtpState::Busy,
            UPLOAD_POLL_BACKOFF_MS,
            UPLOAD_POLL_WINDOW_MS,
            status,
        )
        .await?;

        if status.error_code != 0 {
            return Err(Error::Ftp);
        }

        let result = self.bulk_upload(endpoint, provider, data_size).await;

        // Best-effort final read to capture anything the upload tripped.
        if let Ok(final_status) = self.get_file_transfer_status(endpoint).await {
            *status = final_status;
        }

        result
    }

    /// Upgrade the CubeComputer itself or a node behind it from a
    /// previously uploaded CubeSpace file.
    ///
    /// Only valid against a CubeComputer endpoint. A forced port is only
    /// legal for node bootloader upgrades: once a node bootloader is
    /// programmed, auto-discovery finds it and the force port is not
    /// required.
    pub async fn upgrade(
        &mut self,
        endpoint: &Endpoint,
        node: NodeType,
        serial_int: u32,
        program: ProgramType,
        force_port: NodePort,
        status: &mut FileTransferStatus,
    ) -> Result<(), Error> {
        if endpoint.node_type == NodeType::Invalid {
            return Err(Error::NodeType);
        }

        // Stand-alone products upgrade through their bootloader instead.
        if endpoint.node_type != NodeType::CubeComputer {
            return Err(Error::NodeType);
        }

        if force_port != NodePort::None {
            if node == NodeType::CubeComputer {
                return Err(Error::Usage);
            }
            if program != ProgramType::Bootloader {
                return Err(Error::Usage);
            }
        }

        *status = FileTransferStatus::default();

        let mut setup = FileTransferSetup::default();
        setup.op_code = FtpOpCode::Upgrade;
        setup.node = node;
        setup.serial_int = serial_int;
        setup.program = program;
        setup.force_port = force_port;

        self.set_file_transfer_setup(endpoint, &setup).await?;

        self.poll_ftp_upgrade_state(
            endpoint,
            FtpUpgradeState::UpgradeIdle,
            UPGRADE_POLL_BACKOFF_MS,
            UPGRADE_POLL_WINDOW_MS,
            status,
        )
        .await?;

        if status.error_code != 0 {
            return Err(Error::Ftp);
        }

        Ok(())
    }

    /// Read the catalogue entry for one stored file.
    pub async fn file_info(
        &mut self,
        endpoint: &Endpoint,
        file: FtpFile,
        info: &mut FileInfo,
        status: &mut FileTransferStatus,
    ) -> Result<(), Error> {
        *status = FileTransferStatus::default();
        *info = FileInfo::default();

        let mut setup = FileTransferSetup::default();
        setup.op_code = FtpOpCode::Info;
        setup.file = file;

        self.set_file_transfer_setup(endpoint, &setup).await?;

        self.poll_ftp_state(
            endpoint,
            FtpState::Idle,
            INFO_POLL_BACKOFF_MS,
            INFO_POLL_WINDOW_MS,
            status,
        )
        .await?;

        if status.error_code != 0 {
            return Err(Error::Ftp);
        }

        *info = self.get_file_info(endpoint).await?;

        Ok(())
    }
}
