//! Bootloader operations: state polling and CubeSpace file upload to a
//! product's bootloader.
use super::read_file_meta;
use crate::error::Error;
use crate::protocol::bulk::FrameBufferProvider;
use crate::protocol::messages::bootloader::{AppState, Errors};
use crate::protocol::messages::control_program::FTP_META_MAX;
use crate::protocol::transport::endpoint::{Endpoint, NodeType};
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// Backoff between bootloader state polls during upload setup.
const UPLOAD_POLL_BACKOFF_MS: u32 = 200;

/// Upload to internal flash requires up to 30 s to initialize.
const UPLOAD_POLL_WINDOW_MS: u32 = 30_000;

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Poll the bootloader `State` until it reaches `state` or reports an
    /// internal error. `error` is set whenever the device's `result` field
    /// is non-zero; the poll ends there so the caller can fetch `Errors`.
    pub async fn poll_bootloader_state(
        &mut self,
        endpoint: &Endpoint,
        state: AppState,
        backoff_ms: u32,
        timeout_ms: u32,
        error: &mut bool,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            let status = self.get_bootloader_state(endpoint).await?;

            *error = status.result != 0;

            if status.app_state == state || *error {
                return Ok(());
            }

            if waited >= timeout_ms {
                return Err(Error::Timeout);
            }

            self.delay_ms(backoff_ms).await;
            waited += backoff_ms;
        }
    }

    /// Upload a CubeSpace file of `size` bytes to a product bootloader.
    ///
    /// The meta block is peeked through the provider, handed to the device
    /// with `WriteFileSetup`, and the data portion follows over bulk
    /// transfer once the bootloader is waiting for frames. On a
    /// device-internal error the `errors` out-parameter holds the
    /// bootloader's error flags and the call fails with [`Error::Ftp`];
    /// after the upload the flags are re-read regardless of outcome.
    pub async fn bootloader_upload_cubespace_file<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        size: u32,
        provider: &mut P,
        errors: &mut Errors,
    ) -> Result<(), Error> {
        if endpoint.node_type == NodeType::Invalid {
            return Err(Error::NodeType);
        }

        *errors = Errors::default();

        let mut meta = [0u8; FTP_META_MAX];
        let (meta_size, data_size) = read_file_meta(provider, size, &mut meta)?;

        self.set_write_file_setup(endpoint, &meta[..meta_size as usize])
            .await?;

        let mut error = false;
        self.poll_bootloader_state(
            endpoint,
            AppState::BusyWaitFrame,
            UPLOAD_POLL_BACKOFF_MS,
            UPLOAD_POLL_WINDOW_MS,
            &mut error,
        )
        .await?;

        if error {
            // State requests succeeded but the device reports an internal
            // error; surface its reason to the caller.
            if let Ok(flags) = self.get_bootloader_errors(endpoint).await {
                *errors = flags;
            }
            return Err(Error::Ftp);
        }

        let result = self.bulk_upload(endpoint, provider, data_size).await;

        // Best-effort final read to capture anything the upload tripped.
        if let Ok(flags) = self.get_bootloader_errors(endpoint).await {
            *errors = flags;
        }

        result
    }
}
