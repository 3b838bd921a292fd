//! Image operations: capture-and-store, direct and stored downloads, and
//! the stored-image catalogue walk.
use crate::error::Error;
use crate::protocol::bulk::FrameBufferProvider;
use crate::protocol::messages::image::{
    AbstractNode, ImageFileInfo, ImageOpCode, ImageTransferSetup, ImageTransferState,
    ImageTransferStatus,
};
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// Confirmation that a requested transfer actually started.
const START_POLL_WINDOW_MS: u32 = 5000;

/// A store writes the full image to flash and may run for minutes.
const STORE_POLL_WINDOW_MS: u32 = 120_000;

/// Catalogue entries are produced asynchronously; each read backs off and
/// tolerates a bounded number of busy NACKs.
const INFO_RETRY_BACKOFF_MS: u32 = 50;
const INFO_RETRY_COUNT: u32 = 10;

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Poll `ImageTransferStatus` until its `state` matches or the device
    /// reports an internal error; the last-read status is left in `status`.
    pub async fn poll_image_state(
        &mut self,
        endpoint: &Endpoint,
        state: ImageTransferState,
        backoff_ms: u32,
        timeout_ms: u32,
        status: &mut ImageTransferStatus,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            *status = self.get_image_transfer_status(endpoint).await?;

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

    /// Capture an image on `node_type` and store it on the CubeComputer.
    ///
    /// Confirms the store started, then waits for it to complete. On a
    /// device-internal error the call fails with [`Error::Img`] and
    /// `status` holds the device's reason.
    pub async fn image_capture_store(
        &mut self,
        endpoint: &Endpoint,
        node_type: AbstractNode,
        status: &mut ImageTransferStatus,
    ) -> Result<(), Error> {
        *status = ImageTransferStatus::default();

        let mut setup = ImageTransferSetup::default();
        setup.op_code = ImageOpCode::CaptureStore;
        setup.node_type = node_type;

        self.set_image_transfer_setup(endpoint, &setup).await?;

        // Check that the store has started before settling in for it.
        self.poll_image_state(
            endpoint,
            ImageTransferState::BusyStore,
            10,
            START_POLL_WINDOW_MS,
            status,
        )
        .await?;

        if status.error_code != 0 {
            return Err(Error::Img);
        }

        self.poll_image_state(
            endpoint,
            ImageTransferState::Idle,
            50,
            STORE_POLL_WINDOW_MS,
            status,
        )
        .await?;

        if status.error_code != 0 {
            return Err(Error::Img);
        }

        Ok(())
    }

    /// Capture an image on `node_type` and stream it straight into the
    /// caller's buffers.
    pub async fn image_download_direct<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        node_type: AbstractNode,
        provider: &mut P,
        status: &mut ImageTransferStatus,
    ) -> Result<(), Error> {
        *status = ImageTransferStatus::default();

        let mut setup = ImageTransferSetup::default();
        setup.op_code = ImageOpCode::CaptureDownload;
        setup.node_type = node_type;

        self.image_download(endpoint, &setup, provider, status).await
    }

    /// Stream a stored image identified by `file_handle` into the caller's
    /// buffers.
    pub async fn image_download_stored<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        file_handle: u32,
        provider: &mut P,
        status: &mut ImageTransferStatus,
    ) -> Result<(), Error> {
        *status = ImageTransferStatus::default();

        let mut setup = ImageTransferSetup::default();
        setup.op_code = ImageOpCode::Download;
        setup.file_handle = file_handle;

        self.image_download(endpoint, &setup, provider, status).await
    }

    async fn image_download<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        setup: &ImageTransferSetup,
        provider: &mut P,
        status: &mut ImageTransferStatus,
    ) -> Result<(), Error> {
        self.set_image_transfer_setup(endpoint, setup).await?;

        self.poll_image_state(
            endpoint,
            ImageTransferState::BusyDownload,
            50,
            START_POLL_WINDOW_MS,
            status,
        )
        .await?;

        if status.error_code != 0 {
            return Err(Error::Img);
        }

        let result = self.bulk_download(endpoint, provider).await;

        // Best-effort final read to capture anything the download tripped.
        if let Ok(final_status) = self.get_image_transfer_status(endpoint).await {
            *status = final_status;
        }

        result
    }

    /// Walk the stored-image catalogue and return its first and last
    /// entries. Either stays at its default when the catalogue is empty.
    pub async fn image_info_first_last(
        &mut self,
        endpoint: &Endpoint,
        first_info: &mut ImageFileInfo,
        last_info: &mut ImageFileInfo,
    ) -> Result<(), Error> {
        *first_info = ImageFileInfo::default();
        *last_info = ImageFileInfo::default();

        self.image_info_reset(endpoint).await?;

        loop {
            let info = self.image_next_file_info(endpoint).await?;

            if !info.is_valid {
                return Ok(());
            }

            if info.first {
                *first_info = info;
            }

            if info.last {
                *last_info = info;
                return Ok(());
            }
        }
    }

    /// Walk the stored-image catalogue for the entry matching
    /// `file_handle`; [`Error::Exist`] when no such image is stored.
    pub async fn image_info(
        &mut self,
        endpoint: &Endpoint,
        file_handle: u32,
        info: &mut ImageFileInfo,
    ) -> Result<(), Error> {
        *info = ImageFileInfo::default();

        self.image_info_reset(endpoint).await?;

        loop {
            let entry = self.image_next_file_info(endpoint).await?;

            if !entry.is_valid {
                return Err(Error::Exist);
            }

            if entry.file_handle == file_handle {
                *info = entry;
                return Ok(());
            }

            if entry.last {
                return Err(Error::Exist);
            }
        }
    }

    async fn image_info_reset(&mut self, endpoint: &Endpoint) -> Result<(), Error> {
        let mut setup = ImageTransferSetup::default();
        setup.op_code = ImageOpCode::InfoReset;
        self.set_image_transfer_setup(endpoint, &setup).await
    }

    /// Wait for the info of the next file to be populated.
    async fn image_next_file_info(&mut self, endpoint: &Endpoint) -> Result<ImageFileInfo, Error> {
        let mut retry = INFO_RETRY_COUNT;

        loop {
            self.delay_ms(INFO_RETRY_BACKOFF_MS).await;

            match self.get_image_file_info(endpoint).await {
                Err(Error::TctlmBusy) if retry > 1 => retry -= 1,
                other => return other,
            }
        }
    }
}
