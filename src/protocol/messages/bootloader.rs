//! Bootloader messages: file-write setup, application state, and the
//! error flags telemetry.
use super::wire_enum;
use crate::error::Error;
use crate::infra::codec::traits::FromPayload;
use crate::infra::codec::Reader;
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// `WriteFileSetup` telecommand: the CubeSpace file meta block.
pub const WRITE_FILE_SETUP_ID: u8 = 20;
/// `State` telemetry.
pub const STATE_ID: u8 = 148;
/// `Errors` telemetry.
pub const ERRORS_ID: u8 = 149;

wire_enum! {
    /// Bootloader application state machine.
    pub enum AppState {
        Invalid = 0,
        Idle = 1,
        /// Preparing target flash for the incoming file.
        BusyInit = 2,
        /// Ready to accept the next bulk transfer frame.
        BusyWaitFrame = 3,
        /// Writing the received frame.
        BusyProcessFrame = 4,
        Done = 5,
    }
}

/// Bootloader state telemetry; `result` carries the device's internal
/// error code, zero when healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub app_state: AppState,
    pub result: i32,
}

impl FromPayload for State {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            app_state: AppState::from_raw(reader.get_u8()?).ok_or(Error::Param)?,
            result: reader.get_i32()?,
        })
    }
}

/// Bootloader error flags, populated when `State::result` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Errors {
    /// The file CRC did not verify.
    pub file_crc: bool,
    /// The file meta block was malformed.
    pub file_format: bool,
    /// A flash write or erase failed.
    pub flash_write: bool,
    /// Frames arrived out of sequence.
    pub sequence: bool,
}

impl FromPayload for Errors {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            file_crc: reader.get_bool()?,
            file_format: reader.get_bool()?,
            flash_write: reader.get_bool()?,
            sequence: reader.get_bool()?,
        })
    }
}

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Hand the CubeSpace file meta block to the bootloader.
    pub async fn set_write_file_setup(
        &mut self,
        endpoint: &Endpoint,
        meta: &[u8],
    ) -> Result<(), Error> {
        self.send_receive(endpoint, WRITE_FILE_SETUP_ID, meta).await?;
        Ok(())
    }

    /// Read the bootloader state.
    pub async fn get_bootloader_state(&mut self, endpoint: &Endpoint) -> Result<State, Error> {
        let response = self.send_receive(endpoint, STATE_ID, &[]).await?;
        State::from_payload(response)
    }

    /// Read the bootloader error flags.
    pub async fn get_bootloader_errors(&mut self, endpoint: &Endpoint) -> Result<Errors, Error> {
        let response = self.send_receive(endpoint, ERRORS_ID, &[]).await?;
        Errors::from_payload(response)
    }
}
