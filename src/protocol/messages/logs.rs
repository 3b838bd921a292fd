//! Event and telemetry log messages: filtered download setups and the
//! read-queue status telemetries.
use super::wire_enum;
use crate::error::Error;
use crate::infra::codec::traits::{FromPayload, ToPayload};
use crate::infra::codec::{Reader, Writer};
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// `EventLogFilterTransferSetup` telecommand.
pub const EVENT_LOG_FILTER_SETUP_ID: u8 = 51;
/// `EventLogStatus` telemetry.
pub const EVENT_LOG_STATUS_ID: u8 = 180;
/// `TelemetryLogTransferSetup` telecommand.
pub const TLM_LOG_SETUP_ID: u8 = 52;
/// `TelemetryLogStatus` telemetry.
pub const TLM_LOG_STATUS_ID: u8 = 181;

/// Width of the telemetry log id bitmask in bytes.
pub const TLM_LOG_ID_BITMASK_BYTES: usize = 16;

wire_enum! {
    /// Event log read-queue state.
    pub enum EventReadQueueState {
        Idle = 0,
        QueueBusy = 1,
        /// The queue is filled and ready for bulk download.
        QueueDownload = 2,
    }
}

wire_enum! {
    /// Telemetry log read-queue state.
    pub enum TlmLogReadQueueState {
        Idle = 0,
        QueueBusy = 1,
        /// The queue is filled and ready for bulk download.
        QueueDownload = 2,
    }
}

//==================================================================================EVENT_LOG
/// Filter describing which events to queue for download.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogFilterTransferSetup {
    /// Oldest event timestamp to include, seconds.
    pub start_time: u32,
    /// Newest event timestamp to include, seconds; zero for no bound.
    pub stop_time: u32,
    /// Severity classes to include.
    pub severity_bitmask: u8,
}

impl ToPayload for EventLogFilterTransferSetup {
    fn to_payload(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let mut writer = Writer::new(buffer);
        writer.put_u32(self.start_time)?;
        writer.put_u32(self.stop_time)?;
        writer.put_u8(self.severity_bitmask)?;
        Ok(writer.len())
    }
}

/// Event log status telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLogStatus {
    pub read_queue_state: EventReadQueueState,
    /// Entries currently queued for download.
    pub queue_length: u16,
}

impl Default for EventLogStatus {
    fn default() -> Self {
        Self {
            read_queue_state: EventReadQueueState::Idle,
            queue_length: 0,
        }
    }
}

impl FromPayload for EventLogStatus {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            read_queue_state: EventReadQueueState::from_raw(reader.get_u8()?)
                .ok_or(Error::Param)?,
            queue_length: reader.get_u16()?,
        })
    }
}

//==================================================================================TLM_LOG
/// Filter describing which telemetry logs to queue for download.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryLogTransferSetup {
    /// Oldest sample timestamp to include, seconds.
    pub start_time: u32,
    /// Newest sample timestamp to include, seconds; zero for no bound.
    pub stop_time: u32,
    /// One bit per log id; see [`Self::include_log_id`].
    pub log_id_bitmask: [u8; TLM_LOG_ID_BITMASK_BYTES],
}

impl Default for TelemetryLogTransferSetup {
    fn default() -> Self {
        Self {
            start_time: 0,
            stop_time: 0,
            log_id_bitmask: [0; TLM_LOG_ID_BITMASK_BYTES],
        }
    }
}

impl TelemetryLogTransferSetup {
    /// Mark a log id for inclusion in the download.
    pub fn include_log_id(&mut self, log_id: u8) -> Result<(), Error> {
        let index = (log_id / 8) as usize;
        let mask = 1u8 << (log_id % 8);

        if index >= self.log_id_bitmask.len() {
            return Err(Error::Param);
        }

        self.log_id_bitmask[index] |= mask;
        Ok(())
    }
}

impl ToPayload for TelemetryLogTransferSetup {
    fn to_payload(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let mut writer = Writer::new(buffer);
        writer.put_u32(self.start_time)?;
        writer.put_u32(self.stop_time)?;
        writer.put_bytes(&self.log_id_bitmask)?;
        Ok(writer.len())
    }
}

/// Telemetry log status telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryLogStatus {
    pub read_queue_state: TlmLogReadQueueState,
    /// Entries currently queued for download.
    pub queue_length: u16,
}

impl Default for TelemetryLogStatus {
    fn default() -> Self {
        Self {
            read_queue_state: TlmLogReadQueueState::Idle,
            queue_length: 0,
        }
    }
}

impl FromPayload for TelemetryLogStatus {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            read_queue_state: TlmLogReadQueueState::from_raw(reader.get_u8()?)
                .ok_or(Error::Param)?,
            queue_length: reader.get_u16()?,
        })
    }
}

//==================================================================================WRAPPERS
impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Configure the event queue for a filtered download.
    pub async fn set_event_log_filter_setup(
        &mut self,
        endpoint: &Endpoint,
        setup: &EventLogFilterTransferSetup,
    ) -> Result<(), Error> {
        let mut request = [0u8; 12];
        let len = setup.to_payload(&mut request)?;
        self.send_receive(endpoint, EVENT_LOG_FILTER_SETUP_ID, &request[..len])
            .await?;
        Ok(())
    }

    /// Read the event log status.
    pub async fn get_event_log_status(
        &mut self,
        endpoint: &Endpoint,
    ) -> Result<EventLogStatus, Error> {
        let response = self.send_receive(endpoint, EVENT_LOG_STATUS_ID, &[]).await?;
        EventLogStatus::from_payload(response)
    }

    /// Configure the telemetry log queue for a filtered download.
    pub async fn set_telemetry_log_setup(
        &mut self,
        endpoint: &Endpoint,
        setup: &TelemetryLogTransferSetup,
    ) -> Result<(), Error> {
        let mut request = [0u8; 12 + TLM_LOG_ID_BITMASK_BYTES];
        let len = setup.to_payload(&mut request)?;
        self.send_receive(endpoint, TLM_LOG_SETUP_ID, &request[..len])
            .await?;
        Ok(())
    }

    /// Read the telemetry log status.
    pub async fn get_telemetry_log_status(
        &mut self,
        endpoint: &Endpoint,
    ) -> Result<TelemetryLogStatus, Error> {
        let response = self.send_receive(endpoint, TLM_LOG_STATUS_ID, &[]).await?;
        TelemetryLogStatus::from_payload(response)
    }
}
