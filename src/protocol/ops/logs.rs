//! Event and telemetry log downloads: a caller-built filter setup, a
//! queue-state poll, and the bulk transfer of the queued entries.
use crate::error::Error;
use crate::protocol::bulk::FrameBufferProvider;
use crate::protocol::messages::logs::{
    EventLogFilterTransferSetup, EventLogStatus, EventReadQueueState, TelemetryLogStatus,
    TelemetryLogTransferSetup, TlmLogReadQueueState,
};
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// Filling the read queue scans the log store.
const QUEUE_POLL_WINDOW_MS: u32 = 10_000;
const QUEUE_POLL_BACKOFF_MS: u32 = 100;

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Poll `EventLogStatus` until the read queue reaches `state`; the
    /// last-read status is left in `status`.
    pub async fn poll_event_state(
        &mut self,
        endpoint: &Endpoint,
        state: EventReadQueueState,
        backoff_ms: u32,
        timeout_ms: u32,
        status: &mut EventLogStatus,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            *status = self.get_event_log_status(endpoint).await?;

            if status.read_queue_state == state {
                return Ok(());
            }

            if waited >= timeout_ms {
                return Err(Error::Timeout);
            }

            self.delay_ms(backoff_ms).await;
            waited += backoff_ms;
        }
    }

    /// Download the events matching `setup` into the caller's buffers.
    pub async fn event_download<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        setup: &EventLogFilterTransferSetup,
        provider: &mut P,
        status: &mut EventLogStatus,
    ) -> Result<(), Error> {
        *status = EventLogStatus::default();

        self.set_event_log_filter_setup(endpoint, setup).await?;

        self.poll_event_state(
            endpoint,
            EventReadQueueState::QueueDownload,
            QUEUE_POLL_BACKOFF_MS,
            QUEUE_POLL_WINDOW_MS,
            status,
        )
        .await?;

        self.bulk_download(endpoint, provider).await
    }

    /// Poll `TelemetryLogStatus` until the read queue reaches `state`; the
    /// last-read status is left in `status`.
    pub async fn poll_tlm_state(
        &mut self,
        endpoint: &Endpoint,
        state: TlmLogReadQueueState,
        backoff_ms: u32,
        timeout_ms: u32,
        status: &mut TelemetryLogStatus,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            *status = self.get_telemetry_log_status(endpoint).await?;

            if status.read_queue_state == state {
                return Ok(());
            }

            if waited >= timeout_ms {
                return Err(Error::Timeout);
            }

            self.delay_ms(backoff_ms).await;
            waited += backoff_ms;
        }
    }

    /// Download the telemetry logs matching `setup` into the caller's
    /// buffers.
    pub async fn tlm_download<P: FrameBufferProvider>(
        &mut self,
        endpoint: &Endpoint,
        setup: &TelemetryLogTransferSetup,
        provider: &mut P,
        status: &mut TelemetryLogStatus,
    ) -> Result<(), Error> {
        *status = TelemetryLogStatus::default();

        self.set_telemetry_log_setup(endpoint, setup).await?;

        self.poll_tlm_state(
            endpoint,
            TlmLogReadQueueState::QueueDownload,
            QUEUE_POLL_BACKOFF_MS,
            QUEUE_POLL_WINDOW_MS,
            status,
        )
        .await?;

        self.bulk_download(endpoint, provider).await
    }
}
