//! Common framework telemetry shared by every CubeSpace product.
use super::wire_enum;
use crate::error::Error;
use crate::infra::codec::traits::FromPayload;
use crate::infra::codec::Reader;
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

/// `BootStatus` telemetry.
pub const BOOT_STATUS_ID: u8 = 133;

wire_enum! {
    /// Which program the node is currently running.
    pub enum BootState {
        Invalid = 0,
        Bootloader = 1,
        Application = 2,
    }
}

/// Boot status of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootStatus {
    pub state: BootState,
    /// Number of boots since the counter was last cleared.
    pub boot_count: u16,
}

impl FromPayload for BootStatus {
    fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            state: BootState::from_raw(reader.get_u8()?).ok_or(Error::Param)?,
            boot_count: reader.get_u16()?,
        })
    }
}

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Read the node's boot status.
    pub async fn get_boot_status(&mut self, endpoint: &Endpoint) -> Result<BootStatus, Error> {
        let response = self.send_receive(endpoint, BOOT_STATUS_ID, &[]).await?;
        BootStatus::from_payload(response)
    }
}
