//! Poll helper shared by every CubeSpace product: waiting for a boot
//! state.
use crate::error::Error;
use crate::protocol::messages::framework::BootState;
use crate::protocol::transport::endpoint::Endpoint;
use crate::protocol::transport::master::Master;
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    /// Poll `BootStatus` until the node reaches `state` (or leaves it when
    /// `not_state` is set), backing off `backoff_ms` between reads up to a
    /// total of `timeout_ms`.
    ///
    /// A failed status read short-circuits; the poller never retries the
    /// transport.
    pub async fn poll_boot_state(
        &mut self,
        endpoint: &Endpoint,
        state: BootState,
        backoff_ms: u32,
        timeout_ms: u32,
        not_state: bool,
    ) -> Result<(), Error> {
        let mut waited: u32 = 0;

        loop {
            let status = self.get_boot_status(endpoint).await?;

            let mut done = status.state == state;
            if not_state {
                done = !done;
            }

            if done {
                return Ok(());
            }

            if waited >= timeout_ms {
                return Err(Error::Timeout);
            }

            self.delay_ms(backoff_ms).await;
            waited += backoff_ms;
        }
    }
}
