//! TCTLM master request/response engine.
//!
//! One [`Master`] owns the injected link hooks, the clock, and the
//! per-carrier working buffers. Requests are strictly serial: each
//! [`Master::send_receive`] call takes the master by exclusive borrow, so
//! two endpoints sharing a carrier serialise at the handle.
use crate::error::{nack_status, Error};
use crate::protocol::transport::can_id::{CanId, MessageType};
use crate::protocol::transport::can_packet::CanPacket;
use crate::protocol::transport::endpoint::{Carrier, Endpoint, NodeType, Protocol};
use crate::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};
use crate::protocol::transport::uart_codec::{self, RxDecoder};
use crate::protocol::transport::{
    CAN_DATA_BYTES, COMMS_BUFFER_SIZE, CSP_HEADER_SIZE, CSP_PORT_PASSTHROUGH, CSP_PORT_TCTLM,
    INTER_PACKET_DELAY_MS, RX_POLL_DELAY_MS, TCTLM_MAX_PAYLOAD, TLM_ID_START,
};

/// Library configuration captured at construction.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Host address on the CAN bus, placed in the source field of every
    /// outgoing extended identifier.
    pub host_address: u8,
}

//==================================================================================MASTER
/// TCTLM master endpoint handle.
///
/// Generic over the caller's CAN, UART and CSP hooks plus the clock; wire
/// [`Unimplemented`](crate::protocol::transport::traits::Unimplemented) for
/// any carrier the build does not use.
pub struct Master<C: CanBus, U: UartPort, S: CspSocket, K: Clock> {
    can: C,
    uart: U,
    csp: S,
    clock: K,
    host_addr: u8,
    /// Request/response buffer for the CAN carrier (native and CSP).
    can_data: [u8; COMMS_BUFFER_SIZE],
    /// Request/response buffer for the UART carrier.
    uart_data: [u8; COMMS_BUFFER_SIZE],
    /// Scratch for the CSP packet including the CubeSpace sub-header.
    csp_scratch: [u8; COMMS_BUFFER_SIZE],
    /// Scratch for the UART wire image including protocol bytes.
    uart_scratch: [u8; COMMS_BUFFER_SIZE],
}

impl<C: CanBus, U: UartPort, S: CspSocket, K: Clock> Master<C, U, S, K> {
    pub fn new(config: Config, can: C, uart: U, csp: S, clock: K) -> Self {
        Self {
            can,
            uart,
            csp,
            clock,
            host_addr: config.host_address,
            can_data: [0; COMMS_BUFFER_SIZE],
            uart_data: [0; COMMS_BUFFER_SIZE],
            csp_scratch: [0; COMMS_BUFFER_SIZE],
            uart_scratch: [0; COMMS_BUFFER_SIZE],
        }
    }

    /// Host address used as CAN source.
    pub fn host_address(&self) -> u8 {
        self.host_addr
    }

    pub(crate) fn now_ms(&mut self) -> u32 {
        self.clock.now_ms()
    }

    pub(crate) async fn delay_ms(&mut self, millis: u32) {
        self.clock.delay_ms(millis).await;
    }

    /// Perform one request/response transaction.
    ///
    /// `tctlm_id` below [`TLM_ID_START`] is a telecommand, everything else a
    /// telemetry request. On success the returned slice is the response
    /// payload with all framing stripped; it borrows the carrier buffer and
    /// must be consumed before the next request.
    pub async fn send_receive(
        &mut self,
        endpoint: &Endpoint,
        tctlm_id: u8,
        request: &[u8],
    ) -> Result<&[u8], Error> {
        if request.len() > TCTLM_MAX_PAYLOAD {
            return Err(Error::Size);
        }

        match endpoint.carrier {
            Carrier::Can => {
                let used = match endpoint.proto {
                    Protocol::CubeSpace => self.can_exchange(endpoint, tctlm_id, request).await?,
                    Protocol::Csp => self.csp_exchange(endpoint, tctlm_id, request).await?,
                };
                Ok(&self.can_data[..used])
            }
            Carrier::Uart => {
                if endpoint.proto == Protocol::Csp {
                    // CSP is only legal on the CAN carrier.
                    return Err(Error::Param);
                }
                let used = self.uart_exchange(endpoint, tctlm_id, request).await?;
                Ok(&self.uart_data[..used])
            }
            Carrier::I2c => Err(Error::Todo),
        }
    }

    //==============================================================================CAN_NATIVE
    async fn can_exchange(
        &mut self,
        endpoint: &Endpoint,
        tctlm_id: u8,
        request: &[u8],
    ) -> Result<usize, Error> {
        // Empty the rx buffer before a new transaction.
        self.can.rx_flush();

        let data_len = request.len();
        let mut packets_left: u8 = 0;

        let msg_type = if tctlm_id < TLM_ID_START {
            if data_len > CAN_DATA_BYTES {
                // The telecommand requires multiple packets.
                let mut count = (data_len / 7) as u8;
                if data_len % 7 == 0 {
                    count -= 1;
                }
                packets_left = count;
                MessageType::TcExt
            } else {
                MessageType::Tc
            }
        } else {
            MessageType::Tlm
        };

        let dst_addr = if endpoint.passthrough {
            endpoint.addr_pass
        } else {
            endpoint.addr
        };

        let ext_id = CanId::new(msg_type, tctlm_id, self.host_addr, dst_addr);
        let packets = packets_left as usize + 1;
        let mut offset = 0usize;

        for index in 0..packets {
            let mut packet = CanPacket::new(ext_id);

            if data_len > 0 {
                let copy_len;

                if data_len > CAN_DATA_BYTES {
                    // Multi-packet sequence: seven payload bytes plus the
                    // packets-left counter, except a shorter terminal packet.
                    if offset + 7 > data_len {
                        copy_len = data_len - offset;
                        packet.data[copy_len] = packets_left;
                        packet.size = copy_len + 1;
                    } else {
                        copy_len = 7;
                        packet.data[7] = packets_left;
                        packet.size = CAN_DATA_BYTES;
                    }
                    packets_left = packets_left.wrapping_sub(1);
                } else {
                    copy_len = data_len;
                    packet.size = data_len;
                }

                packet.data[..copy_len].copy_from_slice(&request[offset..offset + copy_len]);
                offset += copy_len;
            }

            self.can.send(&packet).await?;

            // CubeComputer paces its receive path between packets.
            if endpoint.node_type == NodeType::CubeComputer && index + 1 < packets {
                self.clock.delay_ms(INTER_PACKET_DELAY_MS).await;
            }
        }

        // Now wait for the response.
        let busy_start = self.clock.now_ms();
        let mut offset = 0usize;

        loop {
            match self.can.recv().await {
                Ok(packet) => {
                    if packet.ext_id.tctlm_id() != tctlm_id {
                        return Err(Error::TctlmId);
                    }

                    match packet.ext_id.msg_type() {
                        Some(MessageType::TlmRespExt) => {
                            if packet.size == 0 {
                                return Err(Error::TctlmProtocol);
                            }
                            let counter = packet.data[packet.size - 1];
                            let copy_len = packet.size - 1;
                            if offset + copy_len > self.can_data.len() {
                                return Err(Error::Overrun);
                            }
                            self.can_data[offset..offset + copy_len]
                                .copy_from_slice(&packet.data[..copy_len]);
                            offset += copy_len;

                            if counter == 0 {
                                return Ok(offset);
                            }
                        }
                        Some(MessageType::TcNack) | Some(MessageType::TlmNack) => {
                            // Reason 0 is an acknowledgement; treat the
                            // packet like a single-packet reply then.
                            nack_status(packet.data[0])?;
                            let copy_len = packet.size;
                            if offset + copy_len > self.can_data.len() {
                                return Err(Error::Overrun);
                            }
                            self.can_data[offset..offset + copy_len]
                                .copy_from_slice(&packet.data[..copy_len]);
                            return Ok(offset + copy_len);
                        }
                        _ => {
                            // Single-packet reply terminates the exchange.
                            let copy_len = packet.size;
                            if offset + copy_len > self.can_data.len() {
                                return Err(Error::Overrun);
                            }
                            self.can_data[offset..offset + copy_len]
                                .copy_from_slice(&packet.data[..copy_len]);
                            return Ok(offset + copy_len);
                        }
                    }
                }
                Err(_) => {
                    // Nothing buffered yet; keep retrying until the deadline.
                    self.clock.delay_ms(RX_POLL_DELAY_MS).await;
                }
            }

            if self.clock.now_ms().wrapping_sub(busy_start) >= endpoint.timeout_ms {
                return Err(Error::Timeout);
            }
        }
    }

    //==============================================================================CAN_CSP
    async fn csp_exchange(
        &mut self,
        endpoint: &Endpoint,
        tctlm_id: u8,
        request: &[u8],
    ) -> Result<usize, Error> {
        let data_len = request.len();
        if data_len + CSP_HEADER_SIZE > self.csp_scratch.len() {
            return Err(Error::Size);
        }

        let msg_type = if tctlm_id < TLM_ID_START {
            MessageType::Tc
        } else {
            MessageType::Tlm
        };

        let dst_port = if endpoint.passthrough {
            CSP_PORT_PASSTHROUGH
        } else {
            CSP_PORT_TCTLM
        };

        // CubeSpace sub-header, then the TCTLM payload.
        self.csp_scratch[0] = msg_type as u8;
        self.csp_scratch[1] = tctlm_id;
        self.csp_scratch[CSP_HEADER_SIZE..CSP_HEADER_SIZE + data_len].copy_from_slice(request);

        self.csp
            .send_to(
                endpoint.addr,
                dst_port,
                endpoint.csp_src_port,
                &self.csp_scratch[..CSP_HEADER_SIZE + data_len],
                endpoint.timeout_ms,
            )
            .await?;

        let rx_len = self
            .csp
            .recv_from(
                endpoint.csp_src_port,
                &mut self.csp_scratch,
                endpoint.timeout_ms,
            )
            .await?;

        if rx_len < CSP_HEADER_SIZE {
            return Err(Error::TlmSize);
        }

        if self.csp_scratch[1] != tctlm_id {
            return Err(Error::TctlmId);
        }

        let rx_type = self.csp_scratch[0];
        if rx_type == MessageType::TcNack as u8 || rx_type == MessageType::TlmNack as u8 {
            if rx_len <= CSP_HEADER_SIZE {
                return Err(Error::TctlmProtocol);
            }
            nack_status(self.csp_scratch[CSP_HEADER_SIZE])?;
        }

        let used = rx_len - CSP_HEADER_SIZE;
        self.can_data[..used].copy_from_slice(&self.csp_scratch[CSP_HEADER_SIZE..rx_len]);

        Ok(used)
    }

    //==============================================================================UART
    async fn uart_exchange(
        &mut self,
        endpoint: &Endpoint,
        tctlm_id: u8,
        request: &[u8],
    ) -> Result<usize, Error> {
        // Empty the rx buffer before a new transaction.
        self.uart.rx_flush();

        let tx_len =
            uart_codec::encode_request(tctlm_id, request, endpoint.passthrough, &mut self.uart_scratch)?;
        self.uart.write(&self.uart_scratch[..tx_len]).await?;

        // Now wait for the response, one byte at a time.
        let busy_start = self.clock.now_ms();
        let mut decoder = RxDecoder::new();
        let mut used = 0usize;

        loop {
            let mut byte = [0u8; 1];

            match self.uart.read(&mut byte).await {
                Ok(1) => match decoder.push(byte[0]) {
                    uart_codec::Push::Data(value) => {
                        if used >= self.uart_data.len() {
                            return Err(Error::Overrun);
                        }
                        self.uart_data[used] = value;
                        used += 1;
                    }
                    uart_codec::Push::Done => break,
                    uart_codec::Push::Pending => {}
                },
                _ => {
                    // Nothing buffered yet; keep retrying until the deadline.
                    self.clock.delay_ms(RX_POLL_DELAY_MS).await;
                }
            }

            if self.clock.now_ms().wrapping_sub(busy_start) >= endpoint.timeout_ms {
                return Err(Error::Timeout);
            }
        }

        // A valid SOM must have been received, and the response must match
        // the passthrough mode of the request.
        if !decoder.window_opened() || decoder.is_passthrough() != endpoint.passthrough {
            return Err(Error::TctlmProtocol);
        }

        if decoder.tctlm_id() != Some(tctlm_id) {
            return Err(Error::TctlmId);
        }

        if decoder.is_nack() {
            if used == 0 {
                return Err(Error::UknNack);
            }
            nack_status(self.uart_data[0])?;
        }

        Ok(used)
    }
}
