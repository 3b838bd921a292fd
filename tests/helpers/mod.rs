//! Test doubles: a fake clock, simulated CAN/UART/CSP links answering at
//! the TCTLM level through a scripted device model, and an in-memory frame
//! buffer provider.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use cube_obc::error::Error;
use cube_obc::protocol::bulk::{frame_checksum, FrameBufferProvider};
use cube_obc::protocol::messages::transfer::{
    FRAME_INFO_ID, FRAME_READ_ID, FRAME_WRITE_ID, TRANSFER_FRAME_ID,
};
use cube_obc::protocol::transport::can_id::{CanId, MessageType};
use cube_obc::protocol::transport::can_packet::CanPacket;
use cube_obc::protocol::transport::traits::{CanBus, Clock, CspSocket, UartPort};
use cube_obc::protocol::transport::uart_codec::{
    EOM, ESCAPE, SOM_ACK, SOM_ACK_PASS, SOM_NACK, SOM_NACK_PASS, SOM_NORMAL, SOM_NORMAL_PASS,
};

//==================================================================================CLOCK
/// Deterministic clock: `delay_ms` advances the reading instead of
/// sleeping, so every timing window in the library resolves instantly.
#[derive(Clone, Default)]
pub struct FakeClock(Rc<Cell<u32>>);

impl FakeClock {
    pub fn starting_at(now: u32) -> Self {
        Self(Rc::new(Cell::new(now)))
    }

    pub fn now(&self) -> u32 {
        self.0.get()
    }
}

impl Clock for FakeClock {
    fn now_ms(&mut self) -> u32 {
        self.0.get()
    }

    async fn delay_ms(&mut self, millis: u32) {
        self.0.set(self.0.get().wrapping_add(millis));
    }
}

//==================================================================================DEVICE
/// What the simulated device does with one fully reassembled request.
pub enum DeviceReply {
    /// Acknowledge with a response payload.
    Ack(Vec<u8>),
    /// Refuse with a NACK reason byte.
    Nack(u8),
    /// Swallow the request; the master runs into its deadline.
    Silent,
    /// CAN only: place these packets on the bus verbatim.
    RawPackets(Vec<CanPacket>),
}

/// Device model answering at the (id, payload) level; the mock links do
/// the carrier-specific framing around it.
pub trait TctlmDevice {
    fn handle(&mut self, id: u8, request: &[u8]) -> DeviceReply;
}

/// Closure-backed device for one-off scripts.
pub struct FnDevice<F>(pub F);

impl<F: FnMut(u8, &[u8]) -> DeviceReply> TctlmDevice for FnDevice<F> {
    fn handle(&mut self, id: u8, request: &[u8]) -> DeviceReply {
        (self.0)(id, request)
    }
}

//==================================================================================CAN_BUS
pub struct CanBusState<D> {
    pub device: D,
    rx: VecDeque<CanPacket>,
    pub sent: Vec<CanPacket>,
    assembling: Vec<u8>,
}

/// Simulated CAN bus: reassembles outgoing requests, consults the device,
/// and queues the framed response packets for the master to receive.
pub struct MockCanBus<D: TctlmDevice> {
    inner: Rc<RefCell<CanBusState<D>>>,
}

impl<D: TctlmDevice> Clone for MockCanBus<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: TctlmDevice> MockCanBus<D> {
    pub fn new(device: D) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CanBusState {
                device,
                rx: VecDeque::new(),
                sent: Vec::new(),
                assembling: Vec::new(),
            })),
        }
    }

    /// Every packet the master transmitted, in order.
    pub fn sent(&self) -> Vec<CanPacket> {
        self.inner.borrow().sent.clone()
    }

    /// Inspect or mutate the device model.
    pub fn with_device<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.inner.borrow_mut().device)
    }
}

impl<D> CanBusState<D>
where
    D: TctlmDevice,
{
    fn respond(&mut self, id: u8, request: &[u8], device_addr: u8, host_addr: u8, is_tc: bool) {
        match self.device.handle(id, request) {
            DeviceReply::Silent => {}
            DeviceReply::RawPackets(packets) => self.rx.extend(packets),
            DeviceReply::Nack(reason) => {
                let msg_type = if is_tc {
                    MessageType::TcNack
                } else {
                    MessageType::TlmNack
                };
                let mut packet = CanPacket::new(CanId::new(msg_type, id, device_addr, host_addr));
                packet.data[0] = reason;
                packet.size = 1;
                self.rx.push_back(packet);
            }
            DeviceReply::Ack(payload) => {
                if is_tc {
                    let mut packet =
                        CanPacket::new(CanId::new(MessageType::TcResp, id, device_addr, host_addr));
                    packet.size = payload.len().min(8);
                    packet.data[..packet.size].copy_from_slice(&payload[..packet.size]);
                    self.rx.push_back(packet);
                } else if payload.len() <= 8 {
                    let mut packet = CanPacket::new(CanId::new(
                        MessageType::TlmResp,
                        id,
                        device_addr,
                        host_addr,
                    ));
                    packet.size = payload.len();
                    packet.data[..packet.size].copy_from_slice(&payload);
                    self.rx.push_back(packet);
                } else {
                    // Multi-packet reply: seven payload bytes plus the
                    // packets-left counter per packet.
                    let mut packets_left = (payload.len() / 7) as u8;
                    if payload.len() % 7 == 0 {
                        packets_left -= 1;
                    }
                    let mut offset = 0;
                    while offset < payload.len() {
                        let chunk = (payload.len() - offset).min(7);
                        let mut packet = CanPacket::new(CanId::new(
                            MessageType::TlmRespExt,
                            id,
                            device_addr,
                            host_addr,
                        ));
                        packet.data[..chunk].copy_from_slice(&payload[offset..offset + chunk]);
                        packet.data[chunk] = packets_left;
                        packet.size = chunk + 1;
                        packets_left = packets_left.wrapping_sub(1);
                        offset += chunk;
                        self.rx.push_back(packet);
                    }
                }
            }
        }
    }
}

impl<D: TctlmDevice> CanBus for MockCanBus<D> {
    fn rx_flush(&mut self) {
        self.inner.borrow_mut().rx.clear();
    }

    async fn recv(&mut self) -> Result<CanPacket, Error> {
        self.inner.borrow_mut().rx.pop_front().ok_or(Error::Read)
    }

    async fn send<'a>(&'a mut self, packet: &'a CanPacket) -> Result<(), Error> {
        let mut state = self.inner.borrow_mut();
        state.sent.push(packet.clone());

        let id = packet.ext_id.tctlm_id();
        let device_addr = packet.ext_id.dst_addr();
        let host_addr = packet.ext_id.src_addr();

        match packet.ext_id.msg_type() {
            Some(MessageType::Tc) => {
                let request = packet.data[..packet.size].to_vec();
                state.respond(id, &request, device_addr, host_addr, true);
            }
            Some(MessageType::TcExt) => {
                let counter = packet.data[packet.size - 1];
                let chunk = packet.data[..packet.size - 1].to_vec();
                state.assembling.extend_from_slice(&chunk);
                if counter == 0 {
                    let request = std::mem::take(&mut state.assembling);
                    state.respond(id, &request, device_addr, host_addr, true);
                }
            }
            Some(MessageType::Tlm) => {
                state.respond(id, &[], device_addr, host_addr, false);
            }
            _ => {}
        }

        Ok(())
    }
}

//==================================================================================UART_PORT
pub struct UartState<D> {
    pub device: D,
    rx: VecDeque<u8>,
    pub sent: Vec<u8>,
    // Request-side framing parser.
    escaped: bool,
    som_seen: bool,
    window_open: bool,
    request_pass: bool,
    request_id: u8,
    payload: Vec<u8>,
    /// Answer with the passthrough SOM variants regardless of the request.
    pub force_passthrough_reply: Option<bool>,
    /// Echo a different id than the request's.
    pub echo_id: Option<u8>,
    /// Reply with these verbatim wire bytes instead of asking the device.
    pub raw_reply: Option<Vec<u8>>,
}

/// Simulated UART link: unescapes outgoing requests, consults the device,
/// and queues the escaped response bytes.
pub struct MockUartPort<D: TctlmDevice> {
    inner: Rc<RefCell<UartState<D>>>,
}

impl<D: TctlmDevice> Clone for MockUartPort<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: TctlmDevice> MockUartPort<D> {
    pub fn new(device: D) -> Self {
        Self {
            inner: Rc::new(RefCell::new(UartState {
                device,
                rx: VecDeque::new(),
                sent: Vec::new(),
                escaped: false,
                som_seen: false,
                window_open: false,
                request_pass: false,
                request_id: 0,
                payload: Vec::new(),
                force_passthrough_reply: None,
                echo_id: None,
                raw_reply: None,
            })),
        }
    }

    /// Every byte the master transmitted, in order.
    pub fn sent(&self) -> Vec<u8> {
        self.inner.borrow().sent.clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut UartState<D>) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl<D: TctlmDevice> UartState<D> {
    fn feed(&mut self, byte: u8) {
        if self.escaped {
            self.escaped = false;
            match byte {
                SOM_NORMAL | SOM_NORMAL_PASS => {
                    self.som_seen = true;
                    self.window_open = false;
                    self.request_pass = byte == SOM_NORMAL_PASS;
                    self.payload.clear();
                }
                EOM => self.finish_request(),
                ESCAPE => {
                    if self.window_open {
                        self.payload.push(ESCAPE);
                    }
                }
                _ => {}
            }
            return;
        }

        if byte == ESCAPE {
            self.escaped = true;
            return;
        }

        if self.som_seen {
            self.request_id = byte;
            self.som_seen = false;
            self.window_open = true;
            return;
        }

        if self.window_open {
            self.payload.push(byte);
        }
    }

    fn finish_request(&mut self) {
        self.window_open = false;

        if let Some(raw) = self.raw_reply.take() {
            self.rx.extend(raw);
            return;
        }

        let id = self.request_id;
        let request = std::mem::take(&mut self.payload);
        let pass = self.force_passthrough_reply.unwrap_or(self.request_pass);
        let echo = self.echo_id.unwrap_or(id);

        match self.device.handle(id, &request) {
            DeviceReply::Silent | DeviceReply::RawPackets(_) => {}
            DeviceReply::Ack(payload) => {
                let som = if pass { SOM_ACK_PASS } else { SOM_ACK };
                self.push_response(som, echo, &payload);
            }
            DeviceReply::Nack(reason) => {
                let som = if pass { SOM_NACK_PASS } else { SOM_NACK };
                self.push_response(som, echo, &[reason]);
            }
        }
    }

    fn push_response(&mut self, som: u8, id: u8, payload: &[u8]) {
        self.rx.push_back(ESCAPE);
        self.rx.push_back(som);
        self.rx.push_back(id);
        for &byte in payload {
            if byte == ESCAPE {
                self.rx.push_back(ESCAPE);
            }
            self.rx.push_back(byte);
        }
        self.rx.push_back(ESCAPE);
        self.rx.push_back(EOM);
    }
}

impl<D: TctlmDevice> UartPort for MockUartPort<D> {
    fn rx_flush(&mut self) {
        self.inner.borrow_mut().rx.clear();
    }

    async fn read<'a>(&'a mut self, buf: &'a mut [u8]) -> Result<usize, Error> {
        let mut state = self.inner.borrow_mut();
        if state.rx.is_empty() {
            return Err(Error::Read);
        }
        let mut count = 0;
        while count < buf.len() {
            match state.rx.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    async fn write<'a>(&'a mut self, data: &'a [u8]) -> Result<(), Error> {
        let mut state = self.inner.borrow_mut();
        state.sent.extend_from_slice(data);
        for &byte in data {
            state.feed(byte);
        }
        Ok(())
    }
}

//==================================================================================CSP_SOCKET
pub struct CspState<D> {
    pub device: D,
    pending: VecDeque<Vec<u8>>,
    /// (dst, dst_port, src_port, packet) per send.
    pub sent: Vec<(u8, u8, u8, Vec<u8>)>,
    pub echo_id: Option<u8>,
    pub silent: bool,
}

/// Simulated CSP socket answering with the CubeSpace sub-header.
pub struct MockCspSocket<D: TctlmDevice> {
    inner: Rc<RefCell<CspState<D>>>,
}

impl<D: TctlmDevice> Clone for MockCspSocket<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: TctlmDevice> MockCspSocket<D> {
    pub fn new(device: D) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CspState {
                device,
                pending: VecDeque::new(),
                sent: Vec::new(),
                echo_id: None,
                silent: false,
            })),
        }
    }

    pub fn sent(&self) -> Vec<(u8, u8, u8, Vec<u8>)> {
        self.inner.borrow().sent.clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut CspState<D>) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl<D: TctlmDevice> CspSocket for MockCspSocket<D> {
    async fn send_to<'a>(
        &'a mut self,
        dst: u8,
        dst_port: u8,
        src_port: u8,
        data: &'a [u8],
        _timeout_ms: u32,
    ) -> Result<(), Error> {
        let mut state = self.inner.borrow_mut();
        state.sent.push((dst, dst_port, src_port, data.to_vec()));

        if state.silent {
            return Ok(());
        }

        let is_tc = data[0] == MessageType::Tc as u8;
        let id = data[1];
        let request = data[2..].to_vec();
        let echo = state.echo_id.unwrap_or(id);

        let response = match state.device.handle(id, &request) {
            DeviceReply::Silent | DeviceReply::RawPackets(_) => return Ok(()),
            DeviceReply::Ack(payload) => {
                let resp_type = if is_tc {
                    MessageType::TcResp
                } else {
                    MessageType::TlmResp
                };
                let mut packet = vec![resp_type as u8, echo];
                packet.extend_from_slice(&payload);
                packet
            }
            DeviceReply::Nack(reason) => {
                let resp_type = if is_tc {
                    MessageType::TcNack
                } else {
                    MessageType::TlmNack
                };
                vec![resp_type as u8, echo, reason]
            }
        };

        state.pending.push_back(response);
        Ok(())
    }

    async fn recv_from<'a>(
        &'a mut self,
        _port: u8,
        buf: &'a mut [u8],
        _timeout_ms: u32,
    ) -> Result<usize, Error> {
        let mut state = self.inner.borrow_mut();
        match state.pending.pop_front() {
            Some(packet) => {
                buf[..packet.len()].copy_from_slice(&packet);
                Ok(packet.len())
            }
            None => Err(Error::CspRecvTimeout),
        }
    }
}

//==================================================================================PROVIDER
/// In-memory frame buffer provider.
///
/// As an upload source it serves successive windows of `data`; as a
/// download sink it hands out zeroed buffers. Committed bytes accumulate
/// in `committed` and advance the cursor, so uncommitted reads re-serve
/// the same position.
pub struct FileBuffer {
    pub data: Vec<u8>,
    pub cursor: usize,
    scratch: Vec<u8>,
    pub committed: Vec<u8>,
    pub gets: u32,
    pub commits: u32,
    pub fail_commit: bool,
}

impl FileBuffer {
    /// Upload source over `data`.
    pub fn source(data: Vec<u8>) -> Self {
        Self {
            data,
            cursor: 0,
            scratch: Vec::new(),
            committed: Vec::new(),
            gets: 0,
            commits: 0,
            fail_commit: false,
        }
    }

    /// Download sink.
    pub fn sink() -> Self {
        Self::source(Vec::new())
    }
}

impl FrameBufferProvider for FileBuffer {
    fn frame_buffer(&mut self, size: u16) -> Result<&mut [u8], Error> {
        self.gets += 1;
        let size = size as usize;
        self.scratch.clear();

        if self.data.is_empty() {
            self.scratch.resize(size, 0);
        } else if self.cursor + size <= self.data.len() {
            self.scratch
                .extend_from_slice(&self.data[self.cursor..self.cursor + size]);
        } else {
            return Err(Error::SizeHigh);
        }

        Ok(&mut self.scratch)
    }

    fn commit_frame_buffer(&mut self, size: u16) -> Result<(), Error> {
        if self.fail_commit {
            return Err(Error::Commit);
        }
        self.commits += 1;
        self.committed.extend_from_slice(&self.scratch[..size as usize]);
        self.cursor += size as usize;
        Ok(())
    }
}

//==================================================================================BDT_DEVICE
/// Which direction the simulated transfer engine is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BdtMode {
    Upload,
    Download,
}

/// Device-side model of the bulk transfer service.
pub struct BdtDevice {
    pub mode: BdtMode,
    /// Bytes of the last `Frame` write.
    pub staged: Vec<u8>,
    pub check_sum: u8,
    /// Upload bytes the device has accepted, in `TransferFrame` order.
    pub received: Vec<u8>,
    pub frame_sizes: Vec<u16>,
    pub frame_numbers: Vec<u16>,
    /// Data served on download.
    pub download: Vec<u8>,
    current_chunk: Vec<u8>,
    pub frame_number: u16,
    pub frame_last: bool,
    pub frame_error: bool,
    /// Every handled transfer-service id, in order.
    pub ops: Vec<u8>,
    // Scripted behaviors.
    pub frame_error_at: Option<u16>,
    pub corrupt_checksum: bool,
    /// Process the next N `TransferFrame`s but swallow the response.
    pub silent_transfer_frames: u32,
    /// Refuse the next N `TransferFrame`s with a busy NACK.
    pub busy_transfer_frames: u32,
    /// Serve a zero-size frame without the last flag.
    pub empty_nonlast: bool,
}

impl BdtDevice {
    pub fn upload_target() -> Self {
        Self::new(BdtMode::Upload, Vec::new())
    }

    pub fn download_source(download: Vec<u8>) -> Self {
        Self::new(BdtMode::Download, download)
    }

    fn new(mode: BdtMode, download: Vec<u8>) -> Self {
        Self {
            mode,
            staged: Vec::new(),
            check_sum: 0,
            received: Vec::new(),
            frame_sizes: Vec::new(),
            frame_numbers: Vec::new(),
            download,
            current_chunk: Vec::new(),
            frame_number: 0xFFFF,
            frame_last: false,
            frame_error: false,
            ops: Vec::new(),
            frame_error_at: None,
            corrupt_checksum: false,
            silent_transfer_frames: 0,
            busy_transfer_frames: 0,
            empty_nonlast: false,
        }
    }

    fn process_transfer_frame(&mut self, frame_number: u16) {
        self.frame_number = frame_number;
        self.frame_numbers.push(frame_number);

        if self.frame_error_at == Some(frame_number) {
            self.frame_error = true;
            return;
        }

        match self.mode {
            BdtMode::Upload => {
                self.frame_sizes.push(self.staged.len() as u16);
                self.received.extend_from_slice(&self.staged);
            }
            BdtMode::Download => {
                let start = (frame_number as usize * 256).min(self.download.len());
                let end = (start + 256).min(self.download.len());
                self.current_chunk = self.download[start..end].to_vec();
                self.frame_last = end >= self.download.len();
                if self.empty_nonlast {
                    self.current_chunk.clear();
                    self.frame_last = false;
                }
            }
        }
    }

    /// Handle transfer-service ids; `None` when the id belongs elsewhere.
    pub fn handle_transfer(&mut self, id: u8, request: &[u8]) -> Option<DeviceReply> {
        let reply = match id {
            FRAME_WRITE_ID => {
                let size = u16::from_le_bytes([request[0], request[1]]) as usize;
                self.staged = request[2..2 + size].to_vec();
                self.check_sum = if self.corrupt_checksum {
                    !frame_checksum(&self.staged)
                } else {
                    frame_checksum(&self.staged)
                };
                DeviceReply::Ack(Vec::new())
            }
            TRANSFER_FRAME_ID => {
                if self.silent_transfer_frames > 0 {
                    self.silent_transfer_frames -= 1;
                    let frame_number = u16::from_le_bytes([request[0], request[1]]);
                    self.process_transfer_frame(frame_number);
                    DeviceReply::Silent
                } else if self.busy_transfer_frames > 0 {
                    self.busy_transfer_frames -= 1;
                    DeviceReply::Nack(6)
                } else {
                    let frame_number = u16::from_le_bytes([request[0], request[1]]);
                    self.process_transfer_frame(frame_number);
                    DeviceReply::Ack(Vec::new())
                }
            }
            FRAME_INFO_ID => {
                let mut payload = Vec::new();
                payload.extend_from_slice(&self.frame_number.to_le_bytes());
                payload.push(self.frame_last as u8);
                payload.push(self.frame_error as u8);
                payload.push(self.check_sum);
                DeviceReply::Ack(payload)
            }
            FRAME_READ_ID => {
                let size = self.current_chunk.len() as u16;
                let mut payload = Vec::new();
                payload.extend_from_slice(&size.to_le_bytes());
                payload.extend_from_slice(&self.current_chunk);
                DeviceReply::Ack(payload)
            }
            _ => return None,
        };

        self.ops.push(id);
        Some(reply)
    }
}

impl TctlmDevice for BdtDevice {
    fn handle(&mut self, id: u8, request: &[u8]) -> DeviceReply {
        self.handle_transfer(id, request)
            .unwrap_or(DeviceReply::Silent)
    }
}
