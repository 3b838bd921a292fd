//! UART framing for the TCTLM protocol: escape-doubling encoder for
//! requests and a byte-at-a-time decoder for responses.
//!
//! A request on the wire is `ESC SOM id <payload with every 0x1F doubled>
//! ESC EOM`. Responses use the ack/nack SOM bytes and the same escaping.
use crate::error::Error;

/// Escape character. A literal `0x1F` in the payload is transmitted twice.
pub const ESCAPE: u8 = 0x1F;
/// End of message, valid only after the escape character.
pub const EOM: u8 = 0xFF;

/// Start of request/response message.
pub const SOM_NORMAL: u8 = 0x7F;
/// Start of request/response message, passthrough.
pub const SOM_NORMAL_PASS: u8 = 0x7E;
/// Start of acknowledge response.
pub const SOM_ACK: u8 = 0x07;
/// Start of acknowledge response, passthrough.
pub const SOM_ACK_PASS: u8 = 0x06;
/// Start of not-acknowledge response.
pub const SOM_NACK: u8 = 0x0F;
/// Start of not-acknowledge response, passthrough.
pub const SOM_NACK_PASS: u8 = 0x0E;
/// Start of unsolicited event message.
pub const SOM_EVENT: u8 = 0x2F;
/// Start of unsolicited telemetry message.
pub const SOM_UNSOL: u8 = 0x4F;

//==================================================================================ENCODER
/// Encode a request into `out` and return the number of wire bytes.
///
/// Fails with [`Error::Size`] when the escaped form does not fit.
pub fn encode_request(
    tctlm_id: u8,
    payload: &[u8],
    passthrough: bool,
    out: &mut [u8],
) -> Result<usize, Error> {
    let som = if passthrough { SOM_NORMAL_PASS } else { SOM_NORMAL };

    let escapes = payload.iter().filter(|&&byte| byte == ESCAPE).count();
    let wire_len = 3 + payload.len() + escapes + 2;
    if wire_len > out.len() {
        return Err(Error::Size);
    }

    out[0] = ESCAPE;
    out[1] = som;
    out[2] = tctlm_id;

    let mut idx = 3usize;
    for &byte in payload {
        if byte == ESCAPE {
            out[idx] = ESCAPE;
            idx += 1;
        }
        out[idx] = byte;
        idx += 1;
    }

    out[idx] = ESCAPE;
    out[idx + 1] = EOM;

    Ok(wire_len)
}

//==================================================================================DECODER
/// Outcome of feeding one byte to the [`RxDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Byte consumed, nothing to report yet.
    Pending,
    /// One decoded payload byte.
    Data(u8),
    /// End of message reached.
    Done,
}

/// Incremental response decoder.
///
/// Mirrors the wire rules: `0x1F` arms the escape state; while escaped, a
/// second `0x1F` is a literal payload byte, an ack/nack SOM opens the
/// receive window and classifies the response, and `0xFF` terminates.
/// The first plain byte after the SOM is the echoed TCTLM id.
#[derive(Debug, Default)]
pub struct RxDecoder {
    escaped: bool,
    som: bool,
    window_open: bool,
    nack: bool,
    passthrough: bool,
    done: bool,
    tctlm_id: Option<u8>,
}

impl RxDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a valid SOM was ever seen.
    pub fn window_opened(&self) -> bool {
        self.window_open
    }

    /// Whether the response was a NACK.
    pub fn is_nack(&self) -> bool {
        self.nack
    }

    /// Whether the response used the passthrough SOM variants.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Whether the end-of-message sequence was seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// TCTLM id echoed by the device, once the window is open.
    pub fn tctlm_id(&self) -> Option<u8> {
        self.tctlm_id
    }

    /// Feed one received byte.
    pub fn push(&mut self, byte: u8) -> Push {
        if self.escaped {
            self.escaped = false;

            return match byte {
                SOM_ACK | SOM_ACK_PASS => {
                    self.som = true;
                    self.passthrough = byte == SOM_ACK_PASS;
                    Push::Pending
                }
                SOM_NACK | SOM_NACK_PASS => {
                    self.som = true;
                    self.nack = true;
                    self.passthrough = byte == SOM_NACK_PASS;
                    Push::Pending
                }
                EOM => {
                    self.done = true;
                    Push::Done
                }
                ESCAPE => {
                    if self.window_open {
                        Push::Data(ESCAPE)
                    } else {
                        Push::Pending
                    }
                }
                _ => Push::Pending,
            };
        }

        if byte == ESCAPE {
            self.escaped = true;
            return Push::Pending;
        }

        if self.som {
            // The byte following the SOM is always the TCTLM id.
            self.tctlm_id = Some(byte);
            self.window_open = true;
            self.som = false;
            return Push::Pending;
        }

        if self.window_open {
            return Push::Data(byte);
        }

        Push::Pending
    }
}
