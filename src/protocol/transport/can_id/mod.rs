//! Creation and extraction of the 29-bit extended CAN identifiers used by
//! the TCTLM protocol.

// Layout: [ unused:3 | type:5 | tctlm id:8 | source:8 | destination:8 ]

const TYPE_MASK: u32 = 0x1F;
const TYPE_SHIFT: u32 = 24;
const ID_MASK: u32 = 0xFF;
const ID_SHIFT: u32 = 16;
const SRC_MASK: u32 = 0xFF;
const SRC_SHIFT: u32 = 8;
const DST_MASK: u32 = 0xFF;
const DST_SHIFT: u32 = 0;

//==================================================================================MESSAGE_TYPE
/// TCTLM message type carried in the five type bits of the extended ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Invalid.
    None = 0,
    /// Telecommand, single packet.
    Tc = 1,
    /// Telecommand reply.
    TcResp = 2,
    /// Telecommand request invalid reply.
    TcNack = 3,
    /// Telemetry request.
    Tlm = 4,
    /// Telemetry reply, single packet.
    TlmResp = 5,
    /// Telemetry request invalid reply.
    TlmNack = 6,
    /// Telecommand, multi-packet.
    TcExt = 7,
    /// Telemetry reply, multi-packet.
    TlmRespExt = 8,
    /// Unsolicited event.
    Event = 9,
    /// Unsolicited telemetry, first packet.
    UsolTlmFirst = 10,
    /// Unsolicited telemetry, body packet.
    UsolTlmBody = 11,
    /// Unsolicited telemetry, last packet.
    UsolTlmLast = 12,
}

impl MessageType {
    /// Decode the five type bits. Unknown values yield `None` (the option,
    /// not the variant); the master treats those like a single-packet reply.
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::None,
            1 => Self::Tc,
            2 => Self::TcResp,
            3 => Self::TcNack,
            4 => Self::Tlm,
            5 => Self::TlmResp,
            6 => Self::TlmNack,
            7 => Self::TcExt,
            8 => Self::TlmRespExt,
            9 => Self::Event,
            10 => Self::UsolTlmFirst,
            11 => Self::UsolTlmBody,
            12 => Self::UsolTlmLast,
            _ => return None,
        })
    }
}

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Encapsulates an extended CAN identifier (29 bits) and exposes accessors
/// for the message type, TCTLM id, source, and destination fields.
pub struct CanId(pub u32);

impl CanId {
    /// Compose an identifier from its four fields. The headers of every
    /// packet of one request are identical.
    pub fn new(msg_type: MessageType, tctlm_id: u8, src_addr: u8, dst_addr: u8) -> Self {
        Self(
            ((msg_type as u32 & TYPE_MASK) << TYPE_SHIFT)
                | ((tctlm_id as u32 & ID_MASK) << ID_SHIFT)
                | ((src_addr as u32 & SRC_MASK) << SRC_SHIFT)
                | ((dst_addr as u32 & DST_MASK) << DST_SHIFT),
        )
    }

    /// Raw five type bits, undecoded.
    pub fn msg_type_raw(&self) -> u8 {
        ((self.0 >> TYPE_SHIFT) & TYPE_MASK) as u8
    }

    /// Decoded message type, when the type bits are in range.
    pub fn msg_type(&self) -> Option<MessageType> {
        MessageType::from_raw(self.msg_type_raw())
    }

    /// TCTLM message number this packet belongs to.
    pub fn tctlm_id(&self) -> u8 {
        ((self.0 >> ID_SHIFT) & ID_MASK) as u8
    }

    /// Address of the sending node.
    pub fn src_addr(&self) -> u8 {
        ((self.0 >> SRC_SHIFT) & SRC_MASK) as u8
    }

    /// Address of the receiving node.
    pub fn dst_addr(&self) -> u8 {
        ((self.0 >> DST_SHIFT) & DST_MASK) as u8
    }
}
