//! Endpoint description: everything one TCTLM request needs to know about
//! the node it is addressed to and the carrier it travels on.

//==================================================================================NODE_TYPE
/// CubeSpace product family behind the endpoint. The transport uses this
/// for pacing policy; the operation helpers use it for argument validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Invalid = 0,
    CubeComputer = 1,
    CubeSense = 2,
    CubeControl = 3,
    CubeWheel = 4,
    CubeStar = 5,
    CubeMag = 6,
}

//==================================================================================CARRIER
/// Physical bus used to reach the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    /// CAN slave bus.
    Can,
    /// I2C slave bus (declared, not implemented).
    I2c,
    /// UART point-to-point link.
    Uart,
}

/// Protocol spoken over the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// CubeSpace native protocol.
    CubeSpace,
    /// Cubesat Space Protocol encapsulation. CAN carrier only.
    Csp,
}

//==================================================================================ENDPOINT
/// Endpoint value object, constructed by the caller and read per request.
/// The transport never retains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Node type behind the endpoint.
    pub node_type: NodeType,
    /// Physical carrier.
    pub carrier: Carrier,
    /// Protocol over the carrier.
    pub proto: Protocol,
    /// Primary address (ignored for UART).
    pub addr: u8,
    /// Destination address used for passthrough transactions (CAN native).
    pub addr_pass: u8,
    /// Source port when `proto` is CSP.
    pub csp_src_port: u8,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u32,
    /// Route the transaction through the node to a subordinate device.
    pub passthrough: bool,
}

impl Endpoint {
    /// Endpoint on the CAN bus speaking the native protocol.
    pub fn can(node_type: NodeType, addr: u8, timeout_ms: u32) -> Self {
        Self {
            node_type,
            carrier: Carrier::Can,
            proto: Protocol::CubeSpace,
            addr,
            addr_pass: 0,
            csp_src_port: 0,
            timeout_ms,
            passthrough: false,
        }
    }

    /// Endpoint on the CAN bus speaking CSP.
    pub fn csp(node_type: NodeType, addr: u8, src_port: u8, timeout_ms: u32) -> Self {
        Self {
            node_type,
            carrier: Carrier::Can,
            proto: Protocol::Csp,
            addr,
            addr_pass: 0,
            csp_src_port: src_port,
            timeout_ms,
            passthrough: false,
        }
    }

    /// Endpoint on a point-to-point UART link.
    pub fn uart(node_type: NodeType, timeout_ms: u32) -> Self {
        Self {
            node_type,
            carrier: Carrier::Uart,
            proto: Protocol::CubeSpace,
            addr: 0,
            addr_pass: 0,
            csp_src_port: 0,
            timeout_ms,
            passthrough: false,
        }
    }

    /// Mark the endpoint as a passthrough transaction. `addr_pass` is the
    /// destination address of the subordinate node; it is only consulted on
    /// the native CAN carrier (UART and CSP select passthrough by SOM byte
    /// and destination port respectively).
    pub fn with_passthrough(mut self, addr_pass: u8) -> Self {
        self.passthrough = true;
        self.addr_pass = addr_pass;
        self
    }
}
