//! Link and clock hook traits injected by the caller, plus the
//! [`Unimplemented`](unimplemented::Unimplemented) stub for hooks a build
//! does not wire.
pub mod can_bus;
pub mod clock;
pub mod csp_socket;
pub mod uart_port;
pub mod unimplemented;

pub use can_bus::CanBus;
pub use clock::Clock;
pub use csp_socket::CspSocket;
pub use uart_port::UartPort;
pub use unimplemented::Unimplemented;
