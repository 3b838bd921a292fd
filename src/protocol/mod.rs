//! High-level components of the CubeSpace OBC protocol stack: TCTLM
//! transport, message subset, bulk data transfer, and operation helpers.
pub mod bulk;
pub mod messages;
pub mod ops;
pub mod transport;
