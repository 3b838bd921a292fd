//! Hand-written subset of the CubeSpace TCTLM message catalogue.
//!
//! Only the messages driven by the bulk transfer engine and the operation
//! helpers live here; the transport itself is oblivious to message ids and
//! carries anything. Each module pairs the message structures with thin
//! [`Master`](crate::protocol::transport::master::Master) extension methods
//! that serialize, exchange, and decode.
pub mod bootloader;
pub mod control_program;
pub mod framework;
pub mod image;
pub mod logs;
pub mod transfer;

/// Declare a wire enum stored as one `u8`.
///
/// Generates the enum plus `from_raw`/`Into<u8>` conversions; unknown raw
/// values decode to `None` and are rejected by the payload readers.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant = $value),+
        }

        impl $name {
            /// Decode the wire byte.
            pub fn from_raw(raw: u8) -> Option<Self> {
                match raw {
                    $(raw if raw == $value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

pub(crate) use wire_enum;
