//! Minimal wiring example: build a master over the hooks your platform
//! provides and drive a CubeComputer endpoint.
//!
//! The link hooks are left as [`Unimplemented`] stubs here so the example
//! runs anywhere; swap them for your SocketCAN / serial / CSP bindings to
//! talk to real hardware.
use cube_obc::protocol::transport::endpoint::{Endpoint, NodeType};
use cube_obc::protocol::transport::master::{Config, Master};
use cube_obc::protocol::transport::traits::{Clock, Unimplemented};

/// Clock backed by the host monotonic clock and a tokio sleep.
struct TokioClock {
    origin: std::time::Instant,
}

impl Clock for TokioClock {
    fn now_ms(&mut self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }

    async fn delay_ms(&mut self, millis: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(millis as u64)).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let lib = cube_obc::version();
    let sys = cube_obc::system_version();
    println!(
        "cube-obc {}.{}.{} (system API {}.{}.{})",
        lib.major, lib.minor, lib.patch, sys.major, sys.minor, sys.patch
    );

    let clock = TokioClock {
        origin: std::time::Instant::now(),
    };

    // Host address 1 on the CAN bus; wire real hooks in place of the stubs.
    let mut master = Master::new(
        Config { host_address: 1 },
        Unimplemented,
        Unimplemented,
        Unimplemented,
        clock,
    );

    // A CubeComputer at address 2 with a 500 ms transaction timeout.
    let endpoint = Endpoint::can(NodeType::CubeComputer, 2, 500);

    // Without real link hooks every request reports `Todo`.
    match master.send_receive(&endpoint, 0x80, &[]).await {
        Ok(response) => println!("telemetry 0x80: {} bytes", response.len()),
        Err(error) => println!("transaction failed: {error} (code {})", error.code()),
    }
}
