use std::net::{Ipv4Addr, TcpListener};
use tracing::debug;

use crate::error::{MinerError, Result};

/// Source of local ports for the miniZ telemetry listener
pub trait PortAllocator: Send + Sync {
    fn allocate(&self) -> Result<u16>;
}

/// Scans loopback ports upward from `start` and returns the first one that binds.
///
/// The probe listener is dropped before returning, so there is a short window in
/// which another process can take the port.
#[derive(Debug, Clone)]
pub struct LocalPortAllocator {
    start: u16,
    end: u16,
}

impl LocalPortAllocator {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }
}

impl Default for LocalPortAllocator {
    fn default() -> Self {
        Self::new(4000, 5000)
    }
}

impl PortAllocator for LocalPortAllocator {
    fn allocate(&self) -> Result<u16> {
        for port in self.start..=self.end {
            if TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok() {
                debug!("Allocated telemetry port {}", port);
                return Ok(port);
            }
        }
        Err(MinerError::NoPortAvailable {
            start: self.start,
            end: self.end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_ports_in_use() {
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        let allocator = LocalPortAllocator::new(port, port);
        assert!(matches!(
            allocator.allocate(),
            Err(MinerError::NoPortAvailable { .. })
        ));

        drop(taken);
        assert_eq!(allocator.allocate().unwrap(), port);
    }
}
