//! # Notify Characteristic
//!
//! Single-value, last-write-wins slot that connected clients read or subscribe
//! to. Each publication replaces the previous value; nothing is queued.

use tokio::sync::watch;
use tracing::{debug, info};

use super::{Publication, Publisher, TransportEvents};
use crate::error::Result;

/// Latest-value characteristic with change notification
#[derive(Debug)]
pub struct NotifyCharacteristic {
    value: watch::Sender<Option<String>>,
    clients: usize,
}

impl Default for NotifyCharacteristic {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyCharacteristic {
    pub fn new() -> Self {
        let (value, _) = watch::channel(None);
        Self { value, clients: 0 }
    }

    /// Receiver that wakes on every new value
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.value.subscribe()
    }

    /// Current value, if anything has been published
    pub fn value(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    pub fn connected_clients(&self) -> usize {
        self.clients
    }
}

impl Publisher for NotifyCharacteristic {
    fn publish(&mut self, publication: &Publication) -> Result<()> {
        let json = publication.to_json()?;
        debug!("Notify ({} client(s)): {}", self.clients, json);
        self.value.send_replace(Some(json));
        Ok(())
    }
}

impl TransportEvents for NotifyCharacteristic {
    fn on_connected(&mut self) {
        self.clients += 1;
        info!("Client connected ({} total)", self.clients);
    }

    fn on_disconnected(&mut self) {
        self.clients = self.clients.saturating_sub(1);
        info!("Client disconnected ({} remaining)", self.clients);
    }

    fn on_write(&mut self, data: &[u8]) {
        info!("Client wrote: {}", String::from_utf8_lossy(data));
    }
}
