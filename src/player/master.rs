//! Election of the master engine
//!
//! Several engines may live in one process (an interactive one and a
//! render client, for instance), but only one of them is the master that
//! front-ends address. Holding a `MasterToken` is what makes an engine the
//! master; the claim is released when the token is dropped.

use crate::bus::Command;
use crate::utils::error::{Result, StereoPlayError};
use crossbeam_channel::Sender;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Slot {
    holder: Option<u64>,
    next_id: u64,
    commands: Option<Sender<Command>>,
}

/// Registry allowing at most one master claim at a time
#[derive(Clone, Default)]
pub struct MasterRegistry {
    slot: Arc<Mutex<Slot>>,
}

static GLOBAL: Lazy<MasterRegistry> = Lazy::new(MasterRegistry::new);

impl MasterRegistry {
    /// An isolated registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static MasterRegistry {
        &GLOBAL
    }

    /// Claim master status; fails while another token is alive
    pub fn claim(&self) -> Result<MasterToken> {
        let mut slot = self.slot.lock();
        if slot.holder.is_some() {
            return Err(StereoPlayError::MasterTaken);
        }
        let id = slot.next_id;
        slot.next_id += 1;
        slot.holder = Some(id);
        slot.commands = None;
        debug!("Master claim {} granted", id);
        Ok(MasterToken {
            id,
            slot: Arc::clone(&self.slot),
        })
    }

    pub fn has_master(&self) -> bool {
        self.slot.lock().holder.is_some()
    }

    /// Route a command to the master engine's driver
    pub fn send_command(&self, command: Command) -> Result<()> {
        let sender = self
            .slot
            .lock()
            .commands
            .clone()
            .ok_or_else(|| StereoPlayError::NotFound("no master player is running".to_string()))?;
        sender
            .send(command)
            .map_err(|_| StereoPlayError::InvalidState("master player has stopped".to_string()))
    }
}

/// Proof of master status
pub struct MasterToken {
    id: u64,
    slot: Arc<Mutex<Slot>>,
}

impl MasterToken {
    /// Make `MasterRegistry::send_command` deliver to `sender`
    pub fn attach_commands(&self, sender: Sender<Command>) {
        let mut slot = self.slot.lock();
        if slot.holder == Some(self.id) {
            slot.commands = Some(sender);
        }
    }
}

impl std::fmt::Debug for MasterToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterToken").field("id", &self.id).finish()
    }
}

impl Drop for MasterToken {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.holder == Some(self.id) {
            slot.holder = None;
            slot.commands = None;
            debug!("Master claim {} released", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_claim() {
        let registry = MasterRegistry::new();
        let token = registry.claim().unwrap();
        assert!(registry.has_master());
        assert!(matches!(registry.claim(), Err(StereoPlayError::MasterTaken)));
        drop(token);
        assert!(!registry.has_master());
        assert!(registry.claim().is_ok());
    }

    #[test]
    fn test_registries_are_isolated() {
        let a = MasterRegistry::new();
        let b = MasterRegistry::new();
        let _token = a.claim().unwrap();
        assert!(b.claim().is_ok());
    }

    #[test]
    fn test_command_routing() {
        let registry = MasterRegistry::new();
        assert!(matches!(
            registry.send_command(Command::Center),
            Err(StereoPlayError::NotFound(_))
        ));
        let token = registry.claim().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        token.attach_commands(tx);
        registry.send_command(Command::SetHue(0.5)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::SetHue(0.5));
        drop(token);
        assert!(registry.send_command(Command::Center).is_err());
    }
}
