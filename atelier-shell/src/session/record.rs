//! In-memory record of the current session
//!
//! The store is a single-slot cell: one controller drives at most one
//! session at a time. Only the controller's transition logic ever
//! replaces the record; the event bridge may flip liveness to
//! `Terminated` for the id it was created with, and every other reader
//! takes a snapshot at time of use.

use std::path::PathBuf;

use atelier_host::SessionId;

/// Lifecycle stage of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Spawn request issued, id not yet known
    Spawning,
    /// Process is running and wired to the display surface
    Active,
    /// Exit notification delivered; terminal until the next spawn
    Terminated,
}

/// One running (or just-exited) interactive process
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Host-assigned id
    pub id: SessionId,
    /// Starting directory, immutable once spawned
    pub working_dir: PathBuf,
    /// Arguments passed at spawn, in order
    pub launch_args: Vec<String>,
    /// Current lifecycle stage
    pub liveness: Liveness,
}

/// Single-slot store for the controller's current session
#[derive(Debug, Default)]
pub struct SessionStore {
    current: Option<SessionRecord>,
}

impl SessionStore {
    /// Install a record, replacing whatever was there
    pub fn promote(&mut self, record: SessionRecord) {
        self.current = Some(record);
    }

    /// Id usable for writes and resizes: only an `Active` session
    pub fn active_id(&self) -> Option<SessionId> {
        self.current
            .as_ref()
            .filter(|r| r.liveness == Liveness::Active)
            .map(|r| r.id.clone())
    }

    /// Id of the current session regardless of liveness
    ///
    /// A terminated session still names the conversation that is open on
    /// the surface, so this survives until the next spawn or teardown.
    pub fn current_id(&self) -> Option<SessionId> {
        self.current.as_ref().map(|r| r.id.clone())
    }

    /// Flip the record from `Spawning` to `Active` once the event
    /// bridge is subscribed and delivering
    ///
    /// A record the bridge already marked terminated stays terminated;
    /// an instant exit must not be resurrected by a late activation.
    pub fn activate(&mut self, id: &SessionId) -> bool {
        match &mut self.current {
            Some(record) if record.id == *id && record.liveness == Liveness::Spawning => {
                record.liveness = Liveness::Active;
                true
            }
            _ => false,
        }
    }

    /// Flip the record to `Terminated` if it still holds `id`
    ///
    /// Returns false when the record was already replaced; a stale exit
    /// notification must not touch the successor session.
    pub fn mark_terminated(&mut self, id: &SessionId) -> bool {
        match &mut self.current {
            Some(record) if record.id == *id => {
                record.liveness = Liveness::Terminated;
                true
            }
            _ => false,
        }
    }

    /// Remove and return the current record
    pub fn clear(&mut self) -> Option<SessionRecord> {
        self.current.take()
    }

    /// Borrow the current record
    pub fn current(&self) -> Option<&SessionRecord> {
        self.current.as_ref()
    }
}
