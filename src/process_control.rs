// src/process_control.rs
//! Cooperative cancellation registry.
//!
//! One entry per logical process name (one per active pipeline instance).
//! Cancellation is a level-triggered flag: an external stop request sets it,
//! workers poll it at their suspension points, and completion discards the
//! entry. Nothing is ever interrupted forcibly.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle state of one named logical process.
#[derive(Debug, Clone)]
pub struct ProcessState {
    pub process_id: String,
    pub running: bool,
    pub cancel_requested: bool,
    pub started_at: DateTime<Utc>,
}

/// Registry of named processes. Construct explicitly and inject; distinct
/// pipeline instances use distinct names, so no cross-key coordination is
/// needed.
pub struct ProcessControl {
    processes: DashMap<String, ProcessState>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self {
            processes: DashMap::new(),
        }
    }

    /// Register a process as running and return its id. Re-starting an
    /// existing name replaces the previous state (last-writer-wins).
    pub fn start(&self, name: &str) -> String {
        let process_id = Uuid::new_v4().to_string();
        let state = ProcessState {
            process_id: process_id.clone(),
            running: true,
            cancel_requested: false,
            started_at: Utc::now(),
        };
        self.processes.insert(name.to_string(), state);
        debug!("Process started: {} ({})", name, process_id);
        process_id
    }

    /// Flag a running process for cancellation. Returns false when the name
    /// is unknown (already completed or never started).
    pub fn request_stop(&self, name: &str) -> bool {
        match self.processes.get_mut(name) {
            Some(mut state) if state.running => {
                state.cancel_requested = true;
                info!("Stop requested for process: {}", name);
                true
            }
            _ => false,
        }
    }

    /// Polled by the pipeline at every suspension point.
    pub fn should_stop(&self, name: &str) -> bool {
        self.processes
            .get(name)
            .map(|state| state.cancel_requested)
            .unwrap_or(false)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.processes
            .get(name)
            .map(|state| state.running)
            .unwrap_or(false)
    }

    /// Discard the entry for a finished process, clearing its flag with it.
    pub fn complete(&self, name: &str, was_stopped: bool) {
        if self.processes.remove(name).is_some() {
            debug!("Process completed: {} (stopped: {})", name, was_stopped);
        }
    }

    pub fn state(&self, name: &str) -> Option<ProcessState> {
        self.processes.get(name).map(|state| state.clone())
    }

    pub fn active_count(&self) -> usize {
        self.processes.len()
    }
}

impl Default for ProcessControl {
    fn default() -> Self {
        Self::new()
    }
}
