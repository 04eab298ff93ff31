//! Ready-made listeners: a bounded alert buffer and a tracing sink.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use super::{InventoryEvent, InventoryListener, Severity};
use crate::error::{CoreError, CoreResult, ListenerError};

/// Alerts kept when no capacity is configured.
pub const DEFAULT_ALERT_CAPACITY: usize = 50;

// =============================================================================
// Alert Listener
// =============================================================================

/// Keeps the most recent alert-worthy events for the operator dashboard.
///
/// Non-alert events are ignored. Once full, each new alert evicts the oldest.
#[derive(Debug)]
pub struct AlertListener {
    capacity: usize,
    alerts: Mutex<VecDeque<InventoryEvent>>,
}

impl AlertListener {
    pub fn new() -> Self {
        AlertListener {
            capacity: DEFAULT_ALERT_CAPACITY,
            alerts: Mutex::new(VecDeque::with_capacity(DEFAULT_ALERT_CAPACITY)),
        }
    }

    /// Fails with `InvalidArgument` for a zero capacity.
    pub fn with_capacity(capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(CoreError::InvalidArgument(
                "alert capacity must be at least 1".to_string(),
            ));
        }
        Ok(AlertListener {
            capacity,
            alerts: Mutex::new(VecDeque::with_capacity(capacity)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered alerts, oldest first.
    pub fn alerts(&self) -> Vec<InventoryEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The last `n` alerts, oldest first so the most recent is last.
    pub fn recent(&self, n: usize) -> Vec<InventoryEvent> {
        let alerts = self.lock();
        let skip = alerts.len().saturating_sub(n);
        alerts.iter().skip(skip).cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<InventoryEvent>> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AlertListener {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryListener for AlertListener {
    fn on_event(&self, event: &InventoryEvent) -> Result<(), ListenerError> {
        if !event.kind.is_alert_worthy() {
            return Ok(());
        }

        let mut alerts = self.lock();
        while alerts.len() >= self.capacity {
            if let Some(evicted) = alerts.pop_front() {
                debug!(evicted_id = %evicted.id(), kind = ?evicted.kind, "Alert buffer full, evicting oldest");
            }
        }
        alerts.push_back(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "alert-listener"
    }
}

// =============================================================================
// Logging Listener
// =============================================================================

/// Writes every event to `tracing`, at a level matching its severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl InventoryListener for LoggingListener {
    fn on_event(&self, event: &InventoryEvent) -> Result<(), ListenerError> {
        let description = event.description();
        match event.severity() {
            Severity::Info => info!(kind = ?event.kind, product = %event.product.code, "{}", description),
            Severity::Warning => warn!(kind = ?event.kind, product = %event.product.code, "{}", description),
            Severity::Critical => error!(kind = ?event.kind, product = %event.product.code, "{}", description),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "logging-listener"
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
