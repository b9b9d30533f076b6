//! Injection subsystem state
//!
//! Owns the one registry and board the binding layer exposes. The
//! components stay constructor-injected and individually testable; the
//! global below exists only to serve the C boundary.

use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};

use crate::board::SubtitleBoard;
use crate::correlate::TopicEventSink;
use crate::event::{self, TopicInfoEvent};
use crate::registry::{InjectionRegistry, TopicSource};
use crate::types::{InjectError, InjectResult};

/// Global injection state, one per process.
pub static INJECT_STATE: LazyLock<RwLock<InjectState>> =
    LazyLock::new(|| RwLock::new(InjectState::new()));

/// Injection subsystem state
pub struct InjectState {
    /// Whether the subsystem passed startup validation
    initialized: bool,

    /// The single pending-injection slot
    registry: Arc<InjectionRegistry>,

    /// The shared list of displayed lines
    board: SubtitleBoard,

    /// Host-provided topic membership, registered after init
    topics: Option<Arc<dyn TopicSource + Send + Sync>>,
}

impl Default for InjectState {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectState {
    /// Create a fresh, uninitialized state.
    pub fn new() -> Self {
        Self {
            initialized: false,
            registry: Arc::new(InjectionRegistry::new()),
            board: SubtitleBoard::new(),
            topics: None,
        }
    }

    /// Validate host compatibility and mark the subsystem live.
    ///
    /// Layout or ABI mismatch is fatal here, before any event payload is
    /// ever read.
    pub fn init(&mut self, host_abi_version: u32) -> InjectResult<()> {
        if self.initialized {
            return Err(InjectError::AlreadyInitialized);
        }
        event::validate_event_layout()?;
        event::check_host_abi(host_abi_version)?;
        self.initialized = true;
        Ok(())
    }

    /// Drop back to a fresh state (host teardown, test isolation).
    pub fn uninit(&mut self) {
        *self = Self::new();
    }

    /// Check if initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register the host's topic membership source.
    pub fn set_topic_source(&mut self, topics: Arc<dyn TopicSource + Send + Sync>) {
        self.topics = Some(topics);
    }

    /// Get the pending-injection registry
    pub fn registry(&self) -> &Arc<InjectionRegistry> {
        &self.registry
    }

    /// Get the subtitle board
    pub fn board(&self) -> &SubtitleBoard {
        &self.board
    }

    /// Correlate one decoded notification against the pending injection.
    pub fn handle_event(&self, event: TopicInfoEvent) {
        if !self.initialized {
            log::debug!("Dropping event before init");
            return;
        }
        let Some(topics) = &self.topics else {
            log::debug!("No topic source registered, didn't inject subtitle");
            return;
        };
        let sink = TopicEventSink::new(self.registry.clone(), self.board.clone(), topics.clone());
        sink.handle(event);
    }
}
