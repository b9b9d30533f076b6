//! Event correlation
//!
//! Connects the host's topic-info notifications to the pending
//! injection: when a starting line belongs to the pending topic, the
//! pending subtitle is materialized on the board. The sink itself is
//! stateless between events; all state lives in the registry and board.

use std::sync::Arc;

use crate::board::SubtitleBoard;
use crate::event::TopicInfoEvent;
use crate::registry::{InjectionRegistry, TopicSource};

/// Per-event correlation glue.
pub struct TopicEventSink {
    registry: Arc<InjectionRegistry>,
    board: SubtitleBoard,
    topics: Arc<dyn TopicSource + Send + Sync>,
}

impl TopicEventSink {
    pub fn new(
        registry: Arc<InjectionRegistry>,
        board: SubtitleBoard,
        topics: Arc<dyn TopicSource + Send + Sync>,
    ) -> Self {
        Self {
            registry,
            board,
            topics,
        }
    }

    /// Handle one notification.
    ///
    /// Inserts the pending subtitle with no expiry when the starting
    /// line belongs to the pending topic; the host's own line-end
    /// lifecycle removes it later. The registration is sticky: it is
    /// never consumed here and fires again on the next matching line.
    pub fn handle(&self, event: TopicInfoEvent) {
        log::debug!("Received event, topic info ID is {:x}", event.topic_info.0);

        if !event.is_starting() {
            log::debug!("Ignoring stopping event for {:x}", event.topic_info.0);
            return;
        }

        // One snapshot of the record, so a concurrent re-registration
        // cannot produce a mixed speaker/text insert
        let Some(record) = self.registry.pending() else {
            log::debug!("No pending injection, didn't inject subtitle");
            return;
        };

        if record.topic_contains(self.topics.as_ref(), event.topic_info) {
            self.board.insert(record.speaker, &record.subtitle, -1);
        } else {
            log::debug!("Didn't inject subtitle");
        }
    }
}
