//! Pending-injection registry
//!
//! Holds the single pending injection record (speaker, topic, subtitle
//! text) and answers whether a notified topic-info belongs to the
//! pending topic. The record is sticky: the event path never clears it,
//! only a new registration overwrites it.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::{ActorId, InjectError, InjectResult, TopicId, TopicInfoId};

/// Host boundary for topic membership.
///
/// Topics group an ordered set of topic-infos; the host owns that data,
/// so enumeration goes through this trait and happens live at match time.
pub trait TopicSource {
    /// The topic-info ids belonging to `topic`, in host order.
    /// Unknown topics enumerate as empty.
    fn topic_infos(&self, topic: TopicId) -> Vec<TopicInfoId>;
}

/// The pending injection: which subtitle to force for which speaker when
/// a line of which topic starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionRecord {
    pub speaker: ActorId,
    pub topic: TopicId,
    pub subtitle: String,
}

impl InjectionRecord {
    /// Linear scan of the record's topic for `info`. Topics have small,
    /// bounded member counts, so no index is kept.
    pub fn topic_contains(&self, topics: &dyn TopicSource, info: TopicInfoId) -> bool {
        log::debug!(
            "Checking if topic {:x} contains topic-info {:x}",
            self.topic.0,
            info.0
        );
        for member in topics.topic_infos(self.topic) {
            log::debug!(
                "Checking if topic {:x}'s topic-info {:x} == {:x}",
                self.topic.0,
                member.0,
                info.0
            );
            if member == info {
                return true;
            }
        }
        false
    }
}

/// Registry holding at most one pending injection record.
///
/// The record is written whole under the lock and read out as a clone,
/// so readers never observe a mixed old/new record.
#[derive(Debug, Default)]
pub struct InjectionRegistry {
    pending: RwLock<Option<InjectionRecord>>,
}

impl InjectionRegistry {
    /// Create an empty registry (no pending injection).
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally overwrite the pending record.
    ///
    /// Null form ids are rejected rather than stored, so the event path
    /// never sees a record pointing at the null form.
    pub fn set_pending(
        &self,
        speaker: ActorId,
        topic: TopicId,
        subtitle: &str,
    ) -> InjectResult<()> {
        if !speaker.is_valid() {
            return Err(InjectError::InvalidArgument("speaker form id is null"));
        }
        if !topic.is_valid() {
            return Err(InjectError::InvalidArgument("topic form id is null"));
        }

        log::debug!(
            "Set inject for topic {:x} with subtitle \"{}\"",
            topic.0,
            subtitle
        );
        *self.pending.write() = Some(InjectionRecord {
            speaker,
            topic,
            subtitle: subtitle.to_string(),
        });
        Ok(())
    }

    /// Snapshot of the pending record, if any.
    pub fn pending(&self) -> Option<InjectionRecord> {
        self.pending.read().clone()
    }

    /// Whether a pending record exists.
    pub fn has_pending(&self) -> bool {
        self.pending.read().is_some()
    }

    /// Whether the pending topic (if any) contains `info`.
    /// False when nothing is pending.
    pub fn matches(&self, topics: &dyn TopicSource, info: TopicInfoId) -> bool {
        match self.pending() {
            Some(record) => record.topic_contains(topics, info),
            None => false,
        }
    }
}

/// Map-backed topic membership, for tests and for hosts that push their
/// topic tables across the boundary instead of registering an enumerator.
#[derive(Debug, Default)]
pub struct MemoryTopicSource {
    topics: HashMap<TopicId, Vec<TopicInfoId>>,
}

impl MemoryTopicSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the member topic-infos of `topic`, replacing any previous set.
    pub fn set_topic(&mut self, topic: TopicId, infos: Vec<TopicInfoId>) {
        self.topics.insert(topic, infos);
    }
}

impl TopicSource for MemoryTopicSource {
    fn topic_infos(&self, topic: TopicId) -> Vec<TopicInfoId> {
        self.topics.get(&topic).cloned().unwrap_or_default()
    }
}
