//! Subtitle injection subsystem
//!
//! Lets scripted game logic register a pending subtitle "injection" for
//! a speaker/topic pair, correlates the host's topic-info start
//! notifications against it, and maintains the shared list of currently
//! displayed subtitle lines (speaker replacement, priority demotion,
//! optional timed expiry). The host loads this as a plugin and talks to
//! it through the C bindings in [`ffi`].

pub mod board;
pub mod correlate;
pub mod event;
pub mod ffi;
pub mod registry;
pub mod state;
pub mod types;

pub use board::{SubtitleBoard, SubtitleEntry};
pub use correlate::TopicEventSink;
pub use event::{RawTopicInfoEvent, TopicInfoEvent, SUPPORTED_HOST_ABI};
pub use registry::{InjectionRecord, InjectionRegistry, MemoryTopicSource, TopicSource};
pub use types::{ActorId, FormId, InjectError, InjectResult, TopicId, TopicInfoId};
