//! Host event payload adapter
//!
//! The host delivers topic-info notifications as a raw struct whose
//! definition is not part of its public headers, so the field offsets
//! here are an assumption about the host build. The assumed layout is an
//! explicit `#[repr(C)]` mirror that is validated once at startup and
//! versioned against the host ABI; a layout drift fails fast instead of
//! misreading memory.

use memoffset::offset_of;
use std::ffi::c_void;

use crate::types::{InjectError, InjectResult, TopicInfoId};

/// Host ABI version this build was written against. The host passes its
/// version at init; anything else is a fatal compatibility error.
pub const SUPPORTED_HOST_ABI: u32 = 1;

/// Mirror of the host's topic-info event payload (64-bit layout).
///
/// Two pointer-sized fields precede the topic-info form id, which sits
/// at offset 0x10; the stop flag sits at 0x18. The speaker pointer is
/// deliberately opaque: the correlation path takes the speaker from the
/// pending registration, never from host memory.
#[repr(C)]
pub struct RawTopicInfoEvent {
    pub speaker: *const c_void,
    pub callback: *const c_void,
    pub topic_info_id: u32,
    _pad: u32,
    /// 0 while the line is starting, non-zero when stopping.
    pub stopping: u8,
    _tail: [u8; 7],
}

impl RawTopicInfoEvent {
    /// Build a payload value in-process (test hosts; the real host
    /// writes its own and passes a pointer across the boundary).
    pub fn new(topic_info_id: u32, stopping: bool) -> Self {
        Self {
            speaker: std::ptr::null(),
            callback: std::ptr::null(),
            topic_info_id,
            _pad: 0,
            stopping: stopping as u8,
            _tail: [0; 7],
        }
    }
}

/// Expected field offsets and total size of the raw payload.
const TOPIC_INFO_ID_OFFSET: usize = 0x10;
const STOPPING_OFFSET: usize = 0x18;
const RAW_EVENT_SIZE: usize = 0x20;

/// Decoded notification: just the pieces the core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicInfoEvent {
    pub topic_info: TopicInfoId,
    pub stopping: bool,
}

impl TopicInfoEvent {
    /// A line-start notification for `info`.
    pub fn start(info: TopicInfoId) -> Self {
        Self {
            topic_info: info,
            stopping: false,
        }
    }

    /// A line-stop notification for `info`.
    pub fn stop(info: TopicInfoId) -> Self {
        Self {
            topic_info: info,
            stopping: true,
        }
    }

    pub fn is_starting(&self) -> bool {
        !self.stopping
    }
}

/// Verify the compiled mirror matches the layout the host hands us.
///
/// This cannot prove the host's struct is what we think it is, but it
/// rejects the cases we can detect: non-64-bit targets and any drift
/// between the mirror and the documented offsets.
pub fn validate_event_layout() -> InjectResult<()> {
    if std::mem::size_of::<*const c_void>() != 8 {
        return Err(InjectError::LayoutMismatch(
            "host payload layout assumes 64-bit pointers".to_string(),
        ));
    }

    let id_offset = offset_of!(RawTopicInfoEvent, topic_info_id);
    if id_offset != TOPIC_INFO_ID_OFFSET {
        return Err(InjectError::LayoutMismatch(format!(
            "topic_info_id at offset {:#x}, expected {:#x}",
            id_offset, TOPIC_INFO_ID_OFFSET
        )));
    }

    let flag_offset = offset_of!(RawTopicInfoEvent, stopping);
    if flag_offset != STOPPING_OFFSET {
        return Err(InjectError::LayoutMismatch(format!(
            "stopping flag at offset {:#x}, expected {:#x}",
            flag_offset, STOPPING_OFFSET
        )));
    }

    let size = std::mem::size_of::<RawTopicInfoEvent>();
    if size != RAW_EVENT_SIZE {
        return Err(InjectError::LayoutMismatch(format!(
            "payload size {:#x}, expected {:#x}",
            size, RAW_EVENT_SIZE
        )));
    }

    Ok(())
}

/// Verify the host's reported ABI version.
pub fn check_host_abi(version: u32) -> InjectResult<()> {
    if version != SUPPORTED_HOST_ABI {
        return Err(InjectError::UnsupportedHostAbi {
            got: version,
            supported: SUPPORTED_HOST_ABI,
        });
    }
    Ok(())
}

/// Decode a raw host payload. Returns `None` for a null pointer.
///
/// # Safety
/// `raw`, if non-null, must point to a live host payload matching the
/// layout accepted by [`validate_event_layout`].
pub unsafe fn decode_raw(raw: *const RawTopicInfoEvent) -> Option<TopicInfoEvent> {
    if raw.is_null() {
        return None;
    }
    let event = &*raw;
    Some(TopicInfoEvent {
        topic_info: TopicInfoId(event.topic_info_id),
        stopping: event.stopping != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_layout_is_valid_on_this_target() {
        // Development targets are 64-bit; the check exists for the
        // host's sake, not ours
        validate_event_layout().unwrap();
    }

    #[test]
    fn test_abi_check() {
        assert!(check_host_abi(SUPPORTED_HOST_ABI).is_ok());
        assert!(matches!(
            check_host_abi(SUPPORTED_HOST_ABI + 1),
            Err(InjectError::UnsupportedHostAbi { .. })
        ));
    }

    #[test]
    fn test_decode_raw_start_event() {
        let raw = RawTopicInfoEvent::new(0xABCD, false);
        let event = unsafe { decode_raw(&raw) }.unwrap();
        assert_eq!(event.topic_info, TopicInfoId(0xABCD));
        assert!(event.is_starting());
    }

    #[test]
    fn test_decode_raw_stop_event() {
        let raw = RawTopicInfoEvent::new(0xABCD, true);
        let event = unsafe { decode_raw(&raw) }.unwrap();
        assert!(!event.is_starting());
    }

    #[test]
    fn test_decode_raw_null() {
        assert!(unsafe { decode_raw(ptr::null()) }.is_none());
    }

    #[test]
    fn test_event_constructors() {
        assert!(TopicInfoEvent::start(TopicInfoId(1)).is_starting());
        assert!(!TopicInfoEvent::stop(TopicInfoId(1)).is_starting());
    }
}
