//! C FFI bindings for the injection subsystem
//!
//! The host's scripting binding layer calls these; payload-layout and
//! ABI validation happens once in `rust_InjectInit`, before any event
//! pointer is trusted. Boolean results are `c_int` 1/0.

use std::ffi::{c_char, c_int, c_uint, CStr};
use std::sync::Arc;

use crate::event::{decode_raw, RawTopicInfoEvent};
use crate::registry::TopicSource;
use crate::state::INJECT_STATE;
use crate::types::{ActorId, FormId, TopicId, TopicInfoId};

/// Host callback enumerating a topic's topic-info form ids.
///
/// Writes up to `cap` ids into `out` and returns the topic's total
/// member count (which may exceed `cap`; the caller retries with a
/// larger buffer).
pub type TopicInfoEnumFn = unsafe extern "C" fn(topic: FormId, out: *mut FormId, cap: c_uint) -> c_uint;

/// Live topic membership backed by the host enumerator callback.
struct HostTopicSource {
    enumerate: TopicInfoEnumFn,
}

impl TopicSource for HostTopicSource {
    fn topic_infos(&self, topic: TopicId) -> Vec<TopicInfoId> {
        let mut buf: Vec<FormId> = vec![0; 32];
        loop {
            let total =
                unsafe { (self.enumerate)(topic.0, buf.as_mut_ptr(), buf.len() as c_uint) }
                    as usize;
            if total <= buf.len() {
                return buf[..total].iter().map(|&id| TopicInfoId(id)).collect();
            }
            buf.resize(total, 0);
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the injection subsystem.
///
/// Validates the event payload layout and the host's ABI version; a
/// mismatch returns 0 and the host must treat that as fatal.
#[no_mangle]
pub extern "C" fn rust_InjectInit(host_abi_version: c_uint) -> c_int {
    match INJECT_STATE.write().init(host_abi_version) {
        Ok(()) => 1,
        Err(e) => {
            log::error!("Injection init failed: {}", e);
            0
        }
    }
}

/// Tear the subsystem back down to a fresh state.
#[no_mangle]
pub extern "C" fn rust_InjectUninit() {
    INJECT_STATE.write().uninit();
}

/// Check if the subsystem is initialized
#[no_mangle]
pub extern "C" fn rust_IsInjectInitialized() -> c_int {
    if INJECT_STATE.read().is_initialized() {
        1
    } else {
        0
    }
}

/// Register the host callback used to enumerate topic membership.
#[no_mangle]
pub extern "C" fn rust_SetTopicInfoEnumerator(enumerate: TopicInfoEnumFn) {
    INJECT_STATE
        .write()
        .set_topic_source(Arc::new(HostTopicSource { enumerate }));
}

// ============================================================================
// Script-facing operations
// ============================================================================

/// Register the pending injection: `subtitle` will display for `speaker`
/// whenever a line of `topic` starts, until overwritten.
///
/// Returns 0 only for a null form id or subtitle pointer.
#[no_mangle]
pub extern "C" fn rust_SetInjectTopicAndSubtitleForSpeaker(
    speaker: c_uint,
    topic: c_uint,
    subtitle: *const c_char,
) -> c_int {
    let Some(subtitle) = cstr_arg(subtitle) else {
        log::error!("SetInjectTopicAndSubtitleForSpeaker: null subtitle");
        return 0;
    };

    let state = INJECT_STATE.read();
    match state
        .registry()
        .set_pending(ActorId(speaker), TopicId(topic), &subtitle)
    {
        Ok(()) => 1,
        Err(e) => {
            log::error!("SetInjectTopicAndSubtitleForSpeaker: {}", e);
            0
        }
    }
}

/// Directly display `subtitle` for `speaker`.
///
/// `ms_to_show < 0` means cleanup is external (an overriding subtitle
/// for someone already speaking); otherwise the entry expires itself
/// after that many milliseconds.
#[no_mangle]
pub extern "C" fn rust_AddTopicAndSubtitleForSpeaker(
    speaker: c_uint,
    subtitle: *const c_char,
    ms_to_show: c_int,
) -> c_int {
    let Some(subtitle) = cstr_arg(subtitle) else {
        log::error!("AddTopicAndSubtitleForSpeaker: null subtitle");
        return 0;
    };
    let speaker = ActorId(speaker);
    if !speaker.is_valid() {
        log::error!("AddTopicAndSubtitleForSpeaker: null speaker form id");
        return 0;
    }

    INJECT_STATE.read().board().insert(speaker, &subtitle, ms_to_show);
    1
}

// ============================================================================
// Host event delivery
// ============================================================================

/// Deliver one raw topic-info notification from the host's dispatch.
///
/// # Safety
/// `event`, if non-null, must point to a payload matching the layout
/// validated by `rust_InjectInit`.
#[no_mangle]
pub unsafe extern "C" fn rust_OnTopicInfoEvent(event: *const RawTopicInfoEvent) {
    let Some(event) = decode_raw(event) else {
        log::debug!("Ignoring null topic-info event");
        return;
    };
    INJECT_STATE.read().handle_event(event);
}

// ============================================================================
// Renderer / lifecycle surface
// ============================================================================

/// Remove the displayed line for `speaker` (natural line-end cleanup).
/// Returns 1 if a line was removed; a missing speaker is normal.
#[no_mangle]
pub extern "C" fn rust_RemoveSubtitleForSpeaker(speaker: c_uint) -> c_int {
    if INJECT_STATE.read().board().remove_for_speaker(ActorId(speaker)) {
        1
    } else {
        0
    }
}

/// Number of currently displayed lines.
#[no_mangle]
pub extern "C" fn rust_SubtitleCount() -> c_uint {
    INJECT_STATE.read().board().len() as c_uint
}

/// Copy the displayed text for `speaker` into `buf` (NUL-terminated,
/// truncated to `cap`). Returns 1 if the speaker has a line.
#[no_mangle]
pub extern "C" fn rust_SubtitleTextForSpeaker(
    speaker: c_uint,
    buf: *mut c_char,
    cap: c_uint,
) -> c_int {
    if buf.is_null() || cap == 0 {
        return 0;
    }
    let Some(text) = INJECT_STATE.read().board().text_for_speaker(ActorId(speaker)) else {
        return 0;
    };

    let bytes = text.as_bytes();
    let n = bytes.len().min(cap as usize - 1);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf as *mut u8, n);
        *buf.add(n) = 0;
    }
    1
}

/// Copy a C string argument out, treating null as absent.
fn cstr_arg(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SUPPORTED_HOST_ABI;
    use serial_test::serial;
    use std::ffi::CString;
    use std::ptr;

    // Fixed topic table for the enumerator callback: topic 0x100 has
    // members {0x1, 0x2, 0x3}
    unsafe extern "C" fn test_enumerator(topic: FormId, out: *mut FormId, cap: c_uint) -> c_uint {
        if topic != 0x100 {
            return 0;
        }
        let members = [0x1u32, 0x2, 0x3];
        for (i, &id) in members.iter().take(cap as usize).enumerate() {
            *out.add(i) = id;
        }
        members.len() as c_uint
    }

    fn reset() {
        rust_InjectUninit();
        assert_eq!(rust_InjectInit(SUPPORTED_HOST_ABI), 1);
        rust_SetTopicInfoEnumerator(test_enumerator);
    }

    fn raw_start_event(topic_info_id: u32) -> RawTopicInfoEvent {
        RawTopicInfoEvent::new(topic_info_id, false)
    }

    fn text_for(speaker: u32) -> Option<String> {
        let mut buf = [0i8; 128];
        if rust_SubtitleTextForSpeaker(speaker, buf.as_mut_ptr() as *mut c_char, 128) == 0 {
            return None;
        }
        let cstr = unsafe { CStr::from_ptr(buf.as_ptr() as *const c_char) };
        Some(cstr.to_string_lossy().into_owned())
    }

    #[test]
    #[serial]
    fn test_init_rejects_unknown_abi() {
        rust_InjectUninit();
        assert_eq!(rust_InjectInit(SUPPORTED_HOST_ABI + 1), 0);
        assert_eq!(rust_IsInjectInitialized(), 0);
        assert_eq!(rust_InjectInit(SUPPORTED_HOST_ABI), 1);
        assert_eq!(rust_IsInjectInitialized(), 1);
        rust_InjectUninit();
    }

    #[test]
    #[serial]
    fn test_set_and_fire_injection() {
        reset();
        let subtitle = CString::new("Well met").unwrap();
        assert_eq!(
            rust_SetInjectTopicAndSubtitleForSpeaker(0x14, 0x100, subtitle.as_ptr()),
            1
        );

        let event = raw_start_event(0x2);
        unsafe { rust_OnTopicInfoEvent(&event) };

        assert_eq!(rust_SubtitleCount(), 1);
        assert_eq!(text_for(0x14).as_deref(), Some("Well met"));
        rust_InjectUninit();
    }

    #[test]
    #[serial]
    fn test_non_matching_event_inserts_nothing() {
        reset();
        let subtitle = CString::new("Well met").unwrap();
        rust_SetInjectTopicAndSubtitleForSpeaker(0x14, 0x100, subtitle.as_ptr());

        let event = raw_start_event(0x9);
        unsafe { rust_OnTopicInfoEvent(&event) };

        assert_eq!(rust_SubtitleCount(), 0);
        rust_InjectUninit();
    }

    #[test]
    #[serial]
    fn test_set_rejects_null_ids() {
        reset();
        let subtitle = CString::new("x").unwrap();
        assert_eq!(
            rust_SetInjectTopicAndSubtitleForSpeaker(0, 0x100, subtitle.as_ptr()),
            0
        );
        assert_eq!(
            rust_SetInjectTopicAndSubtitleForSpeaker(0x14, 0, subtitle.as_ptr()),
            0
        );
        assert_eq!(
            rust_SetInjectTopicAndSubtitleForSpeaker(0x14, 0x100, ptr::null()),
            0
        );
        rust_InjectUninit();
    }

    #[test]
    #[serial]
    fn test_direct_add_and_remove() {
        reset();
        let subtitle = CString::new("direct").unwrap();
        assert_eq!(
            rust_AddTopicAndSubtitleForSpeaker(0x15, subtitle.as_ptr(), -1),
            1
        );
        assert_eq!(text_for(0x15).as_deref(), Some("direct"));

        assert_eq!(rust_RemoveSubtitleForSpeaker(0x15), 1);
        assert_eq!(rust_RemoveSubtitleForSpeaker(0x15), 0);
        assert_eq!(rust_SubtitleCount(), 0);
        rust_InjectUninit();
    }

    #[test]
    #[serial]
    fn test_text_copy_truncates() {
        reset();
        let subtitle = CString::new("a long subtitle line").unwrap();
        rust_AddTopicAndSubtitleForSpeaker(0x15, subtitle.as_ptr(), -1);

        let mut buf = [0i8; 8];
        assert_eq!(
            rust_SubtitleTextForSpeaker(0x15, buf.as_mut_ptr() as *mut c_char, 8),
            1
        );
        let copied = unsafe { CStr::from_ptr(buf.as_ptr() as *const c_char) };
        assert_eq!(copied.to_bytes().len(), 7);
        rust_InjectUninit();
    }
}
