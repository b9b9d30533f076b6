//! Shared subtitle board
//!
//! The list of currently displayed subtitle lines, guarded by a single
//! exclusive lock. Insertion replaces any existing line for the same
//! speaker and demotes every other line's display priority; a
//! non-negative duration schedules removal on a detached timer thread.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::types::ActorId;

/// One displayed subtitle line.
///
/// `speaker` is a lookup handle only; the host owns the actor. The
/// crate-private `id` identifies the insert that created the entry, so a
/// scheduled removal targets exactly its own entry and a stale timer can
/// never take out a newer line for the same speaker.
#[derive(Debug, Clone)]
pub struct SubtitleEntry {
    pub(crate) id: u64,
    pub speaker: ActorId,
    pub text: String,
    /// Preferred for on-screen display over co-existing entries.
    pub force_display: bool,
}

#[derive(Debug, Default)]
struct BoardInner {
    entries: Mutex<Vec<SubtitleEntry>>,
    next_id: AtomicU64,
}

/// The shared board. Cloning yields another handle to the same list, so
/// timer threads and the event path mutate one set of entries.
#[derive(Debug, Clone, Default)]
pub struct SubtitleBoard {
    inner: Arc<BoardInner>,
}

impl SubtitleBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subtitle line for `speaker`.
    ///
    /// Under the lock: every existing entry loses its display priority,
    /// any existing entry for `speaker` is removed, and the new entry is
    /// appended with priority set. If `ms_to_show` is non-negative a
    /// detached timer removes the entry after that many milliseconds;
    /// negative means an external lifecycle event will remove it.
    pub fn insert(&self, speaker: ActorId, text: &str, ms_to_show: i32) {
        log::debug!(
            "Injecting subtitle for speaker {:x} with subtitle \"{}\"",
            speaker.0,
            text
        );
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut entries = self.inner.entries.lock();
            // De-prioritize other subtitles so the new one shows, and
            // drop any line the same speaker already has.
            entries.retain_mut(|entry| {
                entry.force_display = false;
                entry.speaker != speaker
            });
            entries.push(SubtitleEntry {
                id,
                speaker,
                text: text.to_string(),
                force_display: true,
            });
        }

        if ms_to_show >= 0 {
            // A timed insert is not attached to a real host dialogue
            // line, so nothing external will ever expire it. One
            // detached thread per timed insert; it re-checks by entry id
            // at fire time, so firing after replacement is a no-op.
            let board = self.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(ms_to_show as u64));
                board.remove_expired(speaker, id);
            });
        }
    }

    /// Timer-side removal: drop the entry with this exact id, if it is
    /// still on the board.
    fn remove_expired(&self, speaker: ActorId, id: u64) {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() < before {
            log::debug!("Expired subtitle for speaker {:x}", speaker.0);
        } else {
            log::debug!(
                "Expiry for speaker {:x} found nothing to remove (already replaced)",
                speaker.0
            );
        }
    }

    /// Remove the entry for `speaker`, if present. Host hook for natural
    /// line-end cleanup. Returns whether an entry was removed; a missing
    /// speaker is normal, not a failure.
    pub fn remove_for_speaker(&self, speaker: ActorId) -> bool {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.speaker != speaker);
        let removed = entries.len() < before;
        if removed {
            log::debug!("Removed subtitle for speaker {:x}", speaker.0);
        }
        removed
    }

    /// Value copy of the current entries, taken under the lock.
    pub fn snapshot(&self) -> Vec<SubtitleEntry> {
        self.inner.entries.lock().clone()
    }

    /// Currently displayed text for `speaker`, if any.
    pub fn text_for_speaker(&self, speaker: ActorId) -> Option<String> {
        self.inner
            .entries
            .lock()
            .iter()
            .find(|entry| entry.speaker == speaker)
            .map(|entry| entry.text.clone())
    }

    /// Number of displayed entries.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether no entries are displayed.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }
}
