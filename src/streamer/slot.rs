//! Per-stream slot state machine and checked-out frame token.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::sync::Arc;

use super::queue::FrameQueue;
use crate::source::FrameSource;

/// Stream slot lifecycle.
///
/// `Idle -> Playing -> {Playing | PlayingLastFrame} -> Ended`; `end` resets
/// any state back to `Idle`. A prefetch I/O error jumps straight to `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Idle,
    Playing,
    /// The buffered frame is still deliverable, but the source is exhausted.
    PlayingLastFrame,
    Ended,
}

pub(crate) struct SlotInner {
    pub state: SlotState,
    pub looping: bool,
    pub name: String,
    pub source: Option<Box<dyn FrameSource>>,
    pub queue: FrameQueue,
    /// Block currently checked out to the consumer, at most one.
    pub active: Option<usize>,
    /// Bumped on every successful checkout; stale `FrameRef`s read as `None`.
    pub checkout_seq: u64,
    /// Bumped on teardown; pending prefetch jobs with an older epoch no-op.
    pub epoch: u64,
}

impl SlotInner {
    pub fn new(block_size: usize) -> Self {
        Self {
            state: SlotState::Idle,
            looping: false,
            name: String::new(),
            source: None,
            queue: FrameQueue::new(block_size),
            active: None,
            checkout_seq: 0,
            epoch: 0,
        }
    }

    /// Playing in either variant, i.e. counted by `active_stream_count`.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SlotState::Playing | SlotState::PlayingLastFrame)
    }

    /// Release everything and return to `Idle`. Idempotent.
    ///
    /// The epoch bump cancels any prefetch job still queued or in flight
    /// for this slot; dropping the source closes it.
    pub fn reset(&mut self) {
        self.epoch += 1;
        if let Some(idx) = self.active.take() {
            self.queue.release(idx);
        }
        self.queue.clear();
        self.source = None;
        self.name.clear();
        self.looping = false;
        self.state = SlotState::Idle;
    }
}

/// Token for the one frame the consumer currently holds.
///
/// Issued by [`StreamManager::next_frame`](crate::StreamManager::next_frame);
/// superseded by the next call (or `end`) on the same slot, after which
/// [`bytes`](FrameRef::bytes) returns `None`. There is no explicit free:
/// the block returns to the pool when the token is superseded, so a
/// double-free is unrepresentable.
pub struct FrameRef {
    slot: Arc<Mutex<SlotInner>>,
    seq: u64,
    len: usize,
}

impl FrameRef {
    pub(crate) fn new(slot: Arc<Mutex<SlotInner>>, seq: u64, len: usize) -> Self {
        Self { slot, seq, len }
    }

    /// Frame payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the frame payload, or `None` if this token has been superseded.
    ///
    /// The guard holds the slot lock: drop it before calling `next_frame`
    /// or `end` on the same slot, or those calls will deadlock.
    pub fn bytes(&self) -> Option<MappedMutexGuard<'_, [u8]>> {
        let guard = self.slot.lock();
        if guard.checkout_seq != self.seq {
            return None;
        }
        let idx = guard.active?;
        Some(MutexGuard::map(guard, |slot| slot.queue.checked_out_mut(idx)))
    }

    /// Copy the frame payload out, or `None` if this token has been superseded.
    pub fn to_vec(&self) -> Option<Vec<u8>> {
        self.bytes().map(|b| b.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slot_is_idle() {
        let slot = SlotInner::new(16);
        assert_eq!(slot.state, SlotState::Idle);
        assert!(!slot.is_active());
        assert!(slot.queue.is_fully_free());
    }

    #[test]
    fn test_reset_is_idempotent_and_bumps_epoch() {
        let mut slot = SlotInner::new(16);
        slot.state = SlotState::Playing;
        slot.looping = true;
        slot.name.push_str("song.bin");

        let idx = slot.queue.vacant().unwrap();
        slot.queue.commit(idx, 4);
        let (idx, _) = slot.queue.pop_filled().unwrap();
        slot.active = Some(idx);

        slot.reset();
        assert_eq!(slot.state, SlotState::Idle);
        assert_eq!(slot.epoch, 1);
        assert!(slot.name.is_empty());
        assert!(slot.active.is_none());
        assert!(slot.queue.is_fully_free());

        slot.reset();
        assert_eq!(slot.state, SlotState::Idle);
        assert_eq!(slot.epoch, 2);
    }

    #[test]
    fn test_stale_frame_ref_reads_none() {
        let slot = Arc::new(Mutex::new(SlotInner::new(16)));
        {
            let mut guard = slot.lock();
            let idx = guard.queue.vacant().unwrap();
            guard.queue.block_mut(idx)[..2].copy_from_slice(&[7, 9]);
            guard.queue.commit(idx, 2);
            let (idx, _) = guard.queue.pop_filled().unwrap();
            guard.active = Some(idx);
            guard.checkout_seq = 1;
        }

        let frame = FrameRef::new(Arc::clone(&slot), 1, 2);
        assert_eq!(frame.to_vec().as_deref(), Some(&[7u8, 9][..]));

        // A newer checkout supersedes the token.
        slot.lock().checkout_seq = 2;
        assert!(frame.bytes().is_none());
    }
}
