//! Fixed pool of stream slots with background prefetch.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::slot::{FrameRef, SlotInner, SlotState};
use super::worker::PrefetchWorker;
use crate::config::StreamerConfig;
use crate::error::{Error, Result};
use crate::source::{FrameRead, FrameSourceProvider};

/// Fixed pool of stream slots feeding a periodic real-time consumer.
///
/// The pool is allocated once at construction. `next_frame` is
/// non-blocking: it swaps buffer ownership and queues a prefetch; the
/// storage read happens on the worker thread.
pub struct StreamManager {
    slots: Vec<Arc<Mutex<SlotInner>>>,
    worker: PrefetchWorker,
    provider: Arc<dyn FrameSourceProvider>,
    config: StreamerConfig,
}

impl StreamManager {
    /// Create the slot pool and start the prefetch worker.
    pub fn new(provider: Arc<dyn FrameSourceProvider>, config: StreamerConfig) -> Self {
        let slots = (0..config.max_streams)
            .map(|_| Arc::new(Mutex::new(SlotInner::new(config.max_frame_size))))
            .collect();
        let worker = PrefetchWorker::spawn(Arc::clone(&provider), config.max_frame_size);

        Self {
            slots,
            worker,
            provider,
            config,
        }
    }

    /// Open `name`, prime its first frame and start playing in a free slot.
    ///
    /// Fails atomically: on any error the slot is left `Idle` and the
    /// source is closed.
    pub fn register(&self, name: &str, looping: bool) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        if name.len() > self.config.max_name_len {
            return Err(Error::NameTooLong(self.config.max_name_len));
        }

        for (slot_id, slot) in self.slots.iter().enumerate() {
            let mut guard = slot.lock();
            if guard.state != SlotState::Idle {
                continue;
            }

            let mut source = self.provider.open(name).map_err(|e| Error::SourceOpen {
                name: name.to_string(),
                source: e,
            })?;

            // Prime one frame synchronously so the first next_frame call
            // can return immediately.
            let mut scratch = vec![0u8; self.config.max_frame_size];
            let len = match source.read_next(&mut scratch)? {
                FrameRead::Frame(len) => len,
                FrameRead::EndOfSource => return Err(Error::EmptySource(name.to_string())),
            };

            let idx = guard.queue.vacant().expect("idle slot has no free block");
            guard.queue.block_mut(idx)[..len].copy_from_slice(&scratch[..len]);
            guard.queue.commit(idx, len);

            guard.name.clear();
            guard.name.push_str(name);
            guard.source = Some(source);
            guard.looping = looping;
            guard.state = SlotState::Playing;

            debug!(slot_id, name, looping, "stream registered");
            return Ok(slot_id);
        }

        Err(Error::NoFreeSlot)
    }

    /// Release the previously returned frame, check out the next buffered
    /// one and queue a prefetch for the frame after it.
    ///
    /// Returns [`Error::EndOfStream`] exactly once when a non-looping
    /// source runs out, after which the slot reports
    /// [`Error::NotPlaying`] until `end` resets it. Returns
    /// [`Error::NoFrameReady`] when the consumer outruns the worker; the
    /// slot keeps playing and the call can simply be retried.
    pub fn next_frame(&self, slot_id: usize) -> Result<FrameRef> {
        let slot = self.slot(slot_id)?;
        let mut guard = slot.lock();

        if !guard.is_active() {
            return Err(Error::NotPlaying(slot_id));
        }

        // The previous frame_ref is superseded even if this call fails.
        if let Some(idx) = guard.active.take() {
            guard.queue.release(idx);
        }

        if guard.state == SlotState::PlayingLastFrame {
            guard.state = SlotState::Ended;
            return Err(Error::EndOfStream);
        }

        let (idx, len) = guard.queue.pop_filled().ok_or(Error::NoFrameReady)?;
        guard.active = Some(idx);
        guard.checkout_seq += 1;
        let seq = guard.checkout_seq;
        let epoch = guard.epoch;
        drop(guard);

        self.worker.submit_prefetch(Arc::clone(slot), slot_id, epoch);
        Ok(FrameRef::new(Arc::clone(slot), seq, len))
    }

    /// Stop a stream and return its slot to the pool. Idempotent.
    ///
    /// Pending prefetch jobs for the slot are cancelled via the epoch bump;
    /// an in-flight read discards its result.
    pub fn end(&self, slot_id: usize) -> Result<()> {
        let slot = self.slot(slot_id)?;
        let mut guard = slot.lock();
        if guard.state != SlotState::Idle {
            debug!(slot_id, "stream ended");
        }
        guard.reset();
        Ok(())
    }

    /// Drain the prefetch worker, then end every non-idle slot.
    ///
    /// Blocks until no queued or in-flight job remains, so no job can
    /// write into a block freed here.
    pub fn clear_all(&self) {
        self.worker.drain();
        for slot in &self.slots {
            let mut guard = slot.lock();
            if guard.state != SlotState::Idle {
                guard.reset();
            }
        }
        debug!("all streams cleared");
    }

    /// Number of slots currently in either playing state.
    pub fn active_stream_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.lock().is_active())
            .count()
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// True when every block of every slot is back in the free pool.
    pub fn is_pool_idle(&self) -> bool {
        self.slots.iter().all(|slot| {
            let guard = slot.lock();
            guard.state == SlotState::Idle && guard.queue.is_fully_free()
        })
    }

    fn slot(&self, slot_id: usize) -> Result<&Arc<Mutex<SlotInner>>> {
        self.slots.get(slot_id).ok_or(Error::InvalidHandle(slot_id))
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.worker.shutdown();
    }
}
