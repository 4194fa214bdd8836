//! Background prefetch worker.
//!
//! One dedicated thread executes prefetch jobs strictly in submission
//! order across all slots, so storage sees a single reader and teardown
//! can drain deterministically with one marker message.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thread_priority::ThreadPriority;
use tracing::{debug, error, warn};

use super::slot::{SlotInner, SlotState};
use crate::source::{FrameRead, FrameSource, FrameSourceProvider};

pub(crate) enum Job {
    Prefetch {
        slot: Arc<Mutex<SlotInner>>,
        slot_id: usize,
        epoch: u64,
    },
    /// Acknowledged once every previously submitted job has completed.
    Drain(Sender<()>),
    Shutdown,
}

pub(crate) struct PrefetchWorker {
    tx: Sender<Job>,
    handle: Option<JoinHandle<()>>,
}

impl PrefetchWorker {
    pub fn spawn(provider: Arc<dyn FrameSourceProvider>, max_frame_size: usize) -> Self {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("frame-prefetch".into())
            .spawn(move || {
                let _ = thread_priority::set_current_thread_priority(ThreadPriority::Max);
                worker_loop(rx, provider, max_frame_size);
            })
            .expect("Failed to spawn prefetch thread");

        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Queue a prefetch for the slot's next frame. Never blocks.
    pub fn submit_prefetch(&self, slot: Arc<Mutex<SlotInner>>, slot_id: usize, epoch: u64) {
        let _ = self.tx.send(Job::Prefetch {
            slot,
            slot_id,
            epoch,
        });
    }

    /// Block until every queued and in-flight job has completed.
    pub fn drain(&self) {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if self.tx.send(Job::Drain(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    pub fn shutdown(&mut self) {
        let _ = self.tx.send(Job::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PrefetchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(rx: Receiver<Job>, provider: Arc<dyn FrameSourceProvider>, max_frame_size: usize) {
    let mut scratch = vec![0u8; max_frame_size];

    for job in rx.iter() {
        match job {
            Job::Shutdown => break,
            Job::Drain(ack) => {
                let _ = ack.send(());
            }
            Job::Prefetch {
                slot,
                slot_id,
                epoch,
            } => prefetch(provider.as_ref(), &slot, slot_id, epoch, &mut scratch),
        }
    }
}

/// What a fetch produced; the source travels with the result so it can be
/// put back into the slot (looping may have replaced it).
enum Fetched {
    Frame {
        len: usize,
        source: Box<dyn FrameSource>,
    },
    End {
        source: Box<dyn FrameSource>,
    },
}

fn prefetch(
    provider: &dyn FrameSourceProvider,
    slot: &Mutex<SlotInner>,
    slot_id: usize,
    epoch: u64,
    scratch: &mut [u8],
) {
    // Take the source out so the blocking read happens without the slot
    // lock; the consumer's next_frame never waits on storage.
    let (source, name, looping) = {
        let mut guard = slot.lock();
        if guard.epoch != epoch || guard.state != SlotState::Playing {
            return;
        }
        let Some(source) = guard.source.take() else {
            return;
        };
        (source, guard.name.clone(), guard.looping)
    };

    let outcome = fetch(source, provider, &name, looping, scratch);

    let mut guard = slot.lock();
    if guard.epoch != epoch {
        // Slot was torn down while we were reading; the taken source is
        // dropped here and the frame discarded.
        return;
    }

    match outcome {
        Ok(Fetched::Frame { len, source }) => {
            guard.source = Some(source);
            match guard.queue.vacant() {
                Some(idx) => {
                    guard.queue.block_mut(idx)[..len].copy_from_slice(&scratch[..len]);
                    guard.queue.commit(idx, len);
                }
                None => warn!(slot_id, "prefetched frame dropped: no vacant block"),
            }
        }
        Ok(Fetched::End { source }) => {
            debug!(slot_id, "source exhausted, delivering last buffered frame");
            guard.source = Some(source);
            guard.state = SlotState::PlayingLastFrame;
        }
        Err(e) => {
            // Terminal for this slot only; surfaced on the next next_frame.
            error!(slot_id, "prefetch failed: {e}");
            guard.state = SlotState::Ended;
        }
    }
}

fn fetch(
    mut source: Box<dyn FrameSource>,
    provider: &dyn FrameSourceProvider,
    name: &str,
    looping: bool,
    scratch: &mut [u8],
) -> io::Result<Fetched> {
    match source.read_next(scratch)? {
        FrameRead::Frame(len) => Ok(Fetched::Frame { len, source }),
        FrameRead::EndOfSource if looping => {
            debug!(name, "restarting looped stream");
            let mut source = provider.open(name)?;
            match source.read_next(scratch)? {
                FrameRead::Frame(len) => Ok(Fetched::Frame { len, source }),
                FrameRead::EndOfSource => Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "looped source is empty after reopen",
                )),
            }
        }
        FrameRead::EndOfSource => Ok(Fetched::End { source }),
    }
}
