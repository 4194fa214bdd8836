//! Slab-backed double buffer for prefetched frames.
//!
//! Two fixed-size blocks carved out of one slab. A block is Free,
//! Filled (readable, FIFO ordered) or CheckedOut (held by the consumer);
//! capacity never changes after construction.

/// Blocks per stream slot: one being consumed, one being prefetched.
pub const FRAMES_PER_SLOT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Free,
    Filled { len: usize },
    CheckedOut { len: usize },
}

pub(crate) struct FrameQueue {
    slab: Box<[u8]>,
    block_size: usize,
    states: [BlockState; FRAMES_PER_SLOT],
    /// Filled block indices, oldest first.
    order: [Option<usize>; FRAMES_PER_SLOT],
}

impl FrameQueue {
    pub fn new(block_size: usize) -> Self {
        Self {
            slab: vec![0u8; FRAMES_PER_SLOT * block_size].into_boxed_slice(),
            block_size,
            states: [BlockState::Free; FRAMES_PER_SLOT],
            order: [None; FRAMES_PER_SLOT],
        }
    }

    /// Index of the first free block, if any.
    pub fn vacant(&self) -> Option<usize> {
        self.states.iter().position(|s| *s == BlockState::Free)
    }

    /// Writable view of a free block.
    pub fn block_mut(&mut self, idx: usize) -> &mut [u8] {
        debug_assert_eq!(self.states[idx], BlockState::Free);
        let start = idx * self.block_size;
        &mut self.slab[start..start + self.block_size]
    }

    /// Mark a free block as filled with `len` readable bytes.
    pub fn commit(&mut self, idx: usize, len: usize) {
        debug_assert_eq!(self.states[idx], BlockState::Free);
        debug_assert!(len <= self.block_size);
        self.states[idx] = BlockState::Filled { len };
        let free = self
            .order
            .iter()
            .position(|e| e.is_none())
            .expect("more filled blocks than capacity");
        self.order[free] = Some(idx);
    }

    /// Check out the oldest filled block, returning its index and length.
    pub fn pop_filled(&mut self) -> Option<(usize, usize)> {
        let idx = self.order[0].take()?;
        self.order.rotate_left(1);
        let BlockState::Filled { len } = self.states[idx] else {
            unreachable!("ordered block {idx} is not filled");
        };
        self.states[idx] = BlockState::CheckedOut { len };
        Some((idx, len))
    }

    /// Readable view of a checked-out block.
    pub fn checked_out_mut(&mut self, idx: usize) -> &mut [u8] {
        let BlockState::CheckedOut { len } = self.states[idx] else {
            unreachable!("block {idx} is not checked out");
        };
        let start = idx * self.block_size;
        &mut self.slab[start..start + len]
    }

    /// Return a checked-out block to the free pool.
    pub fn release(&mut self, idx: usize) {
        debug_assert!(matches!(self.states[idx], BlockState::CheckedOut { .. }));
        self.states[idx] = BlockState::Free;
    }

    /// Free every block regardless of state.
    pub fn clear(&mut self) {
        self.states = [BlockState::Free; FRAMES_PER_SLOT];
        self.order = [None; FRAMES_PER_SLOT];
    }

    pub fn is_fully_free(&self) -> bool {
        self.states.iter().all(|s| *s == BlockState::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_fully_free() {
        let queue = FrameQueue::new(64);
        assert!(queue.is_fully_free());
        assert_eq!(queue.vacant(), Some(0));
        assert!(FrameQueue::new(64).pop_filled().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = FrameQueue::new(8);

        let a = queue.vacant().unwrap();
        queue.block_mut(a)[..2].copy_from_slice(&[1, 1]);
        queue.commit(a, 2);

        let b = queue.vacant().unwrap();
        queue.block_mut(b)[..3].copy_from_slice(&[2, 2, 2]);
        queue.commit(b, 3);

        assert_eq!(queue.vacant(), None);

        let (first, len) = queue.pop_filled().unwrap();
        assert_eq!((first, len), (a, 2));
        assert_eq!(queue.checked_out_mut(first), &[1, 1]);

        queue.release(first);
        let (second, len) = queue.pop_filled().unwrap();
        assert_eq!((second, len), (b, 3));
        assert_eq!(queue.checked_out_mut(second), &[2, 2, 2]);

        queue.release(second);
        assert!(queue.is_fully_free());
    }

    #[test]
    fn test_released_block_is_reusable() {
        let mut queue = FrameQueue::new(8);
        for round in 0u8..5 {
            let idx = queue.vacant().unwrap();
            queue.block_mut(idx)[0] = round;
            queue.commit(idx, 1);
            let (popped, len) = queue.pop_filled().unwrap();
            assert_eq!(len, 1);
            assert_eq!(queue.checked_out_mut(popped)[0], round);
            queue.release(popped);
        }
        assert!(queue.is_fully_free());
    }

    #[test]
    fn test_order_survives_interleaved_commits() {
        let mut queue = FrameQueue::new(8);

        let a = queue.vacant().unwrap();
        queue.block_mut(a)[0] = 1;
        queue.commit(a, 1);
        let (first, _) = queue.pop_filled().unwrap();

        // Prefetch lands while the first block is still checked out.
        let b = queue.vacant().unwrap();
        queue.block_mut(b)[0] = 2;
        queue.commit(b, 1);

        queue.release(first);
        let c = queue.vacant().unwrap();
        queue.block_mut(c)[0] = 3;
        queue.commit(c, 1);

        let (second, _) = queue.pop_filled().unwrap();
        assert_eq!(queue.checked_out_mut(second)[0], 2);
        queue.release(second);
        let (third, _) = queue.pop_filled().unwrap();
        assert_eq!(queue.checked_out_mut(third)[0], 3);
    }

    #[test]
    fn test_clear_frees_everything() {
        let mut queue = FrameQueue::new(8);
        let idx = queue.vacant().unwrap();
        queue.commit(idx, 4);
        queue.pop_filled().unwrap();
        queue.clear();
        assert!(queue.is_fully_free());
        assert!(queue.pop_filled().is_none());
    }

    #[test]
    fn test_zero_length_frame() {
        let mut queue = FrameQueue::new(8);
        let idx = queue.vacant().unwrap();
        queue.commit(idx, 0);
        let (popped, len) = queue.pop_filled().unwrap();
        assert_eq!(len, 0);
        assert!(queue.checked_out_mut(popped).is_empty());
    }
}
