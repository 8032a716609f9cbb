use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use crate::frame::BufferRecycler;
use crate::FrameId;

/// Bounded pool of frame buffers.
///
/// At most `capacity` buffers are handed out at once; released buffers are
/// reused for later frames.
#[derive(Debug)]
pub struct BufferPool {
    capacity: usize,
    buffer_len: usize,
    state: Mutex<PoolState>,
}

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<Vec<u8>>,
    outstanding: usize,
    allocated: u64,
    released: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub outstanding: usize,
    pub allocated: u64,
    pub released: u64,
}

impl BufferPool {
    pub fn new(capacity: usize, buffer_len: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffer_len,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Hand out a buffer of `buffer_len` bytes.
    pub fn acquire(&self) -> Result<Vec<u8>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("buffer pool lock poisoned"))?;
        if state.outstanding >= self.capacity {
            return Err(anyhow!(
                "buffer pool exhausted ({} buffers outstanding)",
                state.outstanding
            ));
        }
        let buffer = match state.free.pop() {
            Some(buffer) => buffer,
            None => {
                state.allocated += 1;
                vec![0u8; self.buffer_len]
            }
        };
        state.outstanding += 1;
        Ok(buffer)
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            capacity: self.capacity,
            outstanding: state.outstanding,
            allocated: state.allocated,
            released: state.released,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BufferRecycler for BufferPool {
    fn recycle(&self, frame_id: FrameId, mut buffer: Vec<u8>) {
        let mut state = self.lock();
        if state.outstanding == 0 {
            log::error!("BufferPool: {} returned a buffer that was never handed out", frame_id);
            return;
        }
        state.outstanding -= 1;
        state.released += 1;
        buffer.resize(self.buffer_len, 0);
        state.free.push(buffer);
    }
}
