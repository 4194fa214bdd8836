//! Stream pool configuration.

/// Configuration for the stream slot pool.
///
/// All sizes are fixed at [`StreamManager::new`](crate::StreamManager::new);
/// the pool never grows or shrinks afterwards.
#[derive(Debug, Clone, Copy)]
pub struct StreamerConfig {
    /// Number of slots in the pool (default: 4)
    pub max_streams: usize,
    /// Largest encoded frame in bytes; sizes each double-buffer block (default: 512)
    pub max_frame_size: usize,
    /// Longest accepted stream name in bytes (default: 255)
    pub max_name_len: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            max_streams: 4,
            max_frame_size: 512,
            max_name_len: 255,
        }
    }
}

impl StreamerConfig {
    /// Create config with a custom slot count.
    pub fn with_max_streams(max_streams: usize) -> Self {
        Self {
            max_streams: max_streams.max(1),
            ..Default::default()
        }
    }

    /// Create config with a custom frame size limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.max(1),
            ..Default::default()
        }
    }

    /// Total slab bytes the pool allocates for frame buffers.
    pub fn slab_bytes(&self) -> usize {
        self.max_streams * crate::streamer::FRAMES_PER_SLOT * self.max_frame_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamerConfig::default();
        assert_eq!(config.max_streams, 4);
        assert_eq!(config.max_frame_size, 512);
        assert_eq!(config.max_name_len, 255);
    }

    #[test]
    fn test_slab_bytes() {
        let config = StreamerConfig::with_max_streams(2);
        assert_eq!(config.slab_bytes(), 2 * 2 * 512);
    }

    #[test]
    fn test_minimum_streams() {
        let config = StreamerConfig::with_max_streams(0);
        assert_eq!(config.max_streams, 1);
    }
}
