use crate::ecs::storage::Colony;

/// Configuration for a [`Registry`](super::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Slots per slab in every colony the registry creates.
    pub slab_size: usize,
    /// Log a warning once more than this many views are cached.
    pub view_warn_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slab_size: Colony::<()>::DEFAULT_SLAB_SIZE,
            view_warn_threshold: 64,
        }
    }
}

impl Config {
    #[inline]
    pub fn with_slab_size(mut self, slab_size: usize) -> Self {
        self.slab_size = slab_size;
        self
    }

    #[inline]
    pub fn with_view_warn_threshold(mut self, view_warn_threshold: usize) -> Self {
        self.view_warn_threshold = view_warn_threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        // Given
        let config = Config::default();

        // When
        let tuned = config.with_slab_size(8).with_view_warn_threshold(2);

        // Then
        assert_eq!(config.slab_size, 32);
        assert_eq!(config.view_warn_threshold, 64);
        assert_eq!(
            tuned,
            Config {
                slab_size: 8,
                view_warn_threshold: 2
            }
        );
    }
}
