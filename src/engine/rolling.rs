use std::collections::VecDeque;

/// Fixed-capacity ring buffer over the trailing `capacity` observations.
/// Pushing into a full window evicts the oldest value.
///
/// Statistics are recomputed from the buffered values on every call rather
/// than from a running sum, so a window of identical values has a mean equal
/// to that value and a standard deviation of exactly zero.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    data: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// # Panics
    /// Panics if capacity is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingWindow capacity must be > 0");
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, returning the evicted one if the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.data.len() >= self.capacity {
            self.data.pop_front()
        } else {
            None
        };
        self.data.push_back(value);
        evicted
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// Oldest value still in the window.
    #[inline]
    pub fn oldest(&self) -> Option<f64> {
        self.data.front().copied()
    }

    /// Simple mean over the full window. `None` while warming up.
    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.anchored_mean()
    }

    /// Sample standard deviation (N-1 denominator) over the full window.
    /// `None` while warming up or for a single-slot window.
    pub fn sample_std(&self) -> Option<f64> {
        if !self.is_full() || self.capacity < 2 {
            return None;
        }
        let mean = self.anchored_mean()?;
        let n = self.data.len() as f64;
        let sum_sq: f64 = self.data.iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq / (n - 1.0)).sqrt())
    }

    /// Mean taken as `oldest + mean(v - oldest)`. Deviations of equal values
    /// are exactly zero, so a flat window returns its value bit for bit.
    fn anchored_mean(&self) -> Option<f64> {
        let anchor = self.oldest()?;
        let n = self.data.len() as f64;
        let offset: f64 = self.data.iter().map(|v| v - anchor).sum::<f64>() / n;
        Some(anchor + offset)
    }
}
