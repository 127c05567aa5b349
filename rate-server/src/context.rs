use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::{Mutex, raw::RawMutex};
use rate_control::BufferLevelTracker;

use crate::RateServerConfig;

/// State the rate server shares with the audio tasks around it.
///
/// Owns the [`RateServerConfig`] so the server and the buffer level tracker
/// always agree on it.
pub struct RateServerContext<M: RawMutex> {
    config: RateServerConfig,
    i2s_to_usb_rate_ratio: Mutex<M, Cell<u64>>,
    /// Set on a USB speaker interface close->open transition, cleared by
    /// whoever resets the I2S send buffer.
    spkr_itf_close_open_event: AtomicBool,
    i2s_send_buffer_level: Mutex<M, RefCell<BufferLevelTracker>>,
}

impl<M: RawMutex> RateServerContext<M> {
    pub const fn new(config: &RateServerConfig) -> Self {
        Self {
            config: *config,
            i2s_to_usb_rate_ratio: Mutex::new(Cell::new(0)),
            spkr_itf_close_open_event: AtomicBool::new(false),
            i2s_send_buffer_level: Mutex::new(RefCell::new(BufferLevelTracker::new(
                config.window_len_log2,
                config.stable_threshold,
            ))),
        }
    }

    pub fn config(&self) -> &RateServerConfig {
        &self.config
    }

    /// Latest I2S to USB ratio in Q60, 0 when no ratio is available.
    pub fn i2s_to_usb_rate_ratio(&self) -> u64 {
        self.i2s_to_usb_rate_ratio.lock(|ratio| ratio.get())
    }

    pub fn set_i2s_to_usb_rate_ratio(&self, ratio: u64) {
        self.i2s_to_usb_rate_ratio.lock(|cell| cell.set(ratio));
    }

    pub fn spkr_itf_close_open_event(&self) -> bool {
        self.spkr_itf_close_open_event.load(Ordering::Relaxed)
    }

    pub fn set_spkr_itf_close_open_event(&self, event: bool) {
        self.spkr_itf_close_open_event
            .store(event, Ordering::Relaxed);
    }

    /// Reads and clears the close->open event.
    pub fn take_spkr_itf_close_open_event(&self) -> bool {
        self.spkr_itf_close_open_event
            .swap(false, Ordering::Relaxed)
    }

    pub fn calc_avg_i2s_send_buffer_level(&self, current_buffer_level: i32, reset: bool) {
        self.i2s_send_buffer_level
            .lock(|tracker| tracker.borrow_mut().update(current_buffer_level, reset));
    }

    pub fn with_i2s_send_buffer_level<R>(&self, f: impl FnOnce(&BufferLevelTracker) -> R) -> R {
        self.i2s_send_buffer_level
            .lock(|tracker| f(&tracker.borrow()))
    }
}

impl<M: RawMutex> Default for RateServerContext<M> {
    fn default() -> Self {
        Self::new(&RateServerConfig::DEFAULT)
    }
}
