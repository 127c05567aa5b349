use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::{Mutex, raw::RawMutex};

/// Samples moved by the I2S driver over a span of reference clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sRateReport {
    pub timespan: u32,
    pub samples: u32,
}

/// What the rate server needs from the I2S driver.
pub trait I2sRateSource {
    fn current_rate_info(&self) -> I2sRateReport;
    /// Nominal sample rate in Hz, 0 while the clock is not running.
    fn nominal_sampling_rate(&self) -> u32;
}

impl<T: I2sRateSource + ?Sized> I2sRateSource for &T {
    fn current_rate_info(&self) -> I2sRateReport {
        (**self).current_rate_info()
    }

    fn nominal_sampling_rate(&self) -> u32 {
        (**self).nominal_sampling_rate()
    }
}

/// Rate reports published from the I2S callback and read by the rate server.
///
/// The report is swapped as a whole under the mutex so a reader never pairs a
/// timespan with the wrong sample count. Reads may be one report behind.
pub struct SharedI2sRateInfo<M: RawMutex> {
    report: Mutex<M, Cell<I2sRateReport>>,
    nominal_sampling_rate: AtomicU32,
}

impl<M: RawMutex> SharedI2sRateInfo<M> {
    pub const fn new() -> Self {
        Self {
            report: Mutex::new(Cell::new(I2sRateReport {
                timespan: 0,
                samples: 0,
            })),
            nominal_sampling_rate: AtomicU32::new(0),
        }
    }

    pub fn publish(&self, timespan: u32, samples: u32) {
        self.report
            .lock(|report| report.set(I2sRateReport { timespan, samples }));
    }

    pub fn set_nominal_sampling_rate(&self, rate_hz: u32) {
        self.nominal_sampling_rate.store(rate_hz, Ordering::Relaxed);
    }
}

impl<M: RawMutex> Default for SharedI2sRateInfo<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> I2sRateSource for SharedI2sRateInfo<M> {
    fn current_rate_info(&self) -> I2sRateReport {
        self.report.lock(|report| report.get())
    }

    fn nominal_sampling_rate(&self) -> u32 {
        self.nominal_sampling_rate.load(Ordering::Relaxed)
    }
}
