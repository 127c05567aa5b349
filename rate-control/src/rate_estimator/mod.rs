use fixed_float::{DivideOperations, FixedFloat, divide};

pub const RATE_BUCKET_COUNT: usize = 16;
pub const OBSERVATIONS_PER_BUCKET: u32 = 16;

/// Samples and reference clock ticks accumulated over a run of observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bucket {
    pub samples: u32,
    pub timespan: u32,
}

impl Bucket {
    const EMPTY: Self = Self {
        samples: 0,
        timespan: 0,
    };

    fn accumulate(&mut self, samples: u32, timespan: u32) {
        self.samples = self.samples.wrapping_add(samples);
        self.timespan = self.timespan.wrapping_add(timespan);
    }
}

/// Moving average of the local sample rate, in samples per reference clock
/// tick.
///
/// Every observation lands in an in-progress bucket which is committed to a
/// ring of [`RATE_BUCKET_COUNT`] buckets after [`OBSERVATIONS_PER_BUCKET`]
/// observations. The estimate covers the ring plus the in-progress bucket, so
/// it moves on every observation rather than only at bucket boundaries.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    ref_clock_hz: u32,
    buckets: [Bucket; RATE_BUCKET_COUNT],
    commits: u32,
    buckets_full: bool,
    current: Bucket,
    counter: u32,
    prev_nominal_rate: u32,
    last_rate: FixedFloat,
}

impl RateEstimator {
    pub const fn new(ref_clock_hz: u32) -> Self {
        assert!(ref_clock_hz > 0);

        Self {
            ref_clock_hz,
            buckets: [Bucket::EMPTY; RATE_BUCKET_COUNT],
            commits: 0,
            buckets_full: false,
            current: Bucket::EMPTY,
            counter: 0,
            prev_nominal_rate: 0,
            last_rate: FixedFloat::ZERO,
        }
    }

    pub fn ref_clock_hz(&self) -> u32 {
        self.ref_clock_hz
    }

    pub fn last_rate(&self) -> FixedFloat {
        self.last_rate
    }

    pub fn nominal_rate(&self) -> u32 {
        self.prev_nominal_rate
    }

    pub fn buckets(&self) -> &[Bucket; RATE_BUCKET_COUNT] {
        &self.buckets
    }

    pub fn current_bucket(&self) -> Bucket {
        self.current
    }

    pub fn is_full(&self) -> bool {
        self.buckets_full
    }

    /// Feeds one driver report and returns the updated estimate.
    ///
    /// Returns [`FixedFloat::ZERO`] while the clock is not running
    /// (`nominal_rate == 0`).
    pub fn observe<T: DivideOperations>(
        &mut self,
        samples: u32,
        timespan: u32,
        nominal_rate: u32,
    ) -> FixedFloat {
        if nominal_rate == 0 {
            return FixedFloat::ZERO;
        }

        if nominal_rate != self.prev_nominal_rate {
            info!(
                "I2S sample rate change detected, new_sr = {}, prev_sr = {}",
                nominal_rate,
                self.prev_nominal_rate
            );
            self.clear();
            self.prev_nominal_rate = nominal_rate;
            self.last_rate = self.nominal_estimate::<T>();
            return self.last_rate;
        }

        if timespan == 0 {
            self.last_rate = self.nominal_estimate::<T>();
            return self.last_rate;
        }

        self.counter += 1;
        self.current.accumulate(samples, timespan);

        let total = self
            .buckets
            .iter()
            .fold(self.current, |mut total, bucket| {
                total.accumulate(bucket.samples, bucket.timespan);
                total
            });

        let rate = divide::<T>(
            FixedFloat::from_int(total.samples),
            FixedFloat::from_int(total.timespan),
        );

        if self.counter >= OBSERVATIONS_PER_BUCKET {
            self.commit();
        }

        self.last_rate = rate;
        rate
    }

    fn nominal_estimate<T: DivideOperations>(&self) -> FixedFloat {
        divide::<T>(
            FixedFloat::from_int(self.prev_nominal_rate),
            FixedFloat::from_int(self.ref_clock_hz),
        )
    }

    fn commit(&mut self) {
        let slot = self.commits as usize % RATE_BUCKET_COUNT;
        self.buckets[slot] = self.current;
        trace!(
            "Committed rate bucket {}: {} samples over {} ticks",
            slot,
            self.current.samples,
            self.current.timespan
        );

        self.commits = self.commits.wrapping_add(1);
        if !self.buckets_full && self.commits as usize == RATE_BUCKET_COUNT {
            self.buckets_full = true;
        }

        self.current = Bucket::EMPTY;
        self.counter = 0;
    }

    fn clear(&mut self) {
        self.buckets = [Bucket::EMPTY; RATE_BUCKET_COUNT];
        self.commits = 0;
        self.buckets_full = false;
        self.current = Bucket::EMPTY;
        self.counter = 0;
    }
}

#[cfg(test)]
mod test;
