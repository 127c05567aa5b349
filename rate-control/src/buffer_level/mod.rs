pub const DEFAULT_WINDOW_LEN_LOG2: u32 = 10;
pub const DEFAULT_STABLE_THRESHOLD: u32 = 8;

/// Windowed average of a buffer fill level.
///
/// Each completed window of `2^window_len_log2` samples produces an integer
/// average, blended with the previous window's. Once `stable_threshold`
/// blended windows have gone by the current average is latched as the stable
/// baseline, which stays until the next reset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferLevelTracker {
    window_len_log2: u32,
    stable_threshold: u32,
    error_accum: i64,
    count: u32,
    prev_avg: i32,
    avg: i32,
    first_done: bool,
    prev_avg_valid: bool,
    stable_avg_reached: bool,
    stable_count: u32,
    stable_avg: i32,
}

impl BufferLevelTracker {
    pub const fn new(window_len_log2: u32, stable_threshold: u32) -> Self {
        assert!(window_len_log2 < 31);

        Self {
            window_len_log2,
            stable_threshold,
            error_accum: 0,
            count: 0,
            prev_avg: 0,
            avg: 0,
            first_done: false,
            prev_avg_valid: false,
            stable_avg_reached: false,
            stable_count: 0,
            stable_avg: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.window_len_log2, self.stable_threshold);
    }

    pub fn update(&mut self, level: i32, reset: bool) {
        if reset {
            self.reset();
            info!("Reset average I2S send buffer level");
        }

        self.error_accum += level as i64;
        self.count += 1;

        if self.count == 1 << self.window_len_log2 {
            self.close_window();
        }
    }

    fn close_window(&mut self) {
        if self.first_done {
            self.prev_avg_valid = true;
        }

        self.prev_avg = self.avg;
        self.avg = (self.error_accum >> self.window_len_log2) as i32;

        if self.prev_avg_valid {
            self.avg = ((self.avg as i64 + self.prev_avg as i64) / 2) as i32;

            if !self.stable_avg_reached {
                self.stable_count += 1;

                if self.stable_count > self.stable_threshold {
                    self.stable_avg = self.avg;
                    self.stable_avg_reached = true;
                    info!("Stable average buffer level calculated as {}", self.stable_avg);
                }
            }
        }

        self.count = 0;
        self.error_accum = 0;
        self.first_done = true;
    }

    pub fn average(&self) -> i32 {
        self.avg
    }

    pub fn previous_average(&self) -> i32 {
        self.prev_avg
    }

    pub fn is_stable(&self) -> bool {
        self.stable_avg_reached
    }

    pub fn stable_baseline(&self) -> Option<i32> {
        self.stable_avg_reached.then_some(self.stable_avg)
    }

    pub fn window_len_log2(&self) -> u32 {
        self.window_len_log2
    }

    pub fn stable_threshold(&self) -> u32 {
        self.stable_threshold
    }
}

impl Default for BufferLevelTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_LEN_LOG2, DEFAULT_STABLE_THRESHOLD)
    }
}
