use rate_control::{
    KpTable, MAX_CORRECTION, REF_CLOCK_TICKS_PER_SECOND,
    buffer_level::{DEFAULT_STABLE_THRESHOLD, DEFAULT_WINDOW_LEN_LOG2},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateServerConfig {
    /// Frequency of the clock the I2S driver timestamps its reports with.
    pub ref_clock_hz: u32,
    /// The send buffer window and threshold are large enough to give stable
    /// windowed averages at every supported rate.
    pub window_len_log2: u32,
    pub stable_threshold: u32,
    pub max_correction: i64,
    pub kp: KpTable,
}

impl RateServerConfig {
    pub const DEFAULT: Self = Self {
        ref_clock_hz: REF_CLOCK_TICKS_PER_SECOND,
        window_len_log2: DEFAULT_WINDOW_LEN_LOG2,
        stable_threshold: DEFAULT_STABLE_THRESHOLD,
        max_correction: MAX_CORRECTION,
        kp: KpTable::DEFAULT,
    };
}

impl Default for RateServerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
