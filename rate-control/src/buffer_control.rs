use fixed::types::I8F24;

/// Largest correction a single update may apply to a Q60 rate ratio.
pub const MAX_CORRECTION: i64 = 1500 << 32;

/// Nominal I2S sample rates that share a buffer control gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RateFamily {
    Fs48,
    Fs96,
    Fs192,
}

impl RateFamily {
    pub fn from_nominal_rate(nominal_rate: u32) -> Option<Self> {
        match nominal_rate {
            44_100 | 48_000 => Some(Self::Fs48),
            88_200 | 96_000 => Some(Self::Fs96),
            176_400 | 192_000 => Some(Self::Fs192),
            _ => None,
        }
    }
}

/// Proportional gains for the I2S send buffer controller, Q24.
///
/// Tuned empirically so the corrected ratio settles the buffer level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KpTable {
    pub fs48: I8F24,
    pub fs96: I8F24,
    pub fs192: I8F24,
}

impl KpTable {
    pub const DEFAULT: Self = Self {
        // 4.0
        fs48: I8F24::from_bits(4 << 24),
        // 2.0
        fs96: I8F24::from_bits(2 << 24),
        // 1.0
        fs192: I8F24::from_bits(1 << 24),
    };

    pub fn kp(&self, family: RateFamily) -> I8F24 {
        match family {
            RateFamily::Fs48 => self.fs48,
            RateFamily::Fs96 => self.fs96,
            RateFamily::Fs192 => self.fs192,
        }
    }

    /// Gain for a nominal rate, zero when the rate is not one we tune for.
    pub fn kp_for(&self, nominal_rate: u32) -> I8F24 {
        RateFamily::from_nominal_rate(nominal_rate)
            .map(|family| self.kp(family))
            .unwrap_or(I8F24::ZERO)
    }
}

impl Default for KpTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `(Kp * (average - baseline)) << 8`, clamped to `±max_correction`.
pub fn proportional_correction(kp: I8F24, average: i32, baseline: i32, max_correction: i64) -> i64 {
    let error = average as i64 - baseline as i64;
    let error_p = (kp.to_bits() as i64).saturating_mul(error);

    error_p
        .saturating_mul(1 << 8)
        .clamp(-max_correction, max_correction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rate_families() {
        assert_eq!(RateFamily::from_nominal_rate(44_100), Some(RateFamily::Fs48));
        assert_eq!(RateFamily::from_nominal_rate(48_000), Some(RateFamily::Fs48));
        assert_eq!(RateFamily::from_nominal_rate(88_200), Some(RateFamily::Fs96));
        assert_eq!(RateFamily::from_nominal_rate(96_000), Some(RateFamily::Fs96));
        assert_eq!(RateFamily::from_nominal_rate(176_400), Some(RateFamily::Fs192));
        assert_eq!(RateFamily::from_nominal_rate(192_000), Some(RateFamily::Fs192));
        assert_eq!(RateFamily::from_nominal_rate(32_000), None);
        assert_eq!(RateFamily::from_nominal_rate(0), None);
    }

    #[test]
    fn gains_shrink_with_rate() {
        let table = KpTable::default();
        assert!(table.kp_for(48_000) > table.kp_for(96_000));
        assert!(table.kp_for(96_000) > table.kp_for(192_000));
        assert_eq!(table.kp_for(22_050), I8F24::ZERO);
    }

    #[test]
    fn correction_is_proportional() {
        let kp = I8F24::from_num(1);
        assert_eq!(proportional_correction(kp, 10, 10, MAX_CORRECTION), 0);
        assert_eq!(proportional_correction(kp, 11, 10, MAX_CORRECTION), 1 << 32);
        assert_eq!(proportional_correction(kp, 7, 10, MAX_CORRECTION), -(3 << 32));
    }

    #[test]
    fn correction_is_clamped() {
        let kp = I8F24::from_num(4);
        assert_eq!(
            proportional_correction(kp, 1_000_000, 0, MAX_CORRECTION),
            MAX_CORRECTION
        );
        assert_eq!(
            proportional_correction(kp, i32::MIN, i32::MAX, MAX_CORRECTION),
            -MAX_CORRECTION
        );
        assert_eq!(
            proportional_correction(I8F24::MAX, i32::MAX, i32::MIN, MAX_CORRECTION),
            MAX_CORRECTION
        );
    }
}
