use fixed_float::{FixedFloat, PortableDivide, divide};
use pretty_assertions::assert_eq;

use crate::rate_estimator::{Bucket, OBSERVATIONS_PER_BUCKET, RATE_BUCKET_COUNT, RateEstimator};

type Ops = PortableDivide;

const REF_CLOCK_HZ: u32 = 100_000_000;
const SAMPLES_PER_REPORT: u32 = 48;
const TICKS_PER_REPORT: u32 = 100_000;

fn value(x: FixedFloat) -> f64 {
    x.mantissa as f64 * 2f64.powi(x.exponent)
}

fn assert_close(actual: FixedFloat, expected: f64) {
    let actual = value(actual);
    assert!(
        ((actual - expected) / expected).abs() < 1e-9,
        "got {actual}, expected {expected}"
    );
}

fn running_estimator(nominal_rate: u32) -> RateEstimator {
    let mut estimator = RateEstimator::new(REF_CLOCK_HZ);
    estimator.observe::<Ops>(0, 0, nominal_rate);
    estimator
}

#[test]
fn stopped_clock_is_unavailable() {
    let mut estimator = running_estimator(48_000);
    estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
    let before = estimator.current_bucket();

    let rate = estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 0);

    assert!(rate.is_zero());
    assert_eq!(estimator.current_bucket(), before);
    assert_eq!(estimator.nominal_rate(), 48_000);
}

#[test]
fn rate_change_returns_nominal_estimate_and_clears_buckets() {
    let mut estimator = running_estimator(44_100);
    for _ in 0..(3 * OBSERVATIONS_PER_BUCKET + 5) {
        estimator.observe::<Ops>(44, TICKS_PER_REPORT, 44_100);
    }
    assert_ne!(estimator.buckets()[0], Bucket::default());

    let rate = estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);

    assert_eq!(
        rate,
        divide::<Ops>(FixedFloat::from_int(48_000), FixedFloat::from_int(REF_CLOCK_HZ))
    );
    assert_eq!(estimator.last_rate(), rate);
    assert_eq!(estimator.nominal_rate(), 48_000);
    assert_eq!(estimator.buckets(), &[Bucket::default(); RATE_BUCKET_COUNT]);
    assert_eq!(estimator.current_bucket(), Bucket::default());
    assert!(!estimator.is_full());
}

#[test]
fn empty_timespan_falls_back_without_accumulating() {
    let mut estimator = running_estimator(48_000);
    estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
    let before = estimator.current_bucket();

    let rate = estimator.observe::<Ops>(SAMPLES_PER_REPORT, 0, 48_000);

    assert_eq!(
        rate,
        divide::<Ops>(FixedFloat::from_int(48_000), FixedFloat::from_int(REF_CLOCK_HZ))
    );
    assert_eq!(estimator.current_bucket(), before);
}

#[test]
fn identical_reports_commit_a_bucket_without_moving_the_estimate() {
    let mut estimator = running_estimator(48_000);
    let expected = SAMPLES_PER_REPORT as f64 / TICKS_PER_REPORT as f64;

    for _ in 0..(OBSERVATIONS_PER_BUCKET - 1) {
        let rate = estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
        assert_close(rate, expected);
    }
    assert_eq!(estimator.buckets()[0], Bucket::default());

    let rate = estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
    assert_close(rate, expected);
    assert_eq!(
        estimator.buckets()[0],
        Bucket {
            samples: SAMPLES_PER_REPORT * OBSERVATIONS_PER_BUCKET,
            timespan: TICKS_PER_REPORT * OBSERVATIONS_PER_BUCKET,
        }
    );
    assert_eq!(estimator.current_bucket(), Bucket::default());

    let rate = estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
    assert_close(rate, expected);
}

#[test]
fn estimate_includes_the_uncommitted_bucket() {
    let mut estimator = running_estimator(48_000);
    for _ in 0..OBSERVATIONS_PER_BUCKET {
        estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
    }

    let rate = estimator.observe::<Ops>(2 * SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);

    let samples = (SAMPLES_PER_REPORT * (OBSERVATIONS_PER_BUCKET + 2)) as f64;
    let ticks = (TICKS_PER_REPORT * (OBSERVATIONS_PER_BUCKET + 1)) as f64;
    assert_close(rate, samples / ticks);
}

#[test]
fn ring_overwrites_oldest_bucket_once_full() {
    let mut estimator = running_estimator(48_000);
    for _ in 0..(RATE_BUCKET_COUNT as u32 * OBSERVATIONS_PER_BUCKET) {
        estimator.observe::<Ops>(SAMPLES_PER_REPORT, TICKS_PER_REPORT, 48_000);
    }
    assert!(estimator.is_full());

    for _ in 0..OBSERVATIONS_PER_BUCKET {
        estimator.observe::<Ops>(SAMPLES_PER_REPORT + 1, TICKS_PER_REPORT, 48_000);
    }

    assert_eq!(
        estimator.buckets()[0],
        Bucket {
            samples: (SAMPLES_PER_REPORT + 1) * OBSERVATIONS_PER_BUCKET,
            timespan: TICKS_PER_REPORT * OBSERVATIONS_PER_BUCKET,
        }
    );
    assert_eq!(
        estimator.buckets()[1],
        Bucket {
            samples: SAMPLES_PER_REPORT * OBSERVATIONS_PER_BUCKET,
            timespan: TICKS_PER_REPORT * OBSERVATIONS_PER_BUCKET,
        }
    );

    // The closing observation still sees the bucket it is about to replace.
    let ring_observations = OBSERVATIONS_PER_BUCKET * RATE_BUCKET_COUNT as u32;
    let samples = SAMPLES_PER_REPORT * ring_observations + (SAMPLES_PER_REPORT + 1) * OBSERVATIONS_PER_BUCKET;
    let ticks = TICKS_PER_REPORT * (ring_observations + OBSERVATIONS_PER_BUCKET);
    assert_close(estimator.last_rate(), samples as f64 / ticks as f64);
}
