/// Integer primitives the divider is built on.
///
/// Targets with a leading-zero-count or long-divide instruction provide their
/// own implementation; [`PortableDivide`] works everywhere.
pub trait DivideOperations {
    fn count_leading_zeros(value: u32) -> u32;
    /// `dividend / divisor`, where the caller guarantees the quotient fits in 32 bits.
    fn wide_divide(dividend: u64, divisor: u32) -> u32;
}

pub struct PortableDivide;

impl DivideOperations for PortableDivide {
    #[inline]
    fn count_leading_zeros(value: u32) -> u32 {
        value.leading_zeros()
    }

    #[inline]
    fn wide_divide(dividend: u64, divisor: u32) -> u32 {
        (dividend / divisor as u64) as u32
    }
}

#[macro_export]
macro_rules! declare_divide_tests {
    {$T:ty, $(#[$meta:meta]),*, $($prelude:tt)*} => {
        #[cfg(test)]
        $(#[$meta])*
        mod divide_operations_tests {

            $($prelude)*

            use $crate::DivideOperations;

            #[test]
            pub fn test_count_leading_zeros() {
                assert_eq!(<$T>::count_leading_zeros(0), 32);
                assert_eq!(<$T>::count_leading_zeros(1), 31);
                assert_eq!(<$T>::count_leading_zeros(48_000), 16);
                assert_eq!(<$T>::count_leading_zeros(100_000_000), 5);
                assert_eq!(<$T>::count_leading_zeros(u32::MAX), 0);
            }

            #[test]
            pub fn test_wide_divide() {
                assert_eq!(<$T>::wide_divide(10, 3), 3);
                assert_eq!(<$T>::wide_divide(1 << 32, 2), 1 << 31);
                assert_eq!(<$T>::wide_divide((u32::MAX as u64) << 31, u32::MAX), 1 << 31);
                assert_eq!(<$T>::wide_divide(0, 7), 0);
            }
        }
    };
}

declare_divide_tests! {
    crate::PortableDivide,
    #[allow(unused_imports)],
    use super::*;
}
