use core::fmt;
use core::mem::size_of;

use bytemuck::{Pod, Zeroable};
use fixed_float::FixedFloat;

/// Largest datagram the rate port carries.
pub const RATE_FRAME_CAPACITY: usize = 32;

pub type RateFrame = heapless::Vec<u8, RATE_FRAME_CAPACITY>;

/// Fractional bits of the rate ratios exchanged with the USB side.
pub const RATIO_Q_FORMAT: u32 = 28 + 32;

/// Rate information sent by the USB side once per rate update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbRateInfo {
    pub usb_data_rate: FixedFloat,
    pub spkr_itf_open: bool,
    pub mic_itf_open: bool,
    pub samples_to_host_buf_fill_level: i32,
    /// Correction the USB side's own buffer controller wants added to the
    /// I2S to USB ratio, in the same Q60 scale.
    pub buffer_based_correction: i64,
}

/// Reply to the USB side carrying the USB to I2S ratio in Q60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sRateInfo {
    pub usb_to_i2s_rate_ratio: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::SizeMismatch { expected, actual } => write!(
                f,
                "rate info frame size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct UsbRateInfoWire {
    usb_data_rate_mant: u32,
    usb_data_rate_exp: i32,
    buffer_based_correction: i64,
    samples_to_host_buf_fill_level: i32,
    spkr_itf_open: u8,
    mic_itf_open: u8,
    _reserved: [u8; 2],
}

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct I2sRateInfoWire {
    usb_to_i2s_rate_ratio: u64,
}

pub const USB_RATE_INFO_SIZE: usize = size_of::<UsbRateInfoWire>();
pub const I2S_RATE_INFO_SIZE: usize = size_of::<I2sRateInfoWire>();

const _: () = assert!(USB_RATE_INFO_SIZE <= RATE_FRAME_CAPACITY);
const _: () = assert!(I2S_RATE_INFO_SIZE <= RATE_FRAME_CAPACITY);

fn frame_from<T: Pod>(wire: &T) -> RateFrame {
    let mut frame = RateFrame::new();
    // only fails if too long, and both layouts are checked against the capacity above
    frame.extend_from_slice(bytemuck::bytes_of(wire)).ok();
    frame
}

fn check_size(frame: &[u8], expected: usize) -> Result<(), WireError> {
    if frame.len() != expected {
        return Err(WireError::SizeMismatch {
            expected,
            actual: frame.len(),
        });
    }
    Ok(())
}

impl UsbRateInfo {
    pub fn encode(&self) -> RateFrame {
        frame_from(&UsbRateInfoWire {
            usb_data_rate_mant: self.usb_data_rate.mantissa,
            usb_data_rate_exp: self.usb_data_rate.exponent,
            buffer_based_correction: self.buffer_based_correction,
            samples_to_host_buf_fill_level: self.samples_to_host_buf_fill_level,
            spkr_itf_open: self.spkr_itf_open as u8,
            mic_itf_open: self.mic_itf_open as u8,
            _reserved: [0; 2],
        })
    }

    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        check_size(frame, USB_RATE_INFO_SIZE)?;
        let wire: UsbRateInfoWire = bytemuck::pod_read_unaligned(frame);

        Ok(Self {
            usb_data_rate: FixedFloat::new(wire.usb_data_rate_mant, wire.usb_data_rate_exp),
            spkr_itf_open: wire.spkr_itf_open != 0,
            mic_itf_open: wire.mic_itf_open != 0,
            samples_to_host_buf_fill_level: wire.samples_to_host_buf_fill_level,
            buffer_based_correction: wire.buffer_based_correction,
        })
    }
}

impl I2sRateInfo {
    pub fn encode(&self) -> RateFrame {
        frame_from(&I2sRateInfoWire {
            usb_to_i2s_rate_ratio: self.usb_to_i2s_rate_ratio,
        })
    }

    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        check_size(frame, I2S_RATE_INFO_SIZE)?;
        let wire: I2sRateInfoWire = bytemuck::pod_read_unaligned(frame);

        Ok(Self {
            usb_to_i2s_rate_ratio: wire.usb_to_i2s_rate_ratio,
        })
    }
}
