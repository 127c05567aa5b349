use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Receiver, Sender},
};
use fixed_float::{DivideOperations, FixedFloat, divide_u64_to_fixed};
use rate_control::{RateEstimator, proportional_correction};

use crate::{
    I2sRateInfo, I2sRateSource, RATIO_Q_FORMAT, RateFrame, RateServerContext, UsbRateInfo,
};

/// Control loop matching the I2S clock to the USB host clock.
///
/// For every rate message from the USB side it refreshes the I2S rate
/// estimate, publishes the I2S to USB ratio in the context and replies with
/// the USB to I2S ratio, corrected by the I2S send buffer level once that has
/// settled.
pub struct RateServer<'a, M: RawMutex, D: I2sRateSource, const RX: usize, const TX: usize> {
    context: &'a RateServerContext<M>,
    driver: D,
    receiver: Receiver<'a, M, RateFrame, RX>,
    sender: Sender<'a, M, RateFrame, TX>,
    estimator: RateEstimator,
    prev_spkr_itf_open: bool,
}

impl<'a, M: RawMutex, D: I2sRateSource, const RX: usize, const TX: usize>
    RateServer<'a, M, D, RX, TX>
{
    pub fn new(
        context: &'a RateServerContext<M>,
        driver: D,
        receiver: Receiver<'a, M, RateFrame, RX>,
        sender: Sender<'a, M, RateFrame, TX>,
    ) -> Self {
        Self {
            context,
            driver,
            receiver,
            sender,
            estimator: RateEstimator::new(context.config().ref_clock_hz),
            prev_spkr_itf_open: false,
        }
    }

    pub fn estimator(&self) -> &RateEstimator {
        &self.estimator
    }

    pub async fn run<T: DivideOperations>(&mut self) -> ! {
        info!("Rate server: Task starting");

        loop {
            self.step::<T>().await;
        }
    }

    /// Waits for one rate message, answers it and returns.
    pub async fn step<T: DivideOperations>(&mut self) {
        let frame = self.receiver.receive().await;

        let usb_rate_info = match UsbRateInfo::decode(&frame) {
            Ok(info) => info,
            // The transport delivers whole messages, so a wrong size means
            // the two sides disagree on the layout.
            Err(error) => panic!("Rate server: {}", error),
        };

        let reply = self.handle_usb_rate_info::<T>(&usb_rate_info);

        self.sender.send(reply.encode()).await;
    }

    pub fn handle_usb_rate_info<T: DivideOperations>(
        &mut self,
        usb_rate_info: &UsbRateInfo,
    ) -> I2sRateInfo {
        if !self.prev_spkr_itf_open && usb_rate_info.spkr_itf_open {
            info!("Rate server: USB speaker interface opened");
            self.context.set_spkr_itf_close_open_event(true);
        }
        self.prev_spkr_itf_open = usb_rate_info.spkr_itf_open;

        let report = self.driver.current_rate_info();
        let nominal_rate = self.driver.nominal_sampling_rate();
        let i2s_rate =
            self.estimator
                .observe::<T>(report.samples, report.timespan, nominal_rate);
        let usb_rate = usb_rate_info.usb_data_rate;

        let i2s_to_usb_rate_ratio = self.i2s_to_usb_ratio::<T>(i2s_rate, usb_rate, usb_rate_info);
        self.context.set_i2s_to_usb_rate_ratio(i2s_to_usb_rate_ratio);

        let usb_to_i2s_rate_ratio =
            self.usb_to_i2s_ratio::<T>(i2s_rate, usb_rate, usb_rate_info, nominal_rate);

        I2sRateInfo {
            usb_to_i2s_rate_ratio,
        }
    }

    fn i2s_to_usb_ratio<T: DivideOperations>(
        &self,
        i2s_rate: FixedFloat,
        usb_rate: FixedFloat,
        usb_rate_info: &UsbRateInfo,
    ) -> u64 {
        // Only while the host is recording from the device.
        if i2s_rate.is_zero() || usb_rate.is_zero() || !usb_rate_info.mic_itf_open {
            return 0;
        }

        let ratio = divide_u64_to_fixed::<T>(i2s_rate, usb_rate, RATIO_Q_FORMAT);

        trace!(
            "Rate server: host buffer fill {}, correction {}",
            usb_rate_info.samples_to_host_buf_fill_level,
            (usb_rate_info.buffer_based_correction >> 32) as i32
        );

        ratio.wrapping_add_signed(usb_rate_info.buffer_based_correction)
    }

    fn usb_to_i2s_ratio<T: DivideOperations>(
        &self,
        i2s_rate: FixedFloat,
        usb_rate: FixedFloat,
        usb_rate_info: &UsbRateInfo,
        nominal_rate: u32,
    ) -> u64 {
        // Only while the host is playing to the device.
        if i2s_rate.is_zero() || usb_rate.is_zero() || !usb_rate_info.spkr_itf_open {
            return 0;
        }

        let ratio = divide_u64_to_fixed::<T>(usb_rate, i2s_rate, RATIO_Q_FORMAT);

        let config = self.context.config();
        let kp = config.kp.kp_for(nominal_rate);
        let max_correction = config.max_correction;
        let correction = self.context.with_i2s_send_buffer_level(|tracker| {
            let baseline = tracker.stable_baseline()?;
            let correction =
                proportional_correction(kp, tracker.average(), baseline, max_correction);

            trace!(
                "Rate server: send buffer level {}, correction {}",
                tracker.average(),
                (correction >> 32) as i32
            );

            Some(correction)
        });

        ratio.wrapping_add_signed(correction.unwrap_or(0))
    }
}
