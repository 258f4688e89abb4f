//! 16-channel analog multiplexer front end.
//!
//! The touch electrodes share a single ADC input behind a CD74HC4067-style
//! mux; four GPIO address lines pick the electrode, the ADC reads it.

use esp_hal::{
    analog::adc::{Adc, AdcConfig, AdcPin, Attenuation},
    gpio::{Level, Output},
    peripherals::{ADC1, GPIO34},
    Blocking,
};

use crate::platform::DelayOps;

/// Address lines need this long to propagate through the mux before the
/// analog path is valid again.
const SELECT_SETTLE_US: u32 = 100;

pub type MuxAdc<'d> = Adc<'d, ADC1<'d>, Blocking>;
pub type MuxInputPin<'d> = AdcPin<GPIO34<'d>, ADC1<'d>>;

/// What the sampling layer needs from the analog hardware: point the mux at a
/// channel, read one raw conversion.
pub trait AnalogFrontEnd {
    fn select(&mut self, channel: u8);
    fn read_raw(&mut self) -> u16;
}

pub struct MuxFrontEnd<'d, D: DelayOps> {
    s0: Output<'d>,
    s1: Output<'d>,
    s2: Output<'d>,
    s3: Output<'d>,
    adc: MuxAdc<'d>,
    input: MuxInputPin<'d>,
    delay: D,
}

impl<'d, D: DelayOps> MuxFrontEnd<'d, D> {
    pub fn new(
        s0: Output<'d>,
        s1: Output<'d>,
        s2: Output<'d>,
        s3: Output<'d>,
        adc: MuxAdc<'d>,
        input: MuxInputPin<'d>,
        delay: D,
    ) -> Self {
        Self {
            s0,
            s1,
            s2,
            s3,
            adc,
            input,
            delay,
        }
    }
}

impl<D: DelayOps> AnalogFrontEnd for MuxFrontEnd<'_, D> {
    fn select(&mut self, channel: u8) {
        self.s0.set_level(Level::from(channel & 0x01 != 0));
        self.s1.set_level(Level::from(channel & 0x02 != 0));
        self.s2.set_level(Level::from(channel & 0x04 != 0));
        self.s3.set_level(Level::from(channel & 0x08 != 0));
        self.delay.delay_us(SELECT_SETTLE_US);
    }

    fn read_raw(&mut self) -> u16 {
        match nb::block!(self.adc.read_oneshot(&mut self.input)) {
            Ok(raw) => raw,
            // The ADC is always-on hardware; a conversion fault is a wiring
            // or bring-up defect and must not masquerade as a valid sample.
            Err(_) => panic!("mux adc conversion failed"),
        }
    }
}

/// Builds the ADC half of the front end from the raw peripherals.
pub fn adc_frontend<'d>(adc1: ADC1<'d>, input: GPIO34<'d>) -> (MuxAdc<'d>, MuxInputPin<'d>) {
    let mut adc_config = AdcConfig::new();
    let input = adc_config.enable_pin(input, Attenuation::_11dB);
    let adc = Adc::new(adc1, adc_config);
    (adc, input)
}
