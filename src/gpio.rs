//! The bit of GPIO access the handoff code needs, as a capability the board
//! glue provides.

use crate::error::GpioError;

/// Pin-level GPIO access. Levels are `true` for high.
pub trait Gpio {
    fn direction_input(&mut self, pin: u32) -> Result<(), GpioError>;
    fn direction_output(&mut self, pin: u32, level: bool) -> Result<(), GpioError>;
    fn get_value(&mut self, pin: u32) -> Result<bool, GpioError>;
    fn set_value(&mut self, pin: u32, level: bool) -> Result<(), GpioError>;
}

pub trait Delay {
    fn delay_us(&mut self, us: u32);
}

/// Pulses up to three active-low reset lines together: drive them all low,
/// hold for `active_us`, release them, then wait `settle_us` if that's
/// non-zero.
///
/// A line that can't be driven doesn't stop the others from being pulsed;
/// the first error is returned at the end.
pub fn issue_reset(
    gpio: &mut impl Gpio,
    delay: &mut impl Delay,
    pins: &[u32],
    active_us: u32,
    settle_us: u32,
) -> Result<(), GpioError> {
    let pins = &pins[..pins.len().min(3)];
    let mut result = Ok(());

    for &pin in pins {
        let r = gpio.direction_output(pin, false);
        result = result.and(r);
    }
    delay.delay_us(active_us);
    for &pin in pins {
        let r = gpio.set_value(pin, true);
        result = result.and(r);
    }
    if settle_us != 0 {
        delay.delay_us(settle_us);
    }

    if let Err(e) = result {
        log::warn!("reset pulse incomplete: {}", e);
    }
    result
}
