//! Update or recover?
//!
//! When the `update` command runs it has to decide whether to do a regular
//! update or a recovery. NBoot on legacy boards can already have decided this
//! from how long the button was held. Otherwise a GPIO named in
//! `recovergpio` is sampled.

use crate::descriptor::HardwareConfig;
use crate::env::Env;
use crate::gpio::Gpio;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UpdateAction {
    /// Update support isn't built in.
    None,
    Update,
    Recover,
}

/// A parsed `recovergpio` value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RecoverGpio {
    pub pin: u32,
    pub active_high: bool,
}

/// Parses `recovergpio`: a GPIO number (decimal, `0x` hex or `0` octal),
/// optionally `-` or `_`, then optionally something starting with `h` or `H`
/// for active high. Anything else means active low.
///
/// ```text
/// 123_high  GPIO 123, active high
/// 65-low    GPIO 65, active low
/// 13        GPIO 13, active low
/// 0x1fh     GPIO 31, active high
/// ```
///
/// Returns `None` if there is no number at the start.
pub fn parse_recover_gpio(s: &str) -> Option<RecoverGpio> {
    let (pin, rest) = strtoul(s.as_bytes())?;
    let rest = match rest.first() {
        Some(b'-' | b'_') => &rest[1..],
        _ => rest,
    };
    let active_high = matches!(rest.first(), Some(b'h' | b'H'));
    Some(RecoverGpio { pin, active_high })
}

/// Leading unsigned number with C base detection. Stops at the first byte
/// that isn't a digit in the base; overflow wraps.
fn strtoul(s: &[u8]) -> Option<(u32, &[u8])> {
    let (radix, digits) = match s {
        [b'0', b'x' | b'X', next, ..] if next.is_ascii_hexdigit() => (16, &s[2..]),
        [b'0', ..] => (8, s),
        _ => (10, s),
    };
    let len = digits
        .iter()
        .take_while(|b| char::from(**b).is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let value = digits[..len].iter().fold(0u32, |acc, &b| {
        let d = char::from(b).to_digit(radix).unwrap_or(0);
        acc.wrapping_mul(radix).wrapping_add(d)
    });
    Some((value, &digits[len..]))
}

/// Whether the recovery GPIO, if there is one, is in its active state. A GPIO
/// that can't be read counts as inactive.
pub fn recover_gpio_active(env: &impl Env, gpio: &mut impl Gpio) -> bool {
    let Some(value) = env.get("recovergpio") else {
        return false;
    };
    let Some(rg) = parse_recover_gpio(value) else {
        log::warn!("ignoring recovergpio {:?}", value);
        return false;
    };
    if let Err(e) = gpio.direction_input(rg.pin) {
        log::warn!("recovergpio: {}", e);
        return false;
    }
    match gpio.get_value(rg.pin) {
        Ok(level) => level == rg.active_high,
        Err(e) => {
            log::warn!("recovergpio: {}", e);
            false
        }
    }
}

/// Decides what the `update` command should do.
pub fn check_for_recover(
    hw: &HardwareConfig,
    env: &impl Env,
    gpio: &mut impl Gpio,
) -> UpdateAction {
    if !cfg!(feature = "update") {
        return UpdateAction::None;
    }
    // NBoot already measured the button.
    if hw.recover_requested() {
        return UpdateAction::Recover;
    }
    if recover_gpio_active(env, gpio) {
        UpdateAction::Recover
    } else {
        UpdateAction::Update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{tests::DUMP, ArgsRegion};
    use crate::boardcfg::CfgInfo;
    use crate::bsp::Family;
    use crate::descriptor::DescriptorFormat;
    use crate::env::tests::FakeEnv;
    use crate::gpio::tests::FakeGpio;

    fn legacy(recover_bit: bool) -> HardwareConfig {
        let mut region = ArgsRegion::copy_from(&DUMP).unwrap();
        if !recover_bit {
            region.args.action = 0;
        }
        HardwareConfig::decode(Family::Fsimx6, &DescriptorFormat::Legacy(&region))
    }

    fn env_with(recovergpio: Option<&str>) -> FakeEnv {
        let mut env = FakeEnv::default();
        if let Some(v) = recovergpio {
            env.0.insert("recovergpio".into(), v.into());
        }
        env
    }

    #[test]
    #[cfg(not(feature = "update"))]
    fn nothing_to_decide_without_update() {
        let mut gpio = FakeGpio::with_pin(13, false);
        assert_eq!(
            check_for_recover(&legacy(true), &env_with(Some("13")), &mut gpio),
            UpdateAction::None
        );
    }

    #[test]
    fn parse_forms() {
        let p = |s| parse_recover_gpio(s).map(|r| (r.pin, r.active_high));
        assert_eq!(p("13"), Some((13, false)));
        assert_eq!(p("123_high"), Some((123, true)));
        assert_eq!(p("65-low"), Some((65, false)));
        assert_eq!(p("13_high"), Some((13, true)));
        assert_eq!(p("0x1fh"), Some((31, true)));
        assert_eq!(p("0x1f-H"), Some((31, true)));
        assert_eq!(p("010"), Some((8, false)));
        assert_eq!(p("0"), Some((0, false)));
        assert_eq!(p("7h"), Some((7, true)));
        assert_eq!(p("7 high"), Some((7, false)));
    }

    #[test]
    fn parse_rejects_non_numbers() {
        assert_eq!(parse_recover_gpio(""), None);
        assert_eq!(parse_recover_gpio("high"), None);
        assert_eq!(parse_recover_gpio("-13"), None);
    }

    #[test]
    fn zero_x_without_hex_digit_is_octal_zero() {
        assert_eq!(
            parse_recover_gpio("0xh"),
            Some(RecoverGpio { pin: 0, active_high: false })
        );
    }

    #[test]
    #[cfg(feature = "update")]
    fn recover_bit_wins() {
        // Even with the GPIO saying "not pressed".
        let env = env_with(Some("13_high"));
        let mut gpio = FakeGpio::with_pin(13, false);
        assert_eq!(
            check_for_recover(&legacy(true), &env, &mut gpio),
            UpdateAction::Recover
        );
    }

    #[test]
    #[cfg(feature = "update")]
    fn no_gpio_means_update() {
        let mut gpio = FakeGpio::with_pin(13, false);
        assert_eq!(
            check_for_recover(&legacy(false), &env_with(None), &mut gpio),
            UpdateAction::Update
        );
        assert!(gpio.events.is_empty());
    }

    #[test]
    #[cfg(feature = "update")]
    fn active_low_by_default() {
        let mut gpio = FakeGpio::with_pin(13, false);
        assert_eq!(
            check_for_recover(&legacy(false), &env_with(Some("13")), &mut gpio),
            UpdateAction::Recover
        );

        let mut gpio = FakeGpio::with_pin(13, true);
        assert_eq!(
            check_for_recover(&legacy(false), &env_with(Some("13")), &mut gpio),
            UpdateAction::Update
        );
    }

    #[test]
    #[cfg(feature = "update")]
    fn active_high_level_mismatch() {
        let mut gpio = FakeGpio::with_pin(13, false);
        assert_eq!(
            check_for_recover(&legacy(false), &env_with(Some("13_high")), &mut gpio),
            UpdateAction::Update
        );

        let mut gpio = FakeGpio::with_pin(13, true);
        assert_eq!(
            check_for_recover(&legacy(false), &env_with(Some("13_high")), &mut gpio),
            UpdateAction::Recover
        );
    }

    #[test]
    #[cfg(feature = "update")]
    fn unusable_gpio_is_ignored() {
        // Pin 13 doesn't exist, so it can't be made an input. A low level
        // would otherwise mean recovery.
        let mut gpio = FakeGpio::with_pin(14, false);
        assert_eq!(
            check_for_recover(&legacy(false), &env_with(Some("13")), &mut gpio),
            UpdateAction::Update
        );
    }

    #[test]
    #[cfg(feature = "update")]
    fn board_cfg_boards_only_have_the_gpio() {
        // Same action bits as a legacy board asking for recovery, but a
        // BOARD-CFG board has nowhere to carry them.
        let info = CfgInfo::copy_from(&[0; 32]).unwrap();
        let format = DescriptorFormat::Tagged { info: &info, cfg: None };
        let hw = HardwareConfig::decode(Family::Fsimx8mm, &format);

        let mut gpio = FakeGpio::with_pin(13, true);
        assert_eq!(
            check_for_recover(&hw, &env_with(None), &mut gpio),
            UpdateAction::Update
        );
        assert_eq!(
            check_for_recover(&hw, &env_with(Some("13_high")), &mut gpio),
            UpdateAction::Recover
        );
    }
}
