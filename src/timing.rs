//! Nominal tick rates for the platform timer glue.

use embassy_time::Duration;

/// Fade tick rate. Pace and hold values are counted in these ticks.
pub const FADE_TICK_HZ: u32 = 1000;

/// Period between two fade ticks.
pub const FADE_TICK_PERIOD: Duration = Duration::from_millis(1);

/// PWM tick invocations per software PWM period.
pub const PWM_STEPS: u32 = 256;

/// Software PWM period rate slow enough for many channels, fast enough not to flicker.
pub const DEFAULT_PWM_REFRESH_HZ: u32 = 60;

/// PWM tick rate needed for a `refresh_hz` software PWM period
pub const fn pwm_tick_hz(refresh_hz: u32) -> u32 {
    refresh_hz.saturating_mul(PWM_STEPS)
}

/// Period between two PWM ticks for a `refresh_hz` software PWM period
///
/// Truncated to whole microseconds.
#[allow(clippy::cast_lossless)]
pub const fn pwm_tick_period(refresh_hz: u32) -> Duration {
    let hz = pwm_tick_hz(refresh_hz);
    let hz = if hz == 0 { 1 } else { hz as u64 };
    Duration::from_micros(1_000_000 / hz)
}
