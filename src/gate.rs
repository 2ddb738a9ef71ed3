//! Enabling and disabling the two tick interrupts.
//!
//! Both ticks only run while there is work for them: the fade tick while any
//! channel is fading, holding or has queued commands, the PWM tick while any
//! software-driven channel sits at an intermediate level. The platform glue
//! implements [`TickControl`] on top of its timer registers; [`TriggerGate`]
//! forwards to it and remembers what it asked for.

/// Platform hook for the fade (~1 kHz) and PWM (tens of kHz) interrupts
///
/// Every method must be idempotent.
pub trait TickControl {
    fn enable_fade_tick(&mut self);
    fn disable_fade_tick(&mut self);
    fn enable_pwm_tick(&mut self);
    fn disable_pwm_tick(&mut self);
}

/// For hosts that call the ticks from a loop instead of a timer.
impl TickControl for () {
    fn enable_fade_tick(&mut self) {}
    fn disable_fade_tick(&mut self) {}
    fn enable_pwm_tick(&mut self) {}
    fn disable_pwm_tick(&mut self) {}
}

/// Tracks which tick interrupts are armed
#[derive(Debug)]
pub struct TriggerGate<T> {
    control: T,
    fade_armed: bool,
    pwm_armed: bool,
}

impl<T: TickControl> TriggerGate<T> {
    pub const fn new(control: T) -> Self {
        Self {
            control,
            fade_armed: false,
            pwm_armed: false,
        }
    }

    pub const fn fade_armed(&self) -> bool {
        self.fade_armed
    }

    pub const fn pwm_armed(&self) -> bool {
        self.pwm_armed
    }

    pub const fn control(&self) -> &T {
        &self.control
    }

    /// Arm both ticks after a channel got new work
    pub fn arm(&mut self) {
        self.arm_fade();
        self.pwm_armed = true;
        self.control.enable_pwm_tick();
    }

    /// Arm only the fade tick so its next sweep re-evaluates the PWM tick
    pub fn arm_fade(&mut self) {
        self.fade_armed = true;
        self.control.enable_fade_tick();
    }

    pub fn disarm_fade(&mut self) {
        self.fade_armed = false;
        self.control.disable_fade_tick();
    }

    pub fn disarm_pwm(&mut self) {
        self.pwm_armed = false;
        self.control.disable_pwm_tick();
    }

    pub fn disarm(&mut self) {
        self.disarm_fade();
        self.disarm_pwm();
    }
}
