//! Per-output fade and PWM state machine.
//!
//! A channel is always in exactly one [`Phase`]: idle (`level == target`,
//! no hold left), fading toward `target`, or holding at `target`. Foreground
//! requests only ever change the target, the hold and the pacing. The fade
//! scheduler is the only code that moves `level` one unit at a time.

use crate::OutputCapability;
use crate::command::{Command, CommandQueue};
use crate::curve;

/// Amount taken off the pace accumulator on every fade tick.
pub const FADE_STEP: i16 = 128;

/// Fastest pace: one level step per fade tick.
#[allow(clippy::cast_sign_loss)]
pub const MIN_PACE: u16 = FADE_STEP as u16;

/// Slowest pace the signed accumulator can hold.
#[allow(clippy::cast_sign_loss)]
pub const MAX_PACE: u16 = i16::MAX as u16;

/// Channel mode bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags(u8);

impl ModeFlags {
    /// Level 0 drives the pin high.
    pub const INVERTED: Self = Self(1);
    /// Drive with the raw level instead of the corrected one.
    pub const NO_CORRECTION: Self = Self(1 << 1);
    /// Toggle the pin from the PWM tick instead of using a PWM unit.
    pub const SOFTWARE: Self = Self(1 << 2);
    /// Level is strictly between fully off and fully on.
    pub const DRIVE_ACTIVE: Self = Self(1 << 3);

    const SOFTWARE_PWM: Self = Self::SOFTWARE.union(Self::DRIVE_ACTIVE);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// How a channel produces intermediate levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    /// Use the output's PWM unit when it has one
    #[default]
    Hardware,
    /// Always toggle the pin from the PWM tick
    Software,
}

/// Options applied when a channel is claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub inverted: bool,
    /// Apply the perceptual brightness curve
    pub correction: bool,
    pub drive: DriveMode,
}

impl ChannelConfig {
    pub const fn new() -> Self {
        Self {
            inverted: false,
            correction: true,
            drive: DriveMode::Hardware,
        }
    }

    pub const fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub const fn without_correction(mut self) -> Self {
        self.correction = false;
        self
    }

    pub const fn software(mut self) -> Self {
        self.drive = DriveMode::Software;
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What a channel is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fading,
    Holding,
}

/// Outcome of a request on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Took effect immediately; both ticks must run.
    Applied,
    /// Channel was busy, command waits in the queue.
    Queued,
    /// Channel was busy and its queue is full.
    Dropped,
}

/// Result of one fade tick on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Idle,
    Busy,
    /// A queued command was just applied.
    Dequeued,
}

/// One output and its complete fade state
///
/// Q is the number of commands that can wait behind the active one
pub struct Channel<O, const Q: usize> {
    output: O,
    flags: ModeFlags,
    level: u8,
    target: u8,
    corrected: u8,
    hold_remaining: u16,
    pace_accumulator: i16,
    pace_increment: u16,
    queue: CommandQueue<Q>,
}

impl<O: OutputCapability, const Q: usize> Channel<O, Q> {
    /// Wrap a claimed output, starting fully off
    ///
    /// Hardware drive falls back to software drive when the output has no
    /// PWM unit.
    pub fn new(output: O, config: ChannelConfig) -> Self {
        let mut flags = ModeFlags::empty();
        if config.inverted {
            flags.insert(ModeFlags::INVERTED);
        }
        if !config.correction {
            flags.insert(ModeFlags::NO_CORRECTION);
        }
        if config.drive == DriveMode::Software || !output.supports_hardware_drive() {
            flags.insert(ModeFlags::SOFTWARE);
        }

        Self {
            output,
            flags,
            level: 0,
            target: 0,
            corrected: 0,
            hold_remaining: 0,
            pace_accumulator: 0,
            pace_increment: MIN_PACE,
            queue: CommandQueue::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.level != self.target {
            Phase::Fading
        } else if self.hold_remaining > 0 {
            Phase::Holding
        } else {
            Phase::Idle
        }
    }

    /// Idle with nothing queued
    pub fn is_idle(&self) -> bool {
        self.phase() == Phase::Idle && self.queue.is_empty()
    }

    pub const fn level(&self) -> u8 {
        self.level
    }

    pub const fn target(&self) -> u8 {
        self.target
    }

    /// Value last computed for the drive, before inversion
    pub const fn corrected_level(&self) -> u8 {
        self.corrected
    }

    pub const fn hold_remaining(&self) -> u16 {
        self.hold_remaining
    }

    pub const fn pace_increment(&self) -> u16 {
        self.pace_increment
    }

    pub const fn flags(&self) -> ModeFlags {
        self.flags
    }

    /// Number of commands waiting
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn resource_id(&self) -> O::ResourceId {
        self.output.resource_id()
    }

    pub const fn output(&self) -> &O {
        &self.output
    }

    /// Start `command` now if the channel is idle, otherwise queue it
    ///
    /// A channel with queued work counts as busy so commands keep their order.
    pub fn request(&mut self, command: Command) -> Request {
        if self.phase() != Phase::Idle || !self.queue.is_empty() {
            return match self.queue.push(command) {
                Ok(()) => Request::Queued,
                Err(_) => Request::Dropped,
            };
        }

        self.apply(command);
        Request::Applied
    }

    /// Discard the running fade, the hold and the queue, then start `command`
    ///
    /// The level stays where the interrupted fade left it.
    pub fn request_now(&mut self, command: Command) -> Request {
        self.queue.clear();
        self.target = self.level;
        self.hold_remaining = 0;
        self.request(command)
    }

    /// Move the target by `delta`, saturating at 0 and 255
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn nudge(&mut self, delta: i16) {
        self.target = i16::from(self.target).saturating_add(delta).clamp(0, 255) as u8;
    }

    pub fn increase(&mut self) {
        self.nudge(1);
    }

    pub fn decrease(&mut self) {
        self.nudge(-1);
    }

    fn apply(&mut self, command: Command) {
        self.target = command.level;
        self.hold_remaining = command.hold_ms;

        if command.pace_ms == 0 || self.level == command.level {
            self.level = command.level;
        } else {
            self.pace_increment = pace_increment(command.pace_ms, self.level.abs_diff(command.level));
            self.pace_accumulator = 0;
        }
    }

    /// Advance the fade or hold by one millisecond
    pub(crate) fn advance(&mut self) -> Progress {
        match self.phase() {
            Phase::Fading => {
                self.pace_accumulator -= FADE_STEP;
                if self.pace_accumulator <= 0 {
                    self.pace_accumulator += i16::try_from(self.pace_increment).unwrap_or(i16::MAX);
                    if self.level > self.target {
                        self.level -= 1;
                    } else {
                        self.level += 1;
                    }
                }
                Progress::Busy
            }
            Phase::Holding => {
                self.hold_remaining -= 1;
                Progress::Busy
            }
            Phase::Idle => match self.queue.pop() {
                Some(command) => {
                    self.apply(command);
                    Progress::Dequeued
                }
                None => Progress::Idle,
            },
        }
    }

    /// Push the current level to the output
    ///
    /// Returns `true` when the channel needs the PWM tick.
    pub(crate) fn refresh_output(&mut self) -> bool {
        self.corrected = curve::drive_value(self.level, !self.flags.contains(ModeFlags::NO_CORRECTION));

        if self.level == 0 || self.level == u8::MAX {
            self.flags.remove(ModeFlags::DRIVE_ACTIVE);
            if self.level == 0 {
                self.drive_off();
            } else {
                self.drive_on();
            }
            return false;
        }

        self.flags.insert(ModeFlags::DRIVE_ACTIVE);
        if !self.flags.contains(ModeFlags::SOFTWARE) {
            let value = if self.flags.contains(ModeFlags::INVERTED) {
                u8::MAX - self.corrected
            } else {
                self.corrected
            };
            if self.output.set_drive_value(value).is_err() {
                self.flags.insert(ModeFlags::SOFTWARE);
            }
        }
        self.flags.contains(ModeFlags::SOFTWARE)
    }

    /// Software PWM: on at counter wrap, off when the counter reaches the level
    #[inline]
    pub(crate) fn pwm_step(&mut self, counter: u8) {
        if !self.flags.contains(ModeFlags::SOFTWARE_PWM) {
            return;
        }
        if counter == self.corrected {
            self.drive_off();
        } else if counter == 0 {
            self.drive_on();
        }
    }

    /// Drop the queue and hand the output back
    pub(crate) fn into_output(mut self) -> O {
        self.queue.clear();
        self.output
    }

    #[inline]
    fn drive_on(&mut self) {
        if self.flags.contains(ModeFlags::INVERTED) {
            self.output.set_low();
        } else {
            self.output.set_high();
        }
    }

    #[inline]
    fn drive_off(&mut self) {
        if self.flags.contains(ModeFlags::INVERTED) {
            self.output.set_high();
        } else {
            self.output.set_low();
        }
    }
}

/// Accumulator refill so that `delta` steps take about `pace_ms` ticks
#[allow(clippy::cast_lossless, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn pace_increment(pace_ms: u16, delta: u8) -> u16 {
    if delta == 0 {
        return MIN_PACE;
    }
    let delta = delta as u32;
    let scaled = (pace_ms as u32 * FADE_STEP as u32 + delta / 2) / delta;
    if scaled < MIN_PACE as u32 {
        MIN_PACE
    } else if scaled > MAX_PACE as u32 {
        MAX_PACE
    } else {
        scaled as u16
    }
}
