//! Shared dimmer state for foreground code and the two tick interrupts.
//!
//! [`Engine`] holds the registry, the tick gate and the PWM counter and knows
//! nothing about locking. [`Dimmer`] wraps it in a `critical-section` mutex
//! so it can live in a `static` and be reached from interrupt handlers:
//!
//! ```ignore
//! static DIMMER: Dimmer<BoardPin, BoardTimers, 8, 4> = Dimmer::new(BoardTimers);
//!
//! #[interrupt]
//! fn TIMER0_COMPA() {
//!     DIMMER.fade_tick();
//! }
//!
//! #[interrupt]
//! fn TIMER1_OVF() {
//!     DIMMER.pwm_tick();
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::OutputCapability;
use crate::channel::{Channel, ChannelConfig, Phase, Request};
use crate::command::Command;
use crate::error::{InvalidHandle, ResourceUnavailable};
use crate::gate::{TickControl, TriggerGate};
use crate::registry::{ChannelHandle, ChannelRegistry};
use crate::scheduler::{FadeScheduler, PwmScheduler};

/// Lock-free core of the dimmer
///
/// Use directly when the platform provides its own locking, for example
/// a shared resource in an interrupt-driven framework.
pub struct Engine<O, T, const N: usize, const Q: usize> {
    registry: ChannelRegistry<O, N, Q>,
    gate: TriggerGate<T>,
    pwm: PwmScheduler,
}

impl<O, T, const N: usize, const Q: usize> Engine<O, T, N, Q>
where
    O: OutputCapability,
    T: TickControl,
{
    pub const fn new(control: T) -> Self {
        Self {
            registry: ChannelRegistry::new(),
            gate: TriggerGate::new(control),
            pwm: PwmScheduler::new(),
        }
    }

    /// Claim `resource` and start it fully off
    pub fn claim(
        &mut self,
        resource: O::ResourceId,
        config: ChannelConfig,
    ) -> Result<ChannelHandle, ResourceUnavailable> {
        if self.registry.is_claimed(resource) {
            return Err(ResourceUnavailable::AlreadyClaimed);
        }
        if self.registry.is_full() {
            return Err(ResourceUnavailable::RegistryFull);
        }

        let output = O::claim(resource)?;
        let handle = self.registry.register(Channel::new(output, config))?;

        #[cfg(feature = "esp32-log")]
        println!("[Engine.claim] {:?} -> slot {}", resource, handle.index());

        self.gate.arm();
        Ok(handle)
    }

    /// Release a channel, dropping its queue and returning its output
    ///
    /// Both ticks are disarmed when the last channel goes away. Otherwise the
    /// fade tick is armed so that its next sweep drops the PWM tick if the
    /// released channel was the last one using it.
    pub fn release(&mut self, handle: ChannelHandle) -> Option<O> {
        let channel = self.registry.deregister(handle)?;

        #[cfg(feature = "esp32-log")]
        println!(
            "[Engine.release] slot {} ({} queued dropped)",
            handle.index(),
            channel.pending()
        );

        if self.registry.is_empty() {
            self.gate.disarm();
        } else {
            self.gate.arm_fade();
        }
        Some(channel.into_output())
    }

    /// Run `command` now if the channel is idle, otherwise queue it
    ///
    /// A full queue drops the command without reporting it.
    pub fn request(&mut self, handle: ChannelHandle, command: Command) -> Result<(), InvalidHandle> {
        let channel = self.registry.get_mut(handle).ok_or(InvalidHandle)?;
        match channel.request(command) {
            Request::Applied => self.gate.arm(),
            Request::Queued => {}
            Request::Dropped => {
                #[cfg(feature = "esp32-log")]
                println!("[Engine.request] queue full, dropped {:?}", command);
            }
        }
        Ok(())
    }

    /// Cancel running and queued work, then run `command`
    pub fn request_now(&mut self, handle: ChannelHandle, command: Command) -> Result<(), InvalidHandle> {
        let channel = self.registry.get_mut(handle).ok_or(InvalidHandle)?;
        channel.request_now(command);
        self.gate.arm();
        Ok(())
    }

    /// Shift the target level by `delta`, saturating
    pub fn nudge(&mut self, handle: ChannelHandle, delta: i16) -> Result<(), InvalidHandle> {
        let channel = self.registry.get_mut(handle).ok_or(InvalidHandle)?;
        channel.nudge(delta);
        self.gate.arm();
        Ok(())
    }

    pub fn fade_tick(&mut self) {
        FadeScheduler::tick(&mut self.registry, &mut self.gate);
    }

    #[inline]
    pub fn pwm_tick(&mut self) {
        self.pwm.tick(&mut self.registry);
    }

    pub fn channel(&self, handle: ChannelHandle) -> Result<&Channel<O, Q>, InvalidHandle> {
        self.registry.get(handle).ok_or(InvalidHandle)
    }

    pub const fn registry(&self) -> &ChannelRegistry<O, N, Q> {
        &self.registry
    }

    pub const fn gate(&self) -> &TriggerGate<T> {
        &self.gate
    }

    pub const fn pwm(&self) -> &PwmScheduler {
        &self.pwm
    }
}

/// Dimmer shared between foreground code and interrupts
///
/// Every method runs inside a critical section, which keeps both tick
/// handlers out while foreground code changes channel state.
///
/// N is the maximum number of channels, Q the queue depth of each channel
pub struct Dimmer<O, T, const N: usize, const Q: usize> {
    inner: Mutex<RefCell<Engine<O, T, N, Q>>>,
}

impl<O, T, const N: usize, const Q: usize> Dimmer<O, T, N, Q>
where
    O: OutputCapability,
    T: TickControl,
{
    pub const fn new(control: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Engine::new(control))),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn lock<R>(&self, f: impl FnOnce(&mut Engine<O, T, N, Q>) -> R) -> R {
        critical_section::with(|cs| {
            let mut engine = self.inner.borrow(cs).borrow_mut();
            f(&mut *engine)
        })
    }

    /// Claim an output resource as a new channel
    ///
    /// Fails if another live channel owns the resource, the resource cannot
    /// be claimed, or all N slots are taken.
    pub fn claim(
        &self,
        resource: O::ResourceId,
        config: ChannelConfig,
    ) -> Result<ChannelHandle, ResourceUnavailable> {
        self.lock(|engine| engine.claim(resource, config))
    }

    /// Release a channel and get its output back
    pub fn release(&self, handle: ChannelHandle) -> Option<O> {
        self.lock(|engine| engine.release(handle))
    }

    /// Fade to `level` over `pace_ms`, then hold for `hold_ms`
    ///
    /// Queued behind any running work. Delivery is best effort: when the
    /// queue is full the request is silently dropped.
    pub fn request(
        &self,
        handle: ChannelHandle,
        level: u8,
        pace_ms: u16,
        hold_ms: u16,
    ) -> Result<(), InvalidHandle> {
        self.enqueue(handle, Command::new(level, pace_ms, hold_ms))
    }

    /// Same as [`Dimmer::request`] with a prepared command
    pub fn enqueue(&self, handle: ChannelHandle, command: Command) -> Result<(), InvalidHandle> {
        self.lock(|engine| engine.request(handle, command))
    }

    /// Like [`Dimmer::request`], but discards the running fade, the hold and
    /// everything queued first
    pub fn request_now(
        &self,
        handle: ChannelHandle,
        level: u8,
        pace_ms: u16,
        hold_ms: u16,
    ) -> Result<(), InvalidHandle> {
        self.lock(|engine| engine.request_now(handle, Command::new(level, pace_ms, hold_ms)))
    }

    pub fn nudge(&self, handle: ChannelHandle, delta: i16) -> Result<(), InvalidHandle> {
        self.lock(|engine| engine.nudge(handle, delta))
    }

    pub fn increase(&self, handle: ChannelHandle) -> Result<(), InvalidHandle> {
        self.nudge(handle, 1)
    }

    pub fn decrease(&self, handle: ChannelHandle) -> Result<(), InvalidHandle> {
        self.nudge(handle, -1)
    }

    /// Fade tick entry point, call once per millisecond
    pub fn fade_tick(&self) {
        self.lock(Engine::fade_tick);
    }

    /// PWM tick entry point, call 256 times per PWM period
    #[inline]
    pub fn pwm_tick(&self) {
        self.lock(Engine::pwm_tick);
    }

    pub fn level(&self, handle: ChannelHandle) -> Result<u8, InvalidHandle> {
        self.inspect(handle, Channel::level)
    }

    pub fn target(&self, handle: ChannelHandle) -> Result<u8, InvalidHandle> {
        self.inspect(handle, Channel::target)
    }

    pub fn corrected_level(&self, handle: ChannelHandle) -> Result<u8, InvalidHandle> {
        self.inspect(handle, Channel::corrected_level)
    }

    pub fn phase(&self, handle: ChannelHandle) -> Result<Phase, InvalidHandle> {
        self.inspect(handle, Channel::phase)
    }

    /// Number of queued commands
    pub fn pending(&self, handle: ChannelHandle) -> Result<usize, InvalidHandle> {
        self.inspect(handle, Channel::pending)
    }

    /// Idle with an empty queue
    pub fn is_idle(&self, handle: ChannelHandle) -> Result<bool, InvalidHandle> {
        self.inspect(handle, Channel::is_idle)
    }

    /// Number of live channels
    pub fn len(&self) -> usize {
        self.lock(|engine| engine.registry().len())
    }

    pub fn is_empty(&self) -> bool {
        self.lock(|engine| engine.registry().is_empty())
    }

    pub fn fade_tick_armed(&self) -> bool {
        self.lock(|engine| engine.gate().fade_armed())
    }

    pub fn pwm_tick_armed(&self) -> bool {
        self.lock(|engine| engine.gate().pwm_armed())
    }

    fn inspect<R>(
        &self,
        handle: ChannelHandle,
        f: impl FnOnce(&Channel<O, Q>) -> R,
    ) -> Result<R, InvalidHandle> {
        self.lock(|engine| engine.channel(handle).map(f))
    }
}
