//! The two interrupt-driven sweeps over the channel registry.
//!
//! Neither sweep allocates or loops more than once over the live channels.
//! They expect the caller to hold whatever lock guards the registry; inside
//! [`crate::Dimmer`] that is the critical section.

use core::ops::ControlFlow;

use crate::OutputCapability;
use crate::channel::Progress;
use crate::gate::{TickControl, TriggerGate};
use crate::registry::ChannelRegistry;

/// Millisecond tick: fades, holds, dequeues and refreshes outputs
#[derive(Debug, Clone, Copy, Default)]
pub struct FadeScheduler;

impl FadeScheduler {
    /// Run one fade tick over every live channel
    ///
    /// At most one queued command is started per tick. The sweep stops at the
    /// channel that dequeued, so channels after it wait one more tick.
    /// Once nothing is fading, holding or queued the fade tick is disarmed,
    /// and the PWM tick with it when no channel needs software drive.
    pub fn tick<O, T, const N: usize, const Q: usize>(
        registry: &mut ChannelRegistry<O, N, Q>,
        gate: &mut TriggerGate<T>,
    ) where
        O: OutputCapability,
        T: TickControl,
    {
        let mut busy = false;
        let mut software_pwm = false;

        registry.visit(|channel| {
            match channel.advance() {
                Progress::Idle => {}
                Progress::Busy => busy = true,
                Progress::Dequeued => {
                    busy = true;
                    return ControlFlow::Break(());
                }
            }
            if channel.refresh_output() {
                software_pwm = true;
            }
            ControlFlow::Continue(())
        });

        if !busy {
            gate.disarm_fade();
            if !software_pwm {
                gate.disarm_pwm();
            }
        }
    }
}

/// High-frequency tick: toggles software-driven outputs
///
/// Owns the free-running counter all channels compare against, so each
/// channel is on for `corrected_level` out of every 256 ticks.
#[derive(Debug, Clone, Default)]
pub struct PwmScheduler {
    counter: u8,
}

impl PwmScheduler {
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Counter value the next tick compares against
    pub const fn counter(&self) -> u8 {
        self.counter
    }

    #[inline]
    pub fn tick<O, const N: usize, const Q: usize>(&mut self, registry: &mut ChannelRegistry<O, N, Q>)
    where
        O: OutputCapability,
    {
        let counter = self.counter;
        registry.visit(|channel| {
            channel.pwm_step(counter);
            ControlFlow::Continue(())
        });
        self.counter = counter.wrapping_add(1);
    }
}
