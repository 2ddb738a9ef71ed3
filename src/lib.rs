#![no_std]

pub mod channel;
pub mod command;
pub mod curve;
pub mod dimmer;
pub mod error;
pub mod gate;
pub mod registry;
pub mod scheduler;
pub mod timing;

use core::fmt::Debug;

pub use channel::{Channel, ChannelConfig, DriveMode, ModeFlags, Phase, Request};
pub use command::{Command, CommandQueue};
pub use dimmer::{Dimmer, Engine};
pub use error::{InvalidHandle, ResourceUnavailable, Unsupported};
pub use gate::{TickControl, TriggerGate};
pub use registry::{ChannelHandle, ChannelRegistry};
pub use scheduler::{FadeScheduler, PwmScheduler};

pub use embassy_time::Duration;

/// Abstract output pin
///
/// Implement this trait to map a logical resource onto a concrete pin and,
/// where the pin has one, a hardware PWM compare register. The dimmer never
/// touches hardware directly.
pub trait OutputCapability: Sized {
    /// Identifies a physical output, e.g. a pin number
    type ResourceId: Copy + Eq + Debug;

    /// Take exclusive ownership of `resource` and configure it as an output
    fn claim(resource: Self::ResourceId) -> Result<Self, ResourceUnavailable>;

    /// The resource this output was claimed from
    fn resource_id(&self) -> Self::ResourceId;

    /// Drive the pin high, detaching any PWM unit first
    fn set_high(&mut self);

    /// Drive the pin low, detaching any PWM unit first
    fn set_low(&mut self);

    /// Attach the PWM unit and write a duty value (0-255)
    ///
    /// Scaling to wider compare registers is up to the implementation.
    fn set_drive_value(&mut self, value: u8) -> Result<(), Unsupported>;

    /// Check if the pin has a hardware PWM unit
    fn supports_hardware_drive(&self) -> bool;
}
