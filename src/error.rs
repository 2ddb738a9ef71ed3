//! Error types shared by the dimmer and its output capabilities.

use core::fmt;

/// Returned when an output resource cannot be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUnavailable {
    /// Another live channel already owns this resource.
    AlreadyClaimed,
    /// The resource does not exist or cannot be used as an output.
    NotAvailable,
    /// Every channel slot is in use.
    RegistryFull,
}

impl fmt::Display for ResourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyClaimed => f.write_str("resource is already claimed"),
            Self::NotAvailable => f.write_str("resource is not available"),
            Self::RegistryFull => f.write_str("no free channel slot"),
        }
    }
}

/// Returned by an output that has no hardware PWM unit attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported;

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("hardware drive is not supported")
    }
}

/// Returned when a handle does not refer to a live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidHandle;

impl fmt::Display for InvalidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("channel handle is stale or unknown")
    }
}
