use embassy_time::Duration;
use heapless::Deque;

/// A deferred brightness change
///
/// Queued on a busy channel and applied once the running fade and hold finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Level to fade to
    pub level: u8,
    /// Duration of the fade in milliseconds, 0 for an immediate change
    pub pace_ms: u16,
    /// Milliseconds to stay at `level` before the next queued command
    pub hold_ms: u16,
}

impl Command {
    pub const fn new(level: u8, pace_ms: u16, hold_ms: u16) -> Self {
        Self {
            level,
            pace_ms,
            hold_ms,
        }
    }

    /// Build a command from durations, saturating each at `u16::MAX` milliseconds
    pub fn from_durations(level: u8, pace: Duration, hold: Duration) -> Self {
        Self::new(level, saturating_ms(pace), saturating_ms(hold))
    }
}

fn saturating_ms(duration: Duration) -> u16 {
    u16::try_from(duration.as_millis()).unwrap_or(u16::MAX)
}

/// FIFO of commands waiting for a channel to become idle
///
/// Q is the number of commands the queue can hold
#[derive(Debug, Default)]
pub struct CommandQueue<const Q: usize> {
    inner: Deque<Command, Q>,
}

impl<const Q: usize> CommandQueue<Q> {
    pub const fn new() -> Self {
        Self {
            inner: Deque::new(),
        }
    }

    /// Append a command to the back of the queue
    ///
    /// Returns the command if the queue is full
    pub fn push(&mut self, command: Command) -> Result<(), Command> {
        self.inner.push_back(command)
    }

    /// Take the oldest command
    pub fn pop(&mut self) -> Option<Command> {
        self.inner.pop_front()
    }

    /// Peek at the oldest command without removing it
    pub fn front(&self) -> Option<&Command> {
        self.inner.front()
    }

    /// Drop every queued command
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
