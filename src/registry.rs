//! Fixed-capacity arena of live channels.
//!
//! Channels live in slots that never move. A [`ChannelHandle`] names a slot
//! together with the slot's generation, so a handle kept after `deregister`
//! can never reach the channel that later reuses the slot. Live slots are
//! additionally listed in claim order, which is the order both schedulers
//! visit them in.

use core::ops::ControlFlow;

use heapless::Vec;

use crate::OutputCapability;
use crate::channel::Channel;
use crate::error::ResourceUnavailable;

/// Stable reference to a registered channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    index: usize,
    generation: u16,
}

impl ChannelHandle {
    /// Slot the channel occupies
    pub const fn index(self) -> usize {
        self.index
    }
}

struct Slot<O, const Q: usize> {
    generation: u16,
    channel: Option<Channel<O, Q>>,
}

impl<O, const Q: usize> Slot<O, Q> {
    const fn vacant() -> Self {
        Self {
            generation: 0,
            channel: None,
        }
    }
}

/// Set of live channels
///
/// N is the maximum number of channels, Q the queue depth of each channel
pub struct ChannelRegistry<O, const N: usize, const Q: usize> {
    slots: [Slot<O, Q>; N],
    order: Vec<usize, N>,
}

impl<O: OutputCapability, const N: usize, const Q: usize> ChannelRegistry<O, N, Q> {
    pub const fn new() -> Self {
        Self {
            slots: [const { Slot::<O, Q>::vacant() }; N],
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.is_full()
    }

    /// Check if a live channel owns `resource`
    pub fn is_claimed(&self, resource: O::ResourceId) -> bool {
        self.iter().any(|channel| channel.resource_id() == resource)
    }

    /// Add a channel, rejecting a second channel on the same resource
    pub fn register(&mut self, channel: Channel<O, Q>) -> Result<ChannelHandle, ResourceUnavailable> {
        if self.is_claimed(channel.resource_id()) {
            return Err(ResourceUnavailable::AlreadyClaimed);
        }
        let Some(index) = self.slots.iter().position(|slot| slot.channel.is_none()) else {
            return Err(ResourceUnavailable::RegistryFull);
        };
        self.order
            .push(index)
            .map_err(|_| ResourceUnavailable::RegistryFull)?;

        let slot = &mut self.slots[index];
        slot.channel = Some(channel);
        Ok(ChannelHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Remove a channel and free its slot
    ///
    /// Returns `None` for a stale handle.
    pub fn deregister(&mut self, handle: ChannelHandle) -> Option<Channel<O, Q>> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let channel = slot.channel.take()?;
        slot.generation = slot.generation.wrapping_add(1);

        if let Some(position) = self.order.iter().position(|&index| index == handle.index) {
            self.order.remove(position);
        }
        Some(channel)
    }

    pub fn get(&self, handle: ChannelHandle) -> Option<&Channel<O, Q>> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.channel.as_ref()
    }

    pub fn get_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel<O, Q>> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.channel.as_mut()
    }

    /// Iterate live channels in claim order
    pub fn iter(&self) -> impl Iterator<Item = &Channel<O, Q>> {
        self.order
            .iter()
            .filter_map(|&index| self.slots.get(index)?.channel.as_ref())
    }

    /// Visit live channels in claim order until `visit` breaks
    pub(crate) fn visit<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Channel<O, Q>) -> ControlFlow<()>,
    {
        for &index in &self.order {
            let Some(channel) = self.slots.get_mut(index).and_then(|slot| slot.channel.as_mut()) else {
                continue;
            };
            if visit(channel).is_break() {
                break;
            }
        }
    }
}

impl<O: OutputCapability, const N: usize, const Q: usize> Default for ChannelRegistry<O, N, Q> {
    fn default() -> Self {
        Self::new()
    }
}
