#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use smooth_dimmer::{Dimmer, OutputCapability, ResourceUnavailable, TickControl, Unsupported};

/// Pins 0..=19 exist on the mock board
pub const PIN_COUNT: u8 = 20;

/// Pins wired to a PWM unit
pub const HARDWARE_PINS: [u8; 6] = [3, 5, 6, 9, 10, 11];

/// Advertises a PWM unit but rejects every duty write
pub const BROKEN_PWM_PIN: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Low,
    High,
    Pwm(u8),
}

thread_local! {
    static BOARD: RefCell<HashMap<u8, Drive>> = RefCell::new(HashMap::new());
}

/// Forget every pin state recorded on this thread
pub fn reset_board() {
    BOARD.with(|board| board.borrow_mut().clear());
}

/// Last state written to `pin`
pub fn pin(pin: u8) -> Option<Drive> {
    BOARD.with(|board| board.borrow().get(&pin).copied())
}

fn record(pin: u8, drive: Drive) {
    BOARD.with(|board| {
        board.borrow_mut().insert(pin, drive);
    });
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockPin {
    id: u8,
}

impl OutputCapability for MockPin {
    type ResourceId = u8;

    fn claim(resource: u8) -> Result<Self, ResourceUnavailable> {
        if resource >= PIN_COUNT {
            return Err(ResourceUnavailable::NotAvailable);
        }
        record(resource, Drive::Low);
        Ok(Self { id: resource })
    }

    fn resource_id(&self) -> u8 {
        self.id
    }

    fn set_high(&mut self) {
        record(self.id, Drive::High);
    }

    fn set_low(&mut self) {
        record(self.id, Drive::Low);
    }

    fn set_drive_value(&mut self, value: u8) -> Result<(), Unsupported> {
        if !HARDWARE_PINS.contains(&self.id) {
            return Err(Unsupported);
        }
        record(self.id, Drive::Pwm(value));
        Ok(())
    }

    fn supports_hardware_drive(&self) -> bool {
        HARDWARE_PINS.contains(&self.id) || self.id == BROKEN_PWM_PIN
    }
}

/// Tick control that counts what it was asked to do
#[derive(Debug, Default)]
pub struct Ticks {
    pub fade_on: bool,
    pub pwm_on: bool,
    pub fade_enables: u32,
    pub fade_disables: u32,
    pub pwm_enables: u32,
    pub pwm_disables: u32,
}

impl Ticks {
    pub const fn new() -> Self {
        Self {
            fade_on: false,
            pwm_on: false,
            fade_enables: 0,
            fade_disables: 0,
            pwm_enables: 0,
            pwm_disables: 0,
        }
    }
}

impl TickControl for Ticks {
    fn enable_fade_tick(&mut self) {
        self.fade_on = true;
        self.fade_enables += 1;
    }

    fn disable_fade_tick(&mut self) {
        self.fade_on = false;
        self.fade_disables += 1;
    }

    fn enable_pwm_tick(&mut self) {
        self.pwm_on = true;
        self.pwm_enables += 1;
    }

    fn disable_pwm_tick(&mut self) {
        self.pwm_on = false;
        self.pwm_disables += 1;
    }
}

pub type TestDimmer = Dimmer<MockPin, Ticks, 4, 4>;

/// Fresh dimmer on a fresh board
pub fn dimmer() -> TestDimmer {
    reset_board();
    Dimmer::new(Ticks::new())
}

pub fn fade_ticks(dimmer: &TestDimmer, count: usize) {
    for _ in 0..count {
        dimmer.fade_tick();
    }
}

pub fn pwm_ticks(dimmer: &TestDimmer, count: usize) {
    for _ in 0..count {
        dimmer.pwm_tick();
    }
}
