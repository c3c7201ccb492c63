//! Test doubles: a simulated MCP2515 on the far end of the SPI link.
//!
//! The three hardware halves handed to the driver (SPI peripheral,
//! chip-select pin, delay) share one [`ControllerState`], so tests can
//! replay traffic in order, preset registers and inject faults.

use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::spi::FullDuplex;

use crate::registers::{self, OpMode};

/// One observable hardware event, in occurrence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Select,
    Deselect,
    Sent(u8),
    Delay(u8),
}

const REGISTER_FILE: usize = 0x80;

pub struct ControllerState {
    pub regs: [u8; REGISTER_FILE],
    selected: bool,
    command: Vec<u8>,
    reply: Option<u8>,
    pub events: Vec<Event>,
    /// Permanently unready SPI when set.
    pub jam: bool,
    /// Mirror REQOP into OPMOD on CANCTRL writes. Cleared to simulate a
    /// controller that refuses the mode change.
    pub follow_mode_requests: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            regs: [0; REGISTER_FILE],
            selected: false,
            command: Vec::new(),
            reply: None,
            events: Vec::new(),
            jam: false,
            follow_mode_requests: true,
        }
    }
}

impl ControllerState {
    fn finish_command(&mut self) {
        let command = std::mem::take(&mut self.command);
        match *command.as_slice() {
            [0xC0] => self.power_on_reset(),
            [0x02, address, value] => self.store(address, value),
            _ => {}
        }
    }

    /// RESET reverts the control block. The acceptance mask and filter
    /// registers keep their contents, as on the real chip.
    fn power_on_reset(&mut self) {
        for address in [
            registers::cnf1::ADDR,
            registers::cnf2::ADDR,
            registers::cnf3::ADDR,
            registers::caninte::ADDR,
        ] {
            self.regs[address as usize] = 0x00;
        }
        self.regs[registers::canctrl::ADDR as usize] = OpMode::Configuration.reqop_bits()
            | registers::canctrl::CLKEN
            | registers::canctrl::CLKPRE_MASK;
        self.regs[registers::canstat::ADDR as usize] = OpMode::Configuration.reqop_bits();
    }

    fn store(&mut self, address: u8, value: u8) {
        let address = (address & 0x7F) as usize;
        // CANSTAT is read-only silicon; writes to it land nowhere.
        if address == registers::canstat::ADDR as usize {
            return;
        }
        self.regs[address] = value;
        if address == registers::canctrl::ADDR as usize && self.follow_mode_requests {
            self.regs[registers::canstat::ADDR as usize] = value & registers::canctrl::REQOP_MASK;
        }
    }

    fn reply_for(&self) -> u8 {
        match *self.command.as_slice() {
            // The reply to READ rides on the third clocked byte.
            [0x03, address, _] => self.regs[(address & 0x7F) as usize],
            _ => 0x00,
        }
    }
}

/// Build the SPI/CS/Delay trio plus an inspection handle, all sharing one
/// controller.
pub fn controller() -> (MockSpi, MockCs, MockDelay, Handle) {
    let state = Rc::new(RefCell::new(ControllerState::default()));
    (
        MockSpi {
            state: Rc::clone(&state),
        },
        MockCs {
            state: Rc::clone(&state),
        },
        MockDelay {
            state: Rc::clone(&state),
        },
        Handle { state },
    )
}

pub struct Handle {
    state: Rc<RefCell<ControllerState>>,
}

impl Handle {
    pub fn preset(&self, address: u8, value: u8) {
        self.state.borrow_mut().regs[address as usize] = value;
    }

    pub fn reg(&self, address: u8) -> u8 {
        self.state.borrow().regs[address as usize]
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn selected(&self) -> bool {
        self.state.borrow().selected
    }

    pub fn jam(&self) {
        self.state.borrow_mut().jam = true;
    }

    pub fn refuse_mode_changes(&self) {
        self.state.borrow_mut().follow_mode_requests = false;
    }

    /// Byte groups between select and deselect, in order.
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        let state = self.state.borrow();
        let mut all = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in state.events.iter() {
            match event {
                Event::Select => current = Some(Vec::new()),
                Event::Sent(byte) => {
                    if let Some(bytes) = current.as_mut() {
                        bytes.push(*byte);
                    }
                }
                Event::Deselect => {
                    if let Some(bytes) = current.take() {
                        all.push(bytes);
                    }
                }
                Event::Delay(_) => {}
            }
        }
        all
    }

    /// Decoded WRITE commands as (address, value), in order.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.transactions()
            .iter()
            .filter(|bytes| bytes.len() == 3 && bytes[0] == 0x02)
            .map(|bytes| (bytes[1], bytes[2]))
            .collect()
    }
}

pub struct MockSpi {
    state: Rc<RefCell<ControllerState>>,
}

impl FullDuplex<u8> for MockSpi {
    type Error = Infallible;

    fn send(&mut self, word: u8) -> nb::Result<(), Infallible> {
        let mut state = self.state.borrow_mut();
        if state.jam {
            return Err(nb::Error::WouldBlock);
        }
        assert!(state.selected, "byte clocked while chip select idle");
        state.events.push(Event::Sent(word));
        state.command.push(word);
        let reply = state.reply_for();
        state.reply = Some(reply);
        Ok(())
    }

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        let mut state = self.state.borrow_mut();
        if state.jam {
            return Err(nb::Error::WouldBlock);
        }
        state.reply.take().ok_or(nb::Error::WouldBlock)
    }
}

pub struct MockCs {
    state: Rc<RefCell<ControllerState>>,
}

impl OutputPin for MockCs {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut state = self.state.borrow_mut();
        assert!(!state.selected, "select asserted twice");
        state.selected = true;
        state.events.push(Event::Select);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut state = self.state.borrow_mut();
        // Driving an already idle line is a no-op, as on real hardware.
        if state.selected {
            state.selected = false;
            state.events.push(Event::Deselect);
            state.finish_command();
        }
        Ok(())
    }
}

pub struct MockDelay {
    state: Rc<RefCell<ControllerState>>,
}

impl DelayMs<u8> for MockDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.state.borrow_mut().events.push(Event::Delay(ms));
    }
}
