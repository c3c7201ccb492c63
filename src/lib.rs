#![cfg_attr(not(test), no_std)]

//! Driver for the Microchip MCP2515 stand-alone CAN controller on SPI.
//!
//! The crate owns the controller's byte transport, its command protocol
//! and its bring-up: hardware reset, acceptance mask and filter clearing,
//! bit-timing programming, interrupt unmasking and the switch into an
//! operating mode, verified by reading the mode back.
//!
//! Everything is generic over the `embedded-hal` 0.2 traits, so the driver
//! runs unchanged on any MCU HAL that provides a full-duplex SPI
//! peripheral, an output pin for chip select and a millisecond delay.
//! Frame traffic through the controller's buffers is not part of this
//! crate; [`Frame`] is the value type upstream code builds on.
//!
//! The `defmt` feature derives `defmt::Format` on the public types and
//! logs bring-up milestones.

pub mod error;
pub mod frame;
pub mod registers;
pub mod spi;
pub mod timing;

mod mcp2515;

pub use error::{Error, TransportError};
pub use frame::Frame;
pub use mcp2515::{Config, Mcp2515};
pub use registers::OpMode;

#[cfg(test)]
pub(crate) mod mocks;
