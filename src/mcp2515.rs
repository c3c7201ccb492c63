//! MCP2515 driver: command framing, register access and controller
//! bring-up.
//!
//! The controller speaks SPI mode 0, MSB first, with an active-low chip
//! select. Every command occupies one select window and is ordered opcode,
//! address, data for the commands that carry them.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::spi::FullDuplex;

use crate::error::{Error, TransportError};
use crate::registers::{self, OpMode};
use crate::spi::SpiBus;
use crate::timing::BitTiming;

/// SPI instruction opcodes understood by the controller.
#[repr(u8)]
enum Instruction {
    Write = 0x02,
    Read = 0x03,
    Reset = 0xC0,
}

/// Settle time after a hardware reset.
const RESET_SETTLE_MS: u8 = 1;
/// Status reads granted to a mode change before it counts as refused.
const MODE_POLL_ATTEMPTS: u32 = 10;
const MODE_POLL_INTERVAL_MS: u8 = 1;

/// All eight interrupt sources, routed out on the INT pin together.
const INT_SOURCES: u8 = registers::caninte::MERRE
    | registers::caninte::WAKIE
    | registers::caninte::ERRIE
    | registers::caninte::TX2IE
    | registers::caninte::TX1IE
    | registers::caninte::TX0IE
    | registers::caninte::RX1IE
    | registers::caninte::RX0IE;

/// Bring-up parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Oscillator frequency at the controller's OSC1 pin, in hertz.
    pub clock_hz: u32,
    /// CAN bus bit rate, in bits per second.
    pub bit_rate: u32,
    /// Mode to enter once configuration is written.
    pub mode: OpMode,
}

impl Default for Config {
    /// 500 kbps on the 8 MHz crystal of the common breakout boards,
    /// ending in normal mode.
    fn default() -> Self {
        Self {
            clock_hz: 8_000_000,
            bit_rate: 500_000,
            mode: OpMode::Normal,
        }
    }
}

pub struct Mcp2515<SPI, CS, D> {
    bus: SpiBus<SPI>,
    cs: CS,
    delay: D,
}

impl<SPI, CS, D, E, PE> Mcp2515<SPI, CS, D>
where
    SPI: FullDuplex<u8, Error = E>,
    CS: OutputPin<Error = PE>,
    D: DelayMs<u8>,
{
    pub fn new(spi: SPI, cs: CS, delay: D) -> Self {
        Self {
            bus: SpiBus::new(spi),
            cs,
            delay,
        }
    }

    /// Bring the controller from its power-on state into the configured
    /// operating mode.
    pub fn init(&mut self, config: Config) -> Result<(), Error<E, PE>> {
        let timing = BitTiming::from_bit_rate(config.clock_hz, config.bit_rate)?;

        // Commands only frame correctly when select starts out released.
        self.cs.set_high().map_err(|err| Error::ChipSelect(err))?;

        // Reset drops the controller into configuration mode, which the
        // CNF registers require.
        self.reset()?;

        // Accept-all reception: no mask bit compared, filter 0 matching
        // standard frames.
        self.write_register(registers::rxm0sidh::ADDR, 0x00)?;
        self.write_register(registers::rxm1sidh::ADDR, 0x00)?;
        self.write_register(registers::rxf0sidl::ADDR, 0x00)?;

        // The timing trio is one configuration; the three writes stay
        // adjacent.
        self.write_register(registers::cnf1::ADDR, timing.cnf1)?;
        self.write_register(registers::cnf2::ADDR, timing.cnf2)?;
        self.write_register(registers::cnf3::ADDR, timing.cnf3)?;

        // Unmask every interrupt source.
        self.write_register(registers::caninte::ADDR, INT_SOURCES)?;

        // Leave configuration mode. This stays the last write of the
        // sequence; the reads below only verify.
        self.write_register(registers::canctrl::ADDR, config.mode.reqop_bits())?;
        self.wait_for_mode(config.mode)?;

        #[cfg(feature = "defmt")]
        defmt::info!("mcp2515: up at {} bps in {} mode", config.bit_rate, config.mode);

        Ok(())
    }

    /// Issue the reset instruction and wait out the restart.
    ///
    /// Afterwards the controller reports configuration mode and the
    /// control registers hold their power-on defaults.
    pub fn reset(&mut self) -> Result<(), Error<E, PE>> {
        self.with_select(|bus| bus.send(Instruction::Reset as u8))?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Write one register.
    ///
    /// The controller sends no acknowledgement; reading back is the only
    /// confirmation a caller can get.
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), Error<E, PE>> {
        self.with_select(|bus| {
            bus.send(Instruction::Write as u8)?;
            bus.send(address)?;
            bus.send(value)
        })
    }

    /// Read one register back.
    pub fn read_register(&mut self, address: u8) -> Result<u8, Error<E, PE>> {
        self.with_select(|bus| {
            bus.send(Instruction::Read as u8)?;
            bus.send(address)?;
            bus.receive()
        })
    }

    /// Mode the controller currently reports, `None` on a reserved
    /// encoding.
    pub fn operating_mode(&mut self) -> Result<Option<OpMode>, Error<E, PE>> {
        let status = self.read_register(registers::canstat::ADDR)?;
        Ok(OpMode::from_opmod(status))
    }

    /// Tear the driver down and hand the hardware back.
    pub fn release(self) -> (SPI, CS, D) {
        (self.bus.release(), self.cs, self.delay)
    }

    fn wait_for_mode(&mut self, requested: OpMode) -> Result<(), Error<E, PE>> {
        let mut status = 0;
        for _ in 0..MODE_POLL_ATTEMPTS {
            status = self.read_register(registers::canstat::ADDR)?;
            if OpMode::from_opmod(status) == Some(requested) {
                return Ok(());
            }
            self.delay.delay_ms(MODE_POLL_INTERVAL_MS);
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("mcp2515: mode change refused, canstat = 0x{:x}", status);

        Err(Error::ModeTransition {
            requested,
            canstat: status,
        })
    }

    /// Run one command with chip select asserted. The line is released
    /// again even when a transfer fails mid-command.
    fn with_select<T>(
        &mut self,
        command: impl FnOnce(&mut SpiBus<SPI>) -> Result<T, TransportError<E>>,
    ) -> Result<T, Error<E, PE>> {
        self.cs.set_low().map_err(|err| Error::ChipSelect(err))?;
        let result = command(&mut self.bus);
        self.cs.set_high().map_err(|err| Error::ChipSelect(err))?;
        result.map_err(Error::from)
    }
}
