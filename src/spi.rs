//! Byte transport to the controller.
//!
//! The MCP2515 command protocol is a plain byte stream; chip-select framing
//! belongs to the driver above this layer. SPI is full duplex, so every
//! transmitted byte latches a received one: [`SpiBus::send`] drains that
//! byte right away, and [`SpiBus::receive`] obtains its byte by clocking
//! out a flush byte.

use embedded_hal::spi::FullDuplex;

use crate::error::TransportError;

/// Byte clocked out when only the reply matters.
pub const FLUSH_BYTE: u8 = 0xFF;

/// Poll iterations granted to a single transfer before it counts as stuck.
pub const DEFAULT_POLL_BUDGET: u32 = 100_000;

pub struct SpiBus<SPI> {
    spi: SPI,
    poll_budget: u32,
}

impl<SPI, E> SpiBus<SPI>
where
    SPI: FullDuplex<u8, Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self::with_poll_budget(spi, DEFAULT_POLL_BUDGET)
    }

    pub fn with_poll_budget(spi: SPI, poll_budget: u32) -> Self {
        Self { spi, poll_budget }
    }

    /// Transmit one byte and discard the byte shifted in alongside it.
    ///
    /// Returns once the transfer has completed, so the shift register is
    /// never left holding stale data.
    pub fn send(&mut self, byte: u8) -> Result<(), TransportError<E>> {
        self.poll(|spi| spi.send(byte))?;
        let _ = self.poll(|spi| spi.read())?;
        Ok(())
    }

    /// Clock one byte in by transmitting [`FLUSH_BYTE`].
    pub fn receive(&mut self) -> Result<u8, TransportError<E>> {
        self.poll(|spi| spi.send(FLUSH_BYTE))?;
        self.poll(|spi| spi.read())
    }

    /// Give the peripheral back.
    pub fn release(self) -> SPI {
        self.spi
    }

    fn poll<T>(
        &mut self,
        mut operation: impl FnMut(&mut SPI) -> nb::Result<T, E>,
    ) -> Result<T, TransportError<E>> {
        for _ in 0..self.poll_budget {
            match operation(&mut self.spi) {
                Ok(value) => return Ok(value),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(err)) => return Err(TransportError::Spi(err)),
            }
        }
        Err(TransportError::Timeout)
    }
}
