use crate::registers::OpMode;
use crate::timing::TimingError;

/// Faults raised by the byte transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// The SPI peripheral reported a fault of its own.
    Spi(E),
    /// A transfer did not complete within the poll budget.
    Timeout,
}

/// Faults raised by controller-level operations.
///
/// `E` is the SPI peripheral's error type, `PE` the chip-select pin's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E, PE> {
    /// Byte transport failure, including transfer timeouts.
    Transport(TransportError<E>),
    /// The chip-select line could not be driven.
    ChipSelect(PE),
    /// The controller kept reporting a mode other than the requested one.
    ModeTransition {
        requested: OpMode,
        /// Last raw `CANSTAT` value observed.
        canstat: u8,
    },
    /// No register values reach the requested bus bit rate.
    Timing(TimingError),
}

impl<E, PE> From<TransportError<E>> for Error<E, PE> {
    fn from(err: TransportError<E>) -> Self {
        Error::Transport(err)
    }
}

impl<E, PE> From<TimingError> for Error<E, PE> {
    fn from(err: TimingError) -> Self {
        Error::Timing(err)
    }
}
