pub mod canctrl {
    pub const ADDR: u8 = 0x0F;
    pub const REQOP_MASK: u8 = 0xE0;
    pub const REQOP_OFFSET: u8 = 5;
    pub const CLKEN: u8 = 1 << 2;
    pub const CLKPRE_MASK: u8 = 0x03;
}

pub mod canstat {
    pub const ADDR: u8 = 0x0E;
    pub const OPMOD_MASK: u8 = 0xE0;
    pub const OPMOD_OFFSET: u8 = 5;
}

pub mod cnf1 {
    pub const ADDR: u8 = 0x2A;
    pub const SJW_OFFSET: u8 = 6;
    pub const BRP_MASK: u8 = 0x3F;
}

pub mod cnf2 {
    pub const ADDR: u8 = 0x29;
    pub const BTLMODE: u8 = 1 << 7;
    pub const SAM: u8 = 1 << 6;
    pub const PHSEG1_OFFSET: u8 = 3;
    pub const PHSEG1_MASK: u8 = 0x07 << 3;
    pub const PRSEG_MASK: u8 = 0x07;
}

pub mod cnf3 {
    pub const ADDR: u8 = 0x28;
    pub const SOF: u8 = 1 << 7;
    pub const WAKFIL: u8 = 1 << 6;
    pub const PHSEG2_MASK: u8 = 0x07;
}

pub mod caninte {
    pub const ADDR: u8 = 0x2B;
    pub const MERRE: u8 = 1 << 7;
    pub const WAKIE: u8 = 1 << 6;
    pub const ERRIE: u8 = 1 << 5;
    pub const TX2IE: u8 = 1 << 4;
    pub const TX1IE: u8 = 1 << 3;
    pub const TX0IE: u8 = 1 << 2;
    pub const RX1IE: u8 = 1 << 1;
    pub const RX0IE: u8 = 1 << 0;
}

pub mod rxf0sidl {
    pub const ADDR: u8 = 0x01;
    pub const EXIDE: u8 = 1 << 3;
}

pub mod rxm0sidh {
    pub const ADDR: u8 = 0x20;
}

pub mod rxm1sidh {
    pub const ADDR: u8 = 0x24;
}

/// Operating modes, as requested through `CANCTRL.REQOP` and reported back
/// by `CANSTAT.OPMOD`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpMode {
    Normal = 0b000,
    Sleep = 0b001,
    Loopback = 0b010,
    ListenOnly = 0b011,
    Configuration = 0b100,
}

impl OpMode {
    /// Value written to `CANCTRL` to request this mode.
    pub const fn reqop_bits(self) -> u8 {
        (self as u8) << canctrl::REQOP_OFFSET
    }

    /// Mode encoded in a raw `CANSTAT` value, `None` for the reserved
    /// encodings.
    pub fn from_opmod(status: u8) -> Option<Self> {
        match (status & canstat::OPMOD_MASK) >> canstat::OPMOD_OFFSET {
            0b000 => Some(OpMode::Normal),
            0b001 => Some(OpMode::Sleep),
            0b010 => Some(OpMode::Loopback),
            0b011 => Some(OpMode::ListenOnly),
            0b100 => Some(OpMode::Configuration),
            _ => None,
        }
    }
}
