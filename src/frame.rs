//! CAN frame value type.

/// Highest standard (11-bit) identifier.
pub const MAX_STANDARD_ID: u16 = 0x7FF;
/// Payload capacity of a classic CAN frame.
pub const MAX_PAYLOAD: usize = 8;

/// A classic CAN 2.0 frame with a standard identifier.
///
/// Data frames carry up to eight payload bytes. Remote frames carry none;
/// their DLC advertises how many bytes are being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    id: u16,
    rtr: bool,
    dlc: u8,
    data: [u8; MAX_PAYLOAD],
}

impl Frame {
    /// Data frame. `None` when the identifier exceeds 11 bits or the
    /// payload exceeds eight bytes.
    pub fn new(id: u16, data: &[u8]) -> Option<Self> {
        if id > MAX_STANDARD_ID || data.len() > MAX_PAYLOAD {
            return None;
        }
        let mut payload = [0; MAX_PAYLOAD];
        payload[..data.len()].copy_from_slice(data);
        Some(Self {
            id,
            rtr: false,
            dlc: data.len() as u8,
            data: payload,
        })
    }

    /// Remote transmission request for `dlc` bytes.
    pub fn new_remote(id: u16, dlc: u8) -> Option<Self> {
        if id > MAX_STANDARD_ID || dlc as usize > MAX_PAYLOAD {
            return None;
        }
        Some(Self {
            id,
            rtr: true,
            dlc,
            data: [0; MAX_PAYLOAD],
        })
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn is_remote(&self) -> bool {
        self.rtr
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Payload bytes. Empty for remote frames.
    pub fn data(&self) -> &[u8] {
        if self.rtr {
            &[]
        } else {
            &self.data[..self.dlc as usize]
        }
    }
}
