//! Bit-timing derivation for the CAN bus.
//!
//! The controller builds each bit out of time quanta produced by a
//! prescaler from its oscillator, TQ = 2 * (BRP + 1) / Fosc. A bit is
//! SyncSeg (fixed at 1 TQ), PropSeg, PhaseSeg1 and PhaseSeg2, sampled
//! between PhaseSeg1 and PhaseSeg2. CNF1..CNF3 encode the prescaler and
//! the segment lengths; the trio forms a single configuration and is
//! always programmed together.

use crate::registers::{cnf1, cnf2};

/// Resynchronisation jump width, in TQ.
const SJW_TQ: u8 = 1;

const MAX_BRP: u32 = 63;
const MAX_SEG_TQ: u32 = 8;
const MIN_PHASE2_TQ: u32 = 2;
/// Quanta per bit the controller accepts, from 1+1+1+2 up to 1+8+8+8.
const MIN_BIT_TQ: u32 = 5;
const MAX_BIT_TQ: u32 = 25;

/// Values for the three bit-timing registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    pub cnf1: u8,
    pub cnf2: u8,
    pub cnf3: u8,
}

/// No prescaler and segment combination reaches `bit_rate` from `clock_hz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingError {
    pub clock_hz: u32,
    pub bit_rate: u32,
}

impl BitTiming {
    /// Derive register values for `bit_rate` on a controller clocked at
    /// `clock_hz`.
    ///
    /// The search walks prescalers smallest-first, so the bit is built from
    /// as many quanta as the rate allows, and aims the sample point at 75 %
    /// of the bit. Sampling is single, the jump width stays at 1 TQ and
    /// PhaseSeg2 is register-programmed. Only exact rates are produced;
    /// there is no nearest-match fallback.
    pub fn from_bit_rate(clock_hz: u32, bit_rate: u32) -> Result<Self, TimingError> {
        let unreachable = TimingError { clock_hz, bit_rate };
        if clock_hz == 0 || bit_rate == 0 {
            return Err(unreachable);
        }

        for brp in 0..=MAX_BRP {
            // One bit costs 2 * (BRP + 1) * total_tq oscillator cycles, so
            // an exact rate needs the clock divisible by 2 * (BRP + 1) *
            // bit_rate; the quotient is the quanta per bit.
            let divisor = 2 * (brp as u64 + 1) * bit_rate as u64;
            if clock_hz as u64 % divisor != 0 {
                continue;
            }
            let total_tq = (clock_hz as u64 / divisor) as u32;
            if !(MIN_BIT_TQ..=MAX_BIT_TQ).contains(&total_tq) {
                continue;
            }
            if let Some((prop, ps1, ps2)) = split_bit(total_tq) {
                return Ok(Self::compose(brp as u8, prop, ps1, ps2));
            }
        }

        Err(unreachable)
    }

    fn compose(brp: u8, prop: u32, ps1: u32, ps2: u32) -> Self {
        BitTiming {
            cnf1: ((SJW_TQ - 1) << cnf1::SJW_OFFSET) | brp,
            cnf2: cnf2::BTLMODE | (((ps1 - 1) as u8) << cnf2::PHSEG1_OFFSET) | (prop - 1) as u8,
            cnf3: (ps2 - 1) as u8,
        }
    }
}

/// Split a bit of `total_tq` quanta into PropSeg, PhaseSeg1 and PhaseSeg2.
fn split_bit(total_tq: u32) -> Option<(u32, u32, u32)> {
    // PhaseSeg2 covers everything past the 75 % sample point.
    let sample_tq = total_tq * 3 / 4;
    let mut ps2 = (total_tq - sample_tq).clamp(MIN_PHASE2_TQ, MAX_SEG_TQ);
    let mut rest = total_tq - 1 - ps2;

    // PropSeg and PhaseSeg1 cap at 8 TQ each; any overflow moves the
    // sample point earlier by lengthening PhaseSeg2.
    if rest > 2 * MAX_SEG_TQ {
        ps2 += rest - 2 * MAX_SEG_TQ;
        rest = 2 * MAX_SEG_TQ;
        if ps2 > MAX_SEG_TQ {
            return None;
        }
    }

    let ps1 = ((rest + 1) / 2).min(MAX_SEG_TQ);
    let prop = rest - ps1;
    if !(1..=MAX_SEG_TQ).contains(&prop) || !(1..=MAX_SEG_TQ).contains(&ps1) {
        return None;
    }

    Some((prop, ps1, ps2))
}
