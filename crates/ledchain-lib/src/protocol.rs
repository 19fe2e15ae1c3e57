//! P9813 wire protocol: frame layout, checksum byte and the bit-banged bus.
//!
//! A transmission is a 32-bit zero start frame, one 4-byte record per node
//! (checksum, blue, green, red), then a 32-bit zero end frame. The end frame
//! doubles as the start frame of the next transmission.
//!
//! Bits go out MSB first: the data line is set, then the clock is pulsed
//! low→high. Node 0 is the one physically nearest to the host.

use embedded_hal::digital::OutputPin;

use crate::gpio::GpioError;

/// Zero bits in a start or end frame.
pub const FRAME_BITS: usize = 32;

/// Bytes in a start or end frame.
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// Bytes per node record (checksum, blue, green, red).
pub const NODE_BYTES: usize = 4;

/// Fixed top two bits of every checksum byte.
pub const CHECKSUM_FLAG: u8 = 0xC0;

/// Checksum byte `1 1 ~B7 ~B6 ~G7 ~G6 ~R7 ~R6`.
///
/// The inverted form follows the P9813 datasheet; it has not been verified on
/// every module revision.
pub fn checksum(r: u8, g: u8, b: u8) -> u8 {
    let top = |c: u8| !(c >> 6) & 0b11;
    CHECKSUM_FLAG | (top(b) << 4) | (top(g) << 2) | top(r)
}

/// Node record as sent on the wire.
pub fn encode_node(r: u8, g: u8, b: u8) -> [u8; NODE_BYTES] {
    [checksum(r, g, b), b, g, r]
}

/// Full transmission for a chain of RGB colors, frames included.
pub fn encode_chain<I>(colors: I) -> Vec<u8>
where
    I: IntoIterator<Item = (u8, u8, u8)>,
{
    let colors = colors.into_iter();
    let mut out = Vec::with_capacity(2 * FRAME_BYTES + NODE_BYTES * colors.size_hint().0);
    out.extend_from_slice(&[0; FRAME_BYTES]);
    for (r, g, b) in colors {
        out.extend_from_slice(&encode_node(r, g, b));
    }
    out.extend_from_slice(&[0; FRAME_BYTES]);
    out
}

/// Clock + data line pair, bit-banged.
///
/// Exclusively owns both lines; nothing else may toggle them.
#[derive(Debug)]
pub struct ClockDataBus<C, D> {
    clock: C,
    data: D,
}

/// Pin errors convert into [`GpioError`]; the crate's own pins report it directly.
impl<C, D> ClockDataBus<C, D>
where
    C: OutputPin,
    D: OutputPin,
    GpioError: From<C::Error> + From<D::Error>,
{
    pub fn new(clock: C, data: D) -> Self {
        ClockDataBus { clock, data }
    }

    fn set_data(&mut self, high: bool) -> Result<(), GpioError> {
        if high {
            self.data.set_high()?;
        } else {
            self.data.set_low()?;
        }
        Ok(())
    }

    fn pulse(&mut self) -> Result<(), GpioError> {
        self.clock.set_low()?;
        self.clock.set_high()?;
        Ok(())
    }

    /// 32 zero bits.
    pub fn write_frame(&mut self) -> Result<(), GpioError> {
        self.set_data(false)?;
        for _ in 0..FRAME_BITS {
            self.pulse()?;
        }
        Ok(())
    }

    /// One byte, MSB first.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), GpioError> {
        if byte == 0 {
            // Uniform pattern: set data once, then pulse.
            self.set_data(false)?;
            for _ in 0..8 {
                self.pulse()?;
            }
            return Ok(());
        }
        for bit in (0..8).rev() {
            self.set_data(byte & (1 << bit) != 0)?;
            self.pulse()?;
        }
        Ok(())
    }

    pub fn write_node(&mut self, r: u8, g: u8, b: u8) -> Result<(), GpioError> {
        for byte in encode_node(r, g, b) {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Start frame, every node in order, end frame.
    pub fn write_chain<I>(&mut self, colors: I) -> Result<(), GpioError>
    where
        I: IntoIterator<Item = (u8, u8, u8)>,
    {
        self.write_frame()?;
        for (r, g, b) in colors {
            self.write_node(r, g, b)?;
        }
        self.write_frame()
    }
}
