use std::fmt;

use crate::fault::{Fault, Result};
use crate::memory::Byte;

/// Number of general purpose registers
pub const COUNT: usize = 8;
/// Register 7 holds the stack pointer by convention
pub const SP: Byte = 7;
/// Top of the stack region; the stack grows downward from here
pub const SP_INIT: Byte = 0xF4;

/// The register file. Nothing protects the stack pointer from being
/// overwritten like any other register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registers {
    pub data: [Byte; COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        let mut data = [0; COUNT];
        data[SP as usize] = SP_INIT;
        Self { data }
    }
}

impl Registers {
    pub fn read(&self, index: Byte) -> Result<Byte> {
        self.data
            .get(index as usize)
            .copied()
            .ok_or(Fault::InvalidRegister { index })
    }

    pub fn write(&mut self, index: Byte, value: Byte) -> Result<()> {
        let register = self
            .data
            .get_mut(index as usize)
            .ok_or(Fault::InvalidRegister { index })?;
        *register = value;

        Ok(())
    }

    pub fn sp(&self) -> Byte {
        self.data[SP as usize]
    }

    pub fn set_sp(&mut self, value: Byte) {
        self.data[SP as usize] = value;
    }
}

/// Outcome of the last comparison. At most one bit is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(pub Byte);

impl Flags {
    pub const LESS: Byte = 0b0000_0100;
    pub const GREATER: Byte = 0b0000_0010;
    pub const EQUAL: Byte = 0b0000_0001;

    pub fn less(self) -> bool {
        self.0 & Self::LESS != 0
    }

    pub fn greater(self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub fn equal(self) -> bool {
        self.0 & Self::EQUAL != 0
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            bit(self.less(), 'L'),
            bit(self.greater(), 'G'),
            bit(self.equal(), 'E')
        )
    }
}
