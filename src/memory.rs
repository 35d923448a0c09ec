use crate::fault::{Fault, Result};

pub mod parse;

pub type Byte = u8; // 1 byte
pub type Word = u16; // 2 bytes, wide enough to hold `pc + operands` past the end

/// Number of addressable cells
pub const SIZE: usize = 0x100;

/// Emulates memory for use with the CPU. Program, data and stack share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory
    pub data: [Byte; SIZE],
}

impl Default for Memory {
    /// Initializes zero-filled memory
    fn default() -> Self {
        Memory { data: [0; SIZE] }
    }
}

impl Memory {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: Word) -> Result<Byte> {
        self.data
            .get(position as usize)
            .copied()
            .ok_or(Fault::InvalidAddress {
                address: position as usize,
            })
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Word, value: Byte) -> Result<()> {
        let cell = self
            .data
            .get_mut(position as usize)
            .ok_or(Fault::InvalidAddress {
                address: position as usize,
            })?;
        *cell = value;

        Ok(())
    }

    /// Writes an array of bytes to the memory
    pub fn write_array(&mut self, position: Word, data: &[Byte]) -> Result<()> {
        let start = position as usize;
        let end = start + data.len();
        if end > SIZE {
            return Err(Fault::InvalidAddress { address: end - 1 });
        }
        self.data[start..end].copy_from_slice(data);

        Ok(())
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ])
    };
}
