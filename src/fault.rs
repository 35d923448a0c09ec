use std::error;
use std::fmt;
use std::io;

use crate::memory::{Byte, Word};

/// Broad class of a [`Fault`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The opcode byte matches no known instruction
    Decode,
    /// Unsupported ALU operation or division by zero
    Arithmetic,
    /// Memory address or register index out of range
    Addressing,
    /// The instruction budget ran out before the program halted
    Budget,
    /// Writing to the output channel failed
    Output,
}

/// A terminal condition which stops the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    InvalidOpcode { opcode: Byte, address: Word },
    /// Opcode with the ALU bit set that the ALU does not implement
    UnsupportedAluOperation(Byte),
    DivisionByZero,
    InvalidAddress { address: usize },
    InvalidRegister { index: Byte },
    BudgetExceeded { steps: u64 },
    Output(io::ErrorKind),
}

impl Fault {
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::InvalidOpcode { .. } => FaultKind::Decode,
            Fault::UnsupportedAluOperation(_) | Fault::DivisionByZero => {
                FaultKind::Arithmetic
            }
            Fault::InvalidAddress { .. } | Fault::InvalidRegister { .. } => FaultKind::Addressing,
            Fault::BudgetExceeded { .. } => FaultKind::Budget,
            Fault::Output(_) => FaultKind::Output,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::InvalidOpcode { opcode, address } => {
                write!(f, "invalid opcode `0b{:08b}` at 0x{:02X}", opcode, address)
            }
            Fault::UnsupportedAluOperation(opcode) => {
                write!(f, "unsupported ALU operation `0b{:08b}`", opcode)
            }
            Fault::DivisionByZero => f.write_str("division by zero"),
            Fault::InvalidAddress { address } => {
                write!(f, "memory has no address `0x{:x}`", address)
            }
            Fault::InvalidRegister { index } => write!(f, "no register with index `{}`", index),
            Fault::BudgetExceeded { steps } => {
                write!(f, "execution budget of {} instructions exceeded", steps)
            }
            Fault::Output(kind) => write!(f, "failed to write output: {:?}", kind),
        }
    }
}

impl error::Error for Fault {}

impl From<io::Error> for Fault {
    fn from(err: io::Error) -> Self {
        Fault::Output(err.kind())
    }
}

pub type Result<T, E = Fault> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kinds() {
        assert_eq!(
            Fault::InvalidOpcode {
                opcode: 0xFF,
                address: 0
            }
            .kind(),
            FaultKind::Decode
        );
        assert_eq!(Fault::DivisionByZero.kind(), FaultKind::Arithmetic);
        assert_eq!(
            Fault::UnsupportedAluOperation(0b1010_0011).kind(),
            FaultKind::Arithmetic
        );
        assert_eq!(
            Fault::InvalidRegister { index: 8 }.kind(),
            FaultKind::Addressing
        );
        assert_eq!(
            Fault::BudgetExceeded { steps: 10 }.kind(),
            FaultKind::Budget
        );
    }

    #[test]
    fn test_display() {
        let fault = Fault::InvalidOpcode {
            opcode: 0b1111_1111,
            address: 0x10,
        };
        assert_eq!(fault.to_string(), "invalid opcode `0b11111111` at 0x10");
    }
}
