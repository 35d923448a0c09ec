use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

use crate::memory::{Byte, Word};

/// Top two bits: number of operand bytes following the opcode
const OPERAND_COUNT_SHIFT: u8 = 6;
/// Bit 5: handled by the ALU
const ALU_BIT: Byte = 0b0010_0000;
/// Bit 4: assigns the program counter itself
const SETS_PC_BIT: Byte = 0b0001_0000;

/// Dispatch class of an opcode, derived from its structural bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Branches, calls and returns
    Control,
    Alu,
    /// Everything else
    Simple,
}

/// Number of operand bytes encoded in `opcode`
pub fn operand_count(opcode: Byte) -> u8 {
    opcode >> OPERAND_COUNT_SHIFT
}

/// The control-flow bit wins over the ALU bit if both are set.
pub fn classify(opcode: Byte) -> Class {
    if opcode & SETS_PC_BIT != 0 {
        Class::Control
    } else if opcode & ALU_BIT != 0 {
        Class::Alu
    } else {
        Class::Simple
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// The instruction set. Each opcode carries its operand count and
        /// dispatch class in its upper four bits.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    }
}

instructions! {
    /// Stop the machine
    HLT = 0b0000_0001,
    /// Load an immediate value into a register
    /// @param reg The target register
    /// @param value The value to load
    LDI = 0b1000_0010,
    /// Print the decimal value of a register
    /// @param reg The register to print
    PRN = 0b0100_0111,
    /// Push a register onto the stack
    /// @param reg The register to push
    PUSH = 0b0100_0101,
    /// Pop the top of the stack into a register
    /// @param reg The target register
    POP = 0b0100_0110,
    /// Push the return address and jump to the address held in a register
    /// @param reg The register holding the subroutine address
    CALL = 0b0101_0000,
    /// Pop the return address and jump there
    RET = 0b0001_0001,
    /// Jump to the address held in a register
    /// @param reg The register holding the target
    JMP = 0b0101_0100,
    /// Jump if the equal flag is set
    /// @param reg The register holding the target
    JEQ = 0b0101_0101,
    /// Jump if the equal flag is clear
    /// @param reg The register holding the target
    JNE = 0b0101_0110,
    /// reg_a += reg_b
    ADD = 0b1010_0000,
    /// reg_a -= reg_b
    SUB = 0b1010_0001,
    /// reg_a *= reg_b
    MUL = 0b1010_0010,
    /// reg_a %= reg_b, faults if reg_b is zero
    MOD = 0b1010_0100,
    /// Compare two registers and set the flags
    CMP = 0b1010_0111,
    /// reg_a &= reg_b
    AND = 0b1010_1000,
    /// reg_a |= reg_b
    OR = 0b1010_1010,
    /// reg_a ^= reg_b
    XOR = 0b1010_1011,
    /// reg_a = !reg_a
    NOT = 0b0110_1001,
    /// reg_a <<= reg_b
    SHL = 0b1010_1100,
    /// reg_a >>= reg_b
    SHR = 0b1010_1101,
}

impl Instruction {
    pub fn operand_count(self) -> u8 {
        operand_count(self.into())
    }

    pub fn class(self) -> Class {
        classify(self.into())
    }

    /// Bytes occupied by the instruction including its operands
    pub fn width(self) -> Word {
        1 + self.operand_count() as Word
    }
}

/// An instruction together with the operand bytes it needs. Operands it does
/// not take are never read and stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub instruction: Instruction,
    pub operands: [Byte; 2],
}

impl Decoded {
    pub fn a(&self) -> Byte {
        self.operands[0]
    }

    pub fn b(&self) -> Byte {
        self.operands[1]
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;

    #[test]
    fn test_operand_counts() {
        assert_eq!(Instruction::HLT.operand_count(), 0);
        assert_eq!(Instruction::RET.operand_count(), 0);
        assert_eq!(Instruction::PRN.operand_count(), 1);
        assert_eq!(Instruction::NOT.operand_count(), 1);
        assert_eq!(Instruction::CALL.operand_count(), 1);
        assert_eq!(Instruction::LDI.operand_count(), 2);
        assert_eq!(Instruction::MOD.operand_count(), 2);
        assert_eq!(Instruction::LDI.width(), 3);
    }

    #[test]
    fn test_classes() {
        use Instruction::*;

        for instruction in &[CALL, RET, JMP, JEQ, JNE] {
            assert_eq!(instruction.class(), Class::Control, "{}", instruction);
        }
        for instruction in &[ADD, SUB, MUL, MOD, CMP, AND, OR, XOR, NOT, SHL, SHR] {
            assert_eq!(instruction.class(), Class::Alu, "{}", instruction);
        }
        for instruction in &[HLT, LDI, PRN, PUSH, POP] {
            assert_eq!(instruction.class(), Class::Simple, "{}", instruction);
        }
    }

    #[test]
    fn test_control_bit_wins() {
        assert_eq!(classify(0b0011_0000), Class::Control);
    }

    #[test]
    fn test_no_opcode_has_both_bits() {
        for instruction in Instruction::ALL {
            let byte: Byte = (*instruction).into();
            assert!(byte & ALU_BIT == 0 || byte & SETS_PC_BIT == 0);
        }
    }

    #[test]
    fn test_unknown_opcodes() {
        assert!(Instruction::try_from(0b0000_0000u8).is_err());
        assert!(Instruction::try_from(0b1111_1111u8).is_err());
        assert!(Instruction::try_from(0b1010_0011u8).is_err());
        assert_eq!(Instruction::try_from(0b1000_0010u8).ok(), Some(Instruction::LDI));
    }

    #[test]
    fn test_names() {
        assert_eq!(Instruction::ALL.len(), 21);
        assert_eq!(Instruction::SHR.name(), "SHR");
        assert_eq!(Instruction::JEQ.to_string(), "JEQ");
    }
}
