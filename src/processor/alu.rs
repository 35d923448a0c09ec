use std::cmp::Ordering;
use std::convert::TryFrom;

use crate::fault::{Fault, Result};
use crate::memory::Byte;

use super::registers::Flags;
use super::Instruction;

/// Operations the ALU knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Cmp,
}

impl TryFrom<Instruction> for AluOp {
    type Error = Fault;

    fn try_from(instruction: Instruction) -> Result<Self> {
        Ok(match instruction {
            Instruction::ADD => AluOp::Add,
            Instruction::SUB => AluOp::Sub,
            Instruction::MUL => AluOp::Mul,
            Instruction::MOD => AluOp::Mod,
            Instruction::AND => AluOp::And,
            Instruction::OR => AluOp::Or,
            Instruction::XOR => AluOp::Xor,
            Instruction::NOT => AluOp::Not,
            Instruction::SHL => AluOp::Shl,
            Instruction::SHR => AluOp::Shr,
            Instruction::CMP => AluOp::Cmp,
            other => return Err(Fault::UnsupportedAluOperation(other.into())),
        })
    }
}

/// What an ALU operation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// New value for the first operand register
    Value(Byte),
    /// New flags register, registers stay untouched
    Flags(Flags),
}

/// Applies `op` to the register values `a` and `b`. Results wrap modulo 256.
pub fn compute(op: AluOp, a: Byte, b: Byte) -> Result<Output> {
    let value = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Mod => a.checked_rem(b).ok_or(Fault::DivisionByZero)?,
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Not => !a,
        // shifting by eight or more clears every bit
        AluOp::Shl => a.checked_shl(b as u32).unwrap_or(0),
        AluOp::Shr => a.checked_shr(b as u32).unwrap_or(0),
        AluOp::Cmp => {
            let flags = match a.cmp(&b) {
                Ordering::Less => Flags::LESS,
                Ordering::Greater => Flags::GREATER,
                Ordering::Equal => Flags::EQUAL,
            };
            return Ok(Output::Flags(Flags(flags)));
        }
    };

    Ok(Output::Value(value))
}
