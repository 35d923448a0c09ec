use std::convert::TryFrom;
use std::io::Write;

use crate::fault::{Fault, Result};
use crate::memory::{Byte, Memory, Word};
use log::*;

pub mod alu;
pub mod instruction;
pub mod registers;

pub use self::instruction::{Class, Decoded, Instruction};
pub use self::registers::{Flags, Registers};

use self::alu::AluOp;

/// Where the processor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    /// Stopped by `HLT`
    Halted,
    /// Stopped by a fault; terminal
    Faulted(Fault),
}

/// Emulates a CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Processor {
    /// Program counter
    pub pc: Word,
    /// General purpose registers, R7 being the stack pointer
    pub registers: Registers,
    /// Result of the last `CMP`
    pub fl: Flags,
    pub state: State,
    /// Number of instructions executed so far
    pub steps: u64,
}

impl Default for Processor {
    /// Initializes a new CPU
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU. Programs are loaded at and start from address 0.
    pub fn new() -> Self {
        Self {
            pc: 0x00,
            registers: Registers::default(),
            fl: Flags::default(),
            state: State::Running,
            steps: 0,
        }
    }

    pub fn register_read(&self, index: Byte) -> Result<Byte> {
        self.registers.read(index)
    }

    pub fn register_write(&mut self, index: Byte, value: Byte) -> Result<()> {
        self.registers.write(index, value)
    }

    /// Decodes the instruction at the program counter, reading only as many
    /// operand bytes as its opcode announces. The opcode is classified by its
    /// structural bits first, so an unknown byte with the ALU bit set is an
    /// unsupported ALU operation rather than an invalid opcode.
    pub fn decode(&self, memory: &Memory) -> Result<Decoded> {
        let opcode = memory.read_byte(self.pc)?;
        let class = instruction::classify(opcode);
        let instruction = Instruction::try_from(opcode).map_err(|_| match class {
            Class::Alu => Fault::UnsupportedAluOperation(opcode),
            Class::Control | Class::Simple => Fault::InvalidOpcode {
                opcode,
                address: self.pc,
            },
        })?;

        let mut operands = [0; 2];
        let count = instruction.operand_count() as usize;
        for (offset, operand) in operands.iter_mut().take(count).enumerate() {
            *operand = memory.read_byte(self.pc + 1 + offset as Word)?;
        }

        Ok(Decoded {
            instruction,
            operands,
        })
    }

    /// Executes a single instruction. A fault moves the processor into the
    /// faulted state and leaves registers and memory as they were before the
    /// instruction.
    pub fn execute<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> Result<()> {
        match self.state {
            State::Running => {}
            State::Halted => return Ok(()),
            State::Faulted(fault) => return Err(fault),
        }

        trace!("{}", self.trace(memory));

        let result = self
            .decode(memory)
            .and_then(|decoded| self.dispatch(decoded, memory, out));
        self.steps += 1;

        if let Err(fault) = result {
            error!("Fault at 0x{:02X}: {}", self.pc, fault);
            self.state = State::Faulted(fault);
        }

        result
    }

    /// Control flow is checked before the ALU, everything else is simple.
    fn dispatch<W: Write>(
        &mut self,
        decoded: Decoded,
        memory: &mut Memory,
        out: &mut W,
    ) -> Result<()> {
        match decoded.instruction.class() {
            Class::Control => self.execute_control(decoded, memory),
            Class::Alu => self.execute_alu(decoded),
            Class::Simple => self.execute_simple(decoded, memory, out),
        }
    }

    fn execute_control(&mut self, decoded: Decoded, memory: &mut Memory) -> Result<()> {
        let instruction = decoded.instruction;
        match instruction {
            Instruction::CALL => {
                let target = self.registers.read(decoded.a())?;
                let return_address = self.pc + instruction.width();
                let value = Byte::try_from(return_address).map_err(|_| Fault::InvalidAddress {
                    address: return_address as usize,
                })?;
                self.push(memory, value)?;
                self.pc = target as Word;

                debug!("CALL 0x{:02X}, return to 0x{:02X}", target, value);
            }
            Instruction::RET => {
                let target = self.pop(memory)?;
                self.pc = target as Word;

                debug!("RET 0x{:02X}", target);
            }
            Instruction::JMP => {
                let target = self.registers.read(decoded.a())?;
                self.pc = target as Word;

                debug!("JMP 0x{:02X}", target);
            }
            Instruction::JEQ | Instruction::JNE => {
                let target = self.registers.read(decoded.a())?;
                let taken = self.fl.equal() == (instruction == Instruction::JEQ);
                if taken {
                    self.pc = target as Word;
                } else {
                    self.pc += instruction.width();
                }

                debug!("{} 0x{:02X} [{}]: {}", instruction, target, self.fl, taken);
            }
            _ => {
                return Err(Fault::InvalidOpcode {
                    opcode: instruction.into(),
                    address: self.pc,
                })
            }
        }

        Ok(())
    }

    fn execute_alu(&mut self, decoded: Decoded) -> Result<()> {
        let instruction = decoded.instruction;
        let op = AluOp::try_from(instruction)?;
        let (reg_a, reg_b) = (decoded.a(), decoded.b());
        let a = self.registers.read(reg_a)?;
        // NOT only takes one operand
        let b = match op {
            AluOp::Not => 0,
            _ => self.registers.read(reg_b)?,
        };

        match alu::compute(op, a, b)? {
            alu::Output::Value(result) => {
                self.registers.write(reg_a, result)?;
                debug!("{} R{} R{} ({} {}): {}", instruction, reg_a, reg_b, a, b, result);
            }
            alu::Output::Flags(flags) => {
                self.fl = flags;
                debug!("{} R{} R{} ({} {}): {}", instruction, reg_a, reg_b, a, b, flags);
            }
        }
        self.pc += instruction.width();

        Ok(())
    }

    fn execute_simple<W: Write>(
        &mut self,
        decoded: Decoded,
        memory: &mut Memory,
        out: &mut W,
    ) -> Result<()> {
        let instruction = decoded.instruction;
        match instruction {
            Instruction::HLT => {
                self.state = State::Halted;

                debug!("HLT");
                return Ok(());
            }
            Instruction::LDI => {
                self.registers.write(decoded.a(), decoded.b())?;

                debug!("LDI R{} {}", decoded.a(), decoded.b());
            }
            Instruction::PRN => {
                let value = self.registers.read(decoded.a())?;
                writeln!(out, "{}", value)?;

                debug!("PRN R{}: {}", decoded.a(), value);
            }
            Instruction::PUSH => {
                // PUSH R7 stores the already decremented pointer
                self.registers.read(decoded.a())?;
                let sp = self.registers.sp().wrapping_sub(1);
                self.registers.set_sp(sp);
                let value = self.registers.read(decoded.a())?;
                memory.write_byte(sp as Word, value)?;

                debug!("PUSH R{}: {} -> 0x{:02X}", decoded.a(), value, sp);
            }
            Instruction::POP => {
                let sp = self.registers.sp();
                let value = memory.read_byte(sp as Word)?;
                self.registers.write(decoded.a(), value)?;
                self.registers.set_sp(self.registers.sp().wrapping_add(1));

                debug!("POP R{}: {} <- 0x{:02X}", decoded.a(), value, sp);
            }
            _ => {
                return Err(Fault::InvalidOpcode {
                    opcode: instruction.into(),
                    address: self.pc,
                })
            }
        }
        self.pc += instruction.width();

        Ok(())
    }

    /// Moves the stack pointer down, wrapping from 0 to 255, and stores `value`
    fn push(&mut self, memory: &mut Memory, value: Byte) -> Result<()> {
        let sp = self.registers.sp().wrapping_sub(1);
        memory.write_byte(sp as Word, value)?;
        self.registers.set_sp(sp);

        Ok(())
    }

    /// Loads the top of the stack and moves the stack pointer up, wrapping
    /// from 255 to 0
    fn pop(&mut self, memory: &Memory) -> Result<Byte> {
        let sp = self.registers.sp();
        let value = memory.read_byte(sp as Word)?;
        self.registers.set_sp(sp.wrapping_add(1));

        Ok(value)
    }

    /// Run program until it halts or faults
    pub fn execute_until_hlt<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> Result<()> {
        while self.state == State::Running {
            self.execute(memory, out)?;
        }

        self.finish()
    }

    /// Like [`Processor::execute_until_hlt`], but gives up with
    /// [`Fault::BudgetExceeded`] after `max_steps` instructions
    pub fn execute_with_budget<W: Write>(
        &mut self,
        memory: &mut Memory,
        out: &mut W,
        max_steps: u64,
    ) -> Result<()> {
        let start = self.steps;
        while self.state == State::Running {
            if self.steps - start >= max_steps {
                let fault = Fault::BudgetExceeded { steps: max_steps };
                error!("{}", fault);
                self.state = State::Faulted(fault);
                return Err(fault);
            }
            self.execute(memory, out)?;
        }

        self.finish()
    }

    /// Reports how a run loop ended. A processor that faulted earlier keeps
    /// reporting its fault.
    fn finish(&self) -> Result<()> {
        match self.state {
            State::Halted => {
                info!("Program halted after {} instructions", self.steps);
                Ok(())
            }
            State::Faulted(fault) => Err(fault),
            State::Running => unreachable!("run loops only exit once the processor stops"),
        }
    }

    /// Renders `TRACE: PC | IR OP1 OP2 | R0 .. R7` for debugging
    pub fn trace(&self, memory: &Memory) -> String {
        let byte_at = |offset: Word| match memory.read_byte(self.pc + offset) {
            Ok(byte) => format!("{:02X}", byte),
            Err(_) => String::from("--"),
        };

        let mut line = format!(
            "TRACE: {:02X} | {} {} {} |",
            self.pc,
            byte_at(0),
            byte_at(1),
            byte_at(2)
        );
        for register in self.registers.data.iter() {
            line.push_str(&format!(" {:02X}", register));
        }

        line
    }
}
