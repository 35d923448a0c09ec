//! An 8-bit virtual CPU with 256 bytes of memory, eight byte-wide registers
//! and a downward growing stack living in register 7.

pub mod fault;
pub mod memory;
pub mod processor;
