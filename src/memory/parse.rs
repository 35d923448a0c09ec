//! Program image loader. One byte per line, written in binary; anything after
//! a `#` is a comment:
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::{FromStr, Lines};

use super::{Byte, Memory, SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumber { radix: u32 },
    ProgramTooLarge,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidNumber { radix } => {
                write!(f, "failed to parse number with radix `{}`", radix)
            }
            ParseErrorKind::ProgramTooLarge => {
                write!(f, "program does not fit into {} bytes of memory", SIZE)
            }
        }
    }
}

/// A rejected line of a program image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    line_nr: usize,
    detail: Option<String>,
}

impl ParseError {
    fn new(kind: ParseErrorKind, line_nr: usize) -> Self {
        Self {
            kind,
            line_nr,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_nr, self.kind)?;
        match &self.detail {
            Some(detail) => write!(f, " ({})", detail),
            None => Ok(()),
        }
    }
}

impl error::Error for ParseError {}

/// Why a program image could not be loaded. The processor never starts in
/// any of these cases.
#[derive(Debug)]
pub enum LoadError {
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Parse(Vec<ParseError>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "did not find file `{}`", path.display()),
            LoadError::Io { path, source } => {
                write!(f, "failed to read `{}`: {}", path.display(), source)
            }
            LoadError::Parse(errors) => {
                write!(f, "{} error(s) in program", errors.len())?;
                for err in errors {
                    write!(f, "\n  {}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for LoadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    position: usize,
    memory: Memory,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data` which will populate `memory` from
    /// address 0 upwards.
    pub fn new(data: &'a str, memory: Memory) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            position: 0,
            memory,
        }
    }

    /// Consumes `self` and tries to parse all lines into memory.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Memory, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            log::debug!("Loaded {} bytes", self.position);
            Ok(self.memory)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Blank and comment-only lines are skipped.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        let literal = match line.find('#') {
            Some(start) => &line[..start],
            None => line,
        }
        .trim();

        if literal.is_empty() {
            return Some(Ok(()));
        }

        Some(self.parse_literal(literal))
    }

    /// Parses `literal` as a binary byte and writes it to the next free cell.
    fn parse_literal(&mut self, literal: &str) -> Result<()> {
        if !literal.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(
                ParseError::new(ParseErrorKind::InvalidNumber { radix: 2 }, self.line_nr)
                    .with_detail(format!("`{}` is not a binary literal", literal)),
            );
        }

        let byte = Byte::from_str_radix(literal, 2).map_err(|_| {
            ParseError::new(ParseErrorKind::InvalidNumber { radix: 2 }, self.line_nr)
                .with_detail(format!("`{}` does not fit into a byte", literal))
        })?;

        self.write_byte(byte)
    }

    /// Writes `byte` at the current position and moves on by one.
    fn write_byte(&mut self, byte: Byte) -> Result<()> {
        match self.memory.data.get_mut(self.position) {
            Some(cell) => {
                *cell = byte;
                self.position += 1;
                Ok(())
            }
            None => Err(ParseError::new(ParseErrorKind::ProgramTooLarge, self.line_nr)),
        }
    }
}

impl FromStr for Memory {
    type Err = LoadError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Parser::new(data, Memory::default())
            .parse()
            .map_err(LoadError::Parse)
    }
}

impl Memory {
    /// Loads a program image from `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        data.parse()
    }
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::Result;

    #[test]
    fn test_parse_print8() -> Result<()> {
        let data = r#"
# print8.ls8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
        "#;

        let mem: Memory = data.parse()?;

        assert_eq!(mem.read_byte(0)?, Instruction::LDI.into());
        assert_eq!(mem.read_byte(1)?, 0);
        assert_eq!(mem.read_byte(2)?, 8);
        assert_eq!(mem.read_byte(3)?, Instruction::PRN.into());
        assert_eq!(mem.read_byte(4)?, 0);
        assert_eq!(mem.read_byte(5)?, Instruction::HLT.into());
        assert_eq!(mem.read_byte(6)?, 0);

        Ok(())
    }

    #[test]
    fn test_comment_without_space() -> Result<()> {
        let mem: Memory = "00000001#HLT\n#only a comment\n\n   \n11111111".parse()?;

        assert_eq!(mem.read_byte(0)?, 1);
        assert_eq!(mem.read_byte(1)?, 0xFF);

        Ok(())
    }

    #[test]
    fn test_collects_all_errors() -> Result<()> {
        let data = "00000001\n2\n00000001\n111111111 # nine bits\n0b101";

        match data.parse::<Memory>() {
            Err(LoadError::Parse(errors)) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors[0].line_nr(), 2);
                assert_eq!(errors[1].line_nr(), 4);
                assert_eq!(errors[2].line_nr(), 5);
                assert!(errors
                    .iter()
                    .all(|err| err.kind() == ParseErrorKind::InvalidNumber { radix: 2 }));
            }
            other => panic!("expected parse errors, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_program_too_large() -> Result<()> {
        let data = "00000000\n".repeat(SIZE + 1);

        match data.parse::<Memory>() {
            Err(LoadError::Parse(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind(), ParseErrorKind::ProgramTooLarge);
                assert_eq!(errors[0].line_nr(), SIZE + 1);
                assert_eq!(
                    errors[0].to_string(),
                    "line 257: program does not fit into 256 bytes of memory"
                );
            }
            other => panic!("expected parse errors, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_error_detail() -> Result<()> {
        match "0000000x".parse::<Memory>() {
            Err(LoadError::Parse(errors)) => assert_eq!(
                errors[0].to_string(),
                "line 1: failed to parse number with radix `2` (`0000000x` is not a binary literal)"
            ),
            other => panic!("expected parse errors, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_missing_file() -> Result<()> {
        match Memory::from_file("programs/does_not_exist.ls8") {
            Err(LoadError::NotFound(path)) => {
                assert_eq!(path, PathBuf::from("programs/does_not_exist.ls8"));
            }
            other => panic!("expected missing file, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let mem = Memory::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/programs/print8.ls8"))?;

        assert_eq!(mem.read_byte(0)?, Instruction::LDI.into());
        assert_eq!(mem.read_byte(2)?, 8);

        Ok(())
    }
}
