//! valgrind-style memory traces: `<op> <hex-address>,<size>` per line.

use std::fmt;

use nom::{
    character::complete::{char, hex_digit1, multispace0, one_of, space0, space1, u32},
    combinator::{all_consuming, map_res},
    IResult,
};
use num_enum::TryFromPrimitive;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Operation {
    Instruction = b'I',
    Load = b'L',
    Store = b'S',
    /// load followed by a store to the same address.
    Modify = b'M',
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8 as char)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub op: Operation,
    pub addr: u64,
    /// width in bytes; carried along but irrelevant to the cache model.
    pub size: u32,
}

impl Access {
    pub fn new(op: Operation, addr: u64, size: u32) -> Self {
        Self { op, addr, size }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x},{}", self.op, self.addr, self.size)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    #[error("malformed trace record at line {line}: {content:?}")]
    Malformed { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, TraceError>;

fn operation(input: &str) -> IResult<&str, Operation> {
    map_res(one_of("ILSM"), |c| Operation::try_from(c as u8))(input)
}

fn address(input: &str) -> IResult<&str, u64> {
    map_res(hex_digit1, |h| u64::from_str_radix(h, 16))(input)
}

fn record(input: &str) -> IResult<&str, Access> {
    let (input, _) = space0(input)?;
    let (input, op) = operation(input)?;
    let (input, _) = space1(input)?;
    let (input, addr) = address(input)?;
    let (input, _) = char(',')(input)?;
    let (input, size) = u32(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, Access { op, addr, size }))
}

/// parses one line of a trace. `line_no` is only used for error reporting.
/// blank lines yield `None`.
pub fn parse_record(line: &str, line_no: usize) -> Result<Option<Access>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    all_consuming(record)(line)
        .map(|(_, access)| Some(access))
        .map_err(|_| TraceError::Malformed {
            line: line_no,
            content: line.to_owned(),
        })
}

pub fn parse_trace(text: &str) -> Result<Vec<Access>> {
    let mut accesses = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(access) = parse_record(line, i + 1)? {
            accesses.push(access);
        }
    }
    Ok(accesses)
}
