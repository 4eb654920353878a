//! The numbered command protocol driving a [`Treap`] of `i64` keys
//!
//! Input is an operation count `n` followed by `n` pairs `<opcode> <value>`, separated
//! by any whitespace:
//!
//! | opcode | effect                                  | output                    |
//! |--------|-----------------------------------------|---------------------------|
//! | `1 x`  | insert `x`                              | none                      |
//! | `2 x`  | remove one `x`                          | none                      |
//! | `3 x`  | count elements smaller than `x`         | `rank_by_value(x) - 1`    |
//! | `4 x`  | the `x`-th smallest element (1-based)   | `value_by_rank(x + 1)`    |
//! | `5 x`  | predecessor of `x`                      | `find_prev(x)`            |
//! | `6 x`  | successor of `x`                        | `find_next(x)`            |
//!
//! Tokens after the `n`-th operation are ignored.

use crate::treap::Treap;
use log::{debug, trace};
use rand::Rng;
use std::io::{BufRead, Read, Write};
use thiserror::Error;

/// Errors raised while reading or executing a command stream
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input is empty, expected an operation count")]
    MissingCount,
    #[error("`{token}` is not a valid integer")]
    InvalidInteger { token: String },
    #[error("operation {position}: unknown opcode {opcode}")]
    UnknownOpcode { opcode: i64, position: usize },
    #[error("operation {position}: opcode has no operand")]
    MissingOperand { position: usize },
    #[error("expected {expected} operations, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// A single decoded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Insert(i64),
    Remove(i64),
    /// Number of stored elements strictly smaller than the value
    Rank(i64),
    /// Element at the given 1-based position
    Select(i64),
    Prev(i64),
    Next(i64),
}

impl Command {
    /// Decode an `<opcode> <value>` pair, `None` for an unknown opcode
    pub fn from_pair(opcode: i64, value: i64) -> Option<Self> {
        let command = match opcode {
            1 => Command::Insert(value),
            2 => Command::Remove(value),
            3 => Command::Rank(value),
            4 => Command::Select(value),
            5 => Command::Prev(value),
            6 => Command::Next(value),
            _ => return None,
        };
        Some(command)
    }

    /// Run against `treap`, returning the value to print for queries
    pub fn apply<R: Rng>(self, treap: &mut Treap<i64, R>) -> Option<i64> {
        trace!("{self:?}");
        match self {
            Command::Insert(x) => {
                treap.insert(x);
                None
            }
            Command::Remove(x) => {
                treap.remove(&x);
                None
            }
            Command::Rank(x) => Some(treap.rank_by_value(&x) as i64 - 1),
            Command::Select(x) => {
                // Negative or overflowing positions fall off the tree like rank 0
                let rank = usize::try_from(x)
                    .ok()
                    .and_then(|x| x.checked_add(1))
                    .unwrap_or(0);
                Some(treap.value_by_rank(rank))
            }
            Command::Prev(x) => Some(treap.find_prev(&x)),
            Command::Next(x) => Some(treap.find_next(&x)),
        }
    }
}

fn parse_integer<T: std::str::FromStr>(token: &str) -> Result<T, CommandError> {
    token.parse().map_err(|_| CommandError::InvalidInteger {
        token: token.to_string(),
    })
}

/// Decode a whole command stream
pub fn parse_commands(input: &str) -> Result<Vec<Command>, CommandError> {
    let mut tokens = input.split_whitespace();
    let expected: usize = parse_integer(tokens.next().ok_or(CommandError::MissingCount)?)?;

    // `expected` is untrusted, so let the vector grow with what is actually read
    let mut commands = Vec::new();
    for position in 1..=expected {
        let Some(opcode) = tokens.next() else {
            return Err(CommandError::Truncated {
                expected,
                found: commands.len(),
            });
        };
        let opcode = parse_integer(opcode)?;
        let value = tokens
            .next()
            .ok_or(CommandError::MissingOperand { position })?;
        let value = parse_integer(value)?;
        let command = Command::from_pair(opcode, value)
            .ok_or(CommandError::UnknownOpcode { opcode, position })?;
        commands.push(command);
    }
    if tokens.next().is_some() {
        debug!("ignoring input after {expected} operations");
    }
    Ok(commands)
}

/// Read a command stream from `input`, apply it to `treap` and write one line per query
///
/// Returns the number of operations executed. The whole stream is validated before
/// the first operation runs, so malformed input leaves `treap` untouched.
pub fn run<I, W, R>(
    mut input: I,
    output: &mut W,
    treap: &mut Treap<i64, R>,
) -> Result<usize, CommandError>
where
    I: BufRead,
    W: Write,
    R: Rng,
{
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let commands = parse_commands(&text)?;
    debug!("executing {} operations", commands.len());

    for command in &commands {
        if let Some(answer) = command.apply(treap) {
            writeln!(output, "{answer}")?;
        }
    }
    output.flush()?;
    Ok(commands.len())
}
