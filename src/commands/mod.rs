pub mod append;
pub mod decr;
pub mod decrby;
pub mod executable;
pub mod get;
pub mod getdel;
pub mod getrange;
pub mod getset;
pub mod incr;
pub mod incrby;
pub mod set;
pub mod setrange;
pub mod strlen;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::channel::TokenReceiver;
use crate::commands::executable::Executable;
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

use append::Append;
use decr::Decr;
use decrby::DecrBy;
use get::Get;
use getdel::GetDel;
use getrange::GetRange;
use getset::GetSet;
use incr::Incr;
use incrby::IncrBy;
use set::Set;
use setrange::SetRange;
use strlen::StrLen;

#[derive(Debug, PartialEq)]
pub enum Command {
    Append(Append),
    Decr(Decr),
    DecrBy(DecrBy),
    Get(Get),
    GetDel(GetDel),
    GetRange(GetRange),
    GetSet(GetSet),
    Incr(Incr),
    IncrBy(IncrBy),
    Set(Set),
    SetRange(SetRange),
    StrLen(StrLen),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Response, Error> {
        match self {
            Command::Append(cmd) => cmd.exec(store),
            Command::Decr(cmd) => cmd.exec(store),
            Command::DecrBy(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::GetDel(cmd) => cmd.exec(store),
            Command::GetRange(cmd) => cmd.exec(store),
            Command::GetSet(cmd) => cmd.exec(store),
            Command::Incr(cmd) => cmd.exec(store),
            Command::IncrBy(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::SetRange(cmd) => cmd.exec(store),
            Command::StrLen(cmd) => cmd.exec(store),
        }
    }
}

type ParseFn = fn(&mut CommandParser) -> Result<Command, CommandParserError>;

/// Registry entry: every supported command takes a fixed number of arguments.
struct CommandSpec {
    name: &'static str,
    arity: usize,
    parse: ParseFn,
}

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "APPEND",
        arity: 2,
        parse: |parser| Append::try_from(parser).map(Command::Append),
    },
    CommandSpec {
        name: "DECR",
        arity: 1,
        parse: |parser| Decr::try_from(parser).map(Command::Decr),
    },
    CommandSpec {
        name: "DECRBY",
        arity: 2,
        parse: |parser| DecrBy::try_from(parser).map(Command::DecrBy),
    },
    CommandSpec {
        name: "GET",
        arity: 1,
        parse: |parser| Get::try_from(parser).map(Command::Get),
    },
    CommandSpec {
        name: "GETDEL",
        arity: 1,
        parse: |parser| GetDel::try_from(parser).map(Command::GetDel),
    },
    CommandSpec {
        name: "GETRANGE",
        arity: 3,
        parse: |parser| GetRange::try_from(parser).map(Command::GetRange),
    },
    CommandSpec {
        name: "GETSET",
        arity: 2,
        parse: |parser| GetSet::try_from(parser).map(Command::GetSet),
    },
    CommandSpec {
        name: "INCR",
        arity: 1,
        parse: |parser| Incr::try_from(parser).map(Command::Incr),
    },
    CommandSpec {
        name: "INCRBY",
        arity: 2,
        parse: |parser| IncrBy::try_from(parser).map(Command::IncrBy),
    },
    CommandSpec {
        name: "SET",
        arity: 2,
        parse: |parser| Set::try_from(parser).map(Command::Set),
    },
    CommandSpec {
        name: "SETRANGE",
        arity: 3,
        parse: |parser| SetRange::try_from(parser).map(Command::SetRange),
    },
    CommandSpec {
        name: "STRLEN",
        arity: 1,
        parse: |parser| StrLen::try_from(parser).map(Command::StrLen),
    },
];

fn lookup(name: &[u8]) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.as_bytes().eq_ignore_ascii_case(name))
}

impl Command {
    /// Pulls the tokens of one message from `rx` and builds the command they name.
    ///
    /// Only as many tokens as the command takes are pulled before its arguments are parsed.
    /// When a request is rejected, the rest of its message is discarded so the next pipelined
    /// request starts on a boundary. Returns `None` once the channel is closed.
    pub async fn read(rx: &mut TokenReceiver) -> Option<Result<Command, CommandParserError>> {
        let name = match rx.recv().await? {
            Token::Simple(name) | Token::Bulk(name) => name,
            Token::EndOfMessage => return Some(Err(CommandParserError::EmptyInput)),
            Token::NullArray | Token::NullBulk => {
                skip_message(rx).await;
                return Some(Err(CommandParserError::EmptyInput));
            }
            token => {
                skip_message(rx).await;
                return Some(Err(CommandParserError::WrongInputType {
                    expected: "command name",
                    actual: token,
                }));
            }
        };

        let Some(spec) = lookup(&name) else {
            skip_message(rx).await;
            return Some(Err(CommandParserError::UnknownCommand {
                command: String::from_utf8_lossy(&name).into_owned(),
            }));
        };

        let mut parts = Vec::with_capacity(spec.arity);
        while parts.len() < spec.arity {
            match rx.recv().await? {
                Token::EndOfMessage => {
                    return Some(Err(CommandParserError::MissingArguments {
                        command: spec.name,
                        expected: spec.arity,
                    }))
                }
                token => parts.push(token),
            }
        }

        let parser = &mut CommandParser {
            parts: parts.into_iter(),
        };
        let command = match (spec.parse)(parser) {
            Ok(command) => command,
            Err(err) => {
                skip_message(rx).await;
                return Some(Err(err));
            }
        };

        match rx.recv().await? {
            Token::EndOfMessage => Some(Ok(command)),
            _ => {
                skip_message(rx).await;
                Some(Err(CommandParserError::ExtraArguments {
                    command: spec.name,
                    expected: spec.arity,
                }))
            }
        }
    }
}

async fn skip_message(rx: &mut TokenReceiver) {
    while let Some(token) = rx.recv().await {
        if token.is_end_of_message() {
            break;
        }
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Token>,
}

impl CommandParser {
    fn next(&mut self) -> Result<Token, CommandParserError> {
        self.parts.next().ok_or(CommandParserError::EndOfStream)
    }

    /// Keys and values are raw bytes, both simple and bulk strings are accepted.
    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        match self.next()? {
            Token::Simple(bytes) | Token::Bulk(bytes) => Ok(bytes),
            Token::NullBulk => Err(CommandParserError::EmptyInput),
            token => Err(CommandParserError::WrongInputType {
                expected: "string",
                actual: token,
            }),
        }
    }

    /// Accepts an integer token or a string holding a base-10 integer.
    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let token = self.next()?;

        let integer = match &token {
            Token::Integer(i) => Some(*i),
            Token::Simple(bytes) | Token::Bulk(bytes) => str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse::<i64>().ok()),
            _ => None,
        };

        match (integer, token) {
            (Some(i), _) => Ok(i),
            (None, token @ (Token::Simple(_) | Token::Bulk(_))) => {
                Err(CommandParserError::ConversionError { actual: token })
            }
            (None, token) => Err(CommandParserError::WrongInputType {
                expected: "integer",
                actual: token,
            }),
        }
    }
}

/// Rejections that are reported to the client as an error reply. The connection stays open.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("UNKNOWN_COMMAND unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("WRONG_INPUT_TYPE expected {expected}, got {actual}")]
    WrongInputType {
        expected: &'static str,
        actual: Token,
    },
    #[error("EMPTY_INPUT expected a non-null string")]
    EmptyInput,
    #[error("CONVERSION_ERROR expected an integer, got {actual}")]
    ConversionError { actual: Token },
    #[error("EXTRA_ARGUMENTS '{command}' takes {expected} argument(s)")]
    ExtraArguments {
        command: &'static str,
        expected: usize,
    },
    #[error("MISSING_ARGUMENTS '{command}' takes {expected} argument(s)")]
    MissingArguments {
        command: &'static str,
        expected: usize,
    },
    #[error("INVALID_ARGUMENT invalid {argument} for '{command}'")]
    InvalidCommandArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("MISSING_ARGUMENTS the message was fully consumed")]
    EndOfStream,
}
