// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Bytes;
use thiserror::Error as ThisError;

pub(crate) static CRLF: &[u8; 2] = b"\r\n";

/// The atomic unit moved between the decoder, the dispatcher and the encoder.
///
/// A client request is decoded into a run of tokens closed by `EndOfMessage`. Replies are built
/// from the same tokens; `EndOfMessage` never produces bytes on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Integer(i64),
    Bulk(Bytes),
    Simple(Bytes),
    Error(Bytes),
    NullBulk,
    NullArray,
    EndOfMessage,
}

impl Token {
    /// Builds a simple string reply.
    pub fn simple(s: &'static str) -> Token {
        Token::Simple(Bytes::from_static(s.as_bytes()))
    }

    /// Builds an error reply. Line breaks would end the error line early, so they are replaced
    /// by spaces.
    pub fn error(msg: impl fmt::Display) -> Token {
        let msg: String = msg
            .to_string()
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();

        Token::Error(Bytes::from(msg))
    }

    pub fn is_end_of_message(&self) -> bool {
        matches!(self, Token::EndOfMessage)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(i) => write!(f, ":{}", i),
            Token::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Token::Simple(bytes) => write!(f, "+{}", String::from_utf8_lossy(bytes)),
            Token::Error(bytes) => write!(f, "-{}", String::from_utf8_lossy(bytes)),
            Token::NullBulk => write!(f, "$-1"),
            Token::NullArray => write!(f, "*-1"),
            Token::EndOfMessage => write!(f, "<end of message>"),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
#[error("invalid data type marker: {0:#04x}")]
pub struct InvalidDataType(pub u8);

/// The first byte of every RESP2 element identifies its type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = InvalidDataType;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}
