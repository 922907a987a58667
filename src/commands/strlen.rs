use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

/// Returns the length of the string value stored at key, or 0 when key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/strlen/>
#[derive(Debug, PartialEq)]
pub struct StrLen {
    pub key: Bytes,
}

impl Executable for StrLen {
    fn exec(self, store: Store) -> Result<Response, Error> {
        let len = store.lock().len(&self.key).unwrap_or(0);
        Ok(Token::Integer(len as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for StrLen {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
