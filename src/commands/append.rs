use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

/// If `key` already exists, this command appends `value` at the end of the string. If key does
/// not exist it is created and set as an empty string, so APPEND will be similar to SET in this
/// special case.
///
/// Ref: <https://redis.io/docs/latest/commands/append/>
#[derive(Debug, PartialEq)]
pub struct Append {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for Append {
    fn exec(self, store: Store) -> Result<Response, Error> {
        let len = store.lock().append(self.key, &self.value);
        Ok(Token::Integer(len as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for Append {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, value })
    }
}
