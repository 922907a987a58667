use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

const MAX_OFFSET: i64 = 536_870_911;

/// Setrange overwrites part of the string stored at key, starting at the specified offset, for the
/// entire length of value. If the offset is larger than the current length of the string at key,
/// the string is padded with zero-bytes to make offset fit. Non-existing keys are considered as
/// empty strings, so this command will make sure it holds a string large enough to be able to set
/// value at offset.
///
/// Note that the maximum offset that you can set is 2^29 -1 (536870911), as Redis Strings are
/// limited to 512 megabytes.
///
/// Ref: <https://redis.io/docs/latest/commands/setrange/>
#[derive(Debug, PartialEq)]
pub struct SetRange {
    pub key: Bytes,
    pub offset: usize,
    pub value: Bytes,
}

impl Executable for SetRange {
    fn exec(self, store: Store) -> Result<Response, Error> {
        let len = store.lock().set_range(self.key, self.offset, &self.value);
        Ok(Token::Integer(len as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for SetRange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let offset = parser.next_integer()?;
        let value = parser.next_bytes()?;

        if !(0..=MAX_OFFSET).contains(&offset) {
            return Err(CommandParserError::InvalidCommandArgument {
                command: "SETRANGE",
                argument: "offset",
            });
        }

        Ok(Self {
            key,
            offset: offset as usize,
            value,
        })
    }
}
