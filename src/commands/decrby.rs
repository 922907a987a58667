use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::incrby;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::Error;

/// Decrements the number stored at key by `delta`. A key that does not exist is initialized to
/// `-delta`.
///
/// Ref: <https://redis.io/docs/latest/commands/decrby/>
#[derive(Debug, PartialEq)]
pub struct DecrBy {
    pub key: Bytes,
    pub delta: i64,
}

impl Executable for DecrBy {
    fn exec(self, store: Store) -> Result<Response, Error> {
        Ok(incrby::add(&store, self.key, self.delta.checked_neg()))
    }
}

impl TryFrom<&mut CommandParser> for DecrBy {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let delta = parser.next_integer()?;

        Ok(Self { key, delta })
    }
}
