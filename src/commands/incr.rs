use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::incrby;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::Error;

/// Increments the number stored at key by one.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: Bytes,
}

impl Executable for Incr {
    fn exec(self, store: Store) -> Result<Response, Error> {
        Ok(incrby::add(&store, self.key, Some(1)))
    }
}

impl TryFrom<&mut CommandParser> for Incr {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
