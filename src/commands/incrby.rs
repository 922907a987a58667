use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::{Counter, Store};
use crate::token::Token;
use crate::Error;

/// Increments the number stored at key by `delta`. A key that does not exist is initialized to
/// `delta` and its textual value is returned instead of an integer.
///
/// Ref: <https://redis.io/docs/latest/commands/incrby/>
#[derive(Debug, PartialEq)]
pub struct IncrBy {
    pub key: Bytes,
    pub delta: i64,
}

impl Executable for IncrBy {
    fn exec(self, store: Store) -> Result<Response, Error> {
        Ok(add(&store, self.key, Some(self.delta)))
    }
}

impl TryFrom<&mut CommandParser> for IncrBy {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let delta = parser.next_integer()?;

        Ok(Self { key, delta })
    }
}

/// Shared by every counter command. `None` stands for a delta that cannot be represented.
pub(crate) fn add(store: &Store, key: Bytes, delta: Option<i64>) -> Response {
    let Some(delta) = delta else {
        return Token::error("CONVERSION_ERROR").into();
    };

    match store.lock().incr_by(key, delta) {
        Ok(Counter::Updated(value)) => Token::Integer(value).into(),
        Ok(Counter::Created(value)) => Token::Bulk(Bytes::from(value.to_string())).into(),
        Err(_) => Token::error("CONVERSION_ERROR").into(),
    }
}
