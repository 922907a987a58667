use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

/// Returns the substring of the string value stored at key, determined by the offsets start and
/// end (both are inclusive). The offsets are swapped when start is past end and the range is
/// limited to the actual length of the string.
///
/// Offsets must share a sign. A negative offset is counted as `len - offset`, which always lands
/// past the end of the string, so a range of two negative offsets is empty. Clients relying on
/// Redis' "-1 is the last byte" convention get an empty string back.
///
/// Ref: <https://redis.io/docs/latest/commands/getrange/>
#[derive(Debug, PartialEq)]
pub struct GetRange {
    pub key: Bytes,
    pub start: i64,
    pub end: i64,
}

impl Executable for GetRange {
    fn exec(self, store: Store) -> Result<Response, Error> {
        let Some(value) = store.lock().get(&self.key) else {
            return Ok(Token::NullBulk.into());
        };

        if (self.start < 0) != (self.end < 0) {
            return Ok(Token::error("INVALID RANGE").into());
        }

        let len = value.len();
        let start = normalize_index(len, self.start);
        let end = normalize_index(len, self.end);

        let lo = start.min(end);
        if lo == len {
            return Ok(Token::Bulk(Bytes::new()).into());
        }
        let hi = start.max(end).min(len - 1);

        Ok(Token::Bulk(value.slice(lo..=hi)).into())
    }
}

/// Maps an offset into `[0, len]`.
fn normalize_index(len: usize, index: i64) -> usize {
    let len = len as i64;
    let index = if index < 0 {
        len.saturating_sub(index)
    } else {
        index
    };

    index.clamp(0, len) as usize
}

impl TryFrom<&mut CommandParser> for GetRange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_integer()?;
        let end = parser.next_integer()?;

        Ok(Self { key, start, end })
    }
}
