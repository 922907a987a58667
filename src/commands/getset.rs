use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

/// Atomically sets `key` to `value` and returns the old value stored at `key`. A key that did not
/// exist yields an empty string rather than `nil`.
///
/// Ref: <https://redis.io/docs/latest/commands/getset/>
#[derive(Debug, PartialEq)]
pub struct GetSet {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for GetSet {
    fn exec(self, store: Store) -> Result<Response, Error> {
        let previous = store.lock().get_and_set(self.key, self.value);

        Ok(Token::Bulk(previous.unwrap_or_default()).into())
    }
}

impl TryFrom<&mut CommandParser> for GetSet {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{message, parse, run};
    use crate::commands::Command;

    #[tokio::test]
    async fn existing_key() {
        let store = Store::new();
        store.lock().set(Bytes::from("key1"), Bytes::from("old"));

        let cmd = parse(message(&["GETSET", "key1", "new"])).await.unwrap();
        assert_eq!(
            cmd,
            Command::GetSet(GetSet {
                key: Bytes::from("key1"),
                value: Bytes::from("new"),
            })
        );

        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Response::from(Token::Bulk(Bytes::from("old"))));
        assert_eq!(store.lock().get(b"key1"), Some(Bytes::from("new")));
    }

    #[tokio::test]
    async fn missing_key_replies_empty_string() {
        let store = Store::new();

        let result = run(&store, &["GETSET", "key1", "new"]).await;

        assert_eq!(result, Response::from(Token::Bulk(Bytes::new())));
        assert_eq!(store.lock().get(b"key1"), Some(Bytes::from("new")));
    }
}
