use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::response::Response;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

/// Get the value of `key` and delete the key.
///
/// Ref: <https://redis.io/docs/latest/commands/getdel/>
#[derive(Debug, PartialEq)]
pub struct GetDel {
    pub key: Bytes,
}

impl Executable for GetDel {
    fn exec(self, store: Store) -> Result<Response, Error> {
        match store.lock().remove(&self.key) {
            Some(value) => Ok(Token::Bulk(value).into()),
            None => Ok(Token::NullBulk.into()),
        }
    }
}

impl TryFrom<&mut CommandParser> for GetDel {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
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
        store.lock().set(Bytes::from("key1"), Bytes::from("value1"));

        let cmd = parse(message(&["GETDEL", "key1"])).await.unwrap();
        assert_eq!(
            cmd,
            Command::GetDel(GetDel {
                key: Bytes::from("key1")
            })
        );

        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Response::from(Token::Bulk(Bytes::from("value1"))));
        assert!(!store.lock().exists(b"key1"));
    }

    #[tokio::test]
    async fn missing_key() {
        let store = Store::new();

        let result = run(&store, &["GETDEL", "key1"]).await;

        assert_eq!(result, Response::from(Token::NullBulk));
    }
}
