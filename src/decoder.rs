// https://redis.io/docs/reference/protocol-spec

use std::io;
use std::str;

use bytes::BytesMut;
use thiserror::Error as ThisError;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::channel::{ChannelClosed, TokenSender};
use crate::token::{DataType, Token, CRLF};

pub const BUFFER_SIZE: usize = 1024;

// Same ceiling as Redis' proto-max-bulk-len.
const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;

/// Every variant is fatal: once the stream is out of sync the connection has to be dropped.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("protocol error; invalid bulk string framing")]
    InvalidBulkFraming,
    #[error("protocol error; invalid bulk string length {0}")]
    InvalidBulkLength(i64),
    #[error("protocol error; invalid integer {0:?}")]
    InvalidInteger(String),
    #[error("protocol error; nested inline/array not permitted")]
    NestedMessage,
    #[error("protocol error; stream ended in the middle of a message")]
    UnexpectedEof,
    #[error(transparent)]
    ChannelClosed(#[from] ChannelClosed),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Streaming RESP decoder.
///
/// Bytes are read from `reader` into a fixed buffer that is never reallocated, and every decoded
/// request is pushed to a [`TokenSender`] as a run of tokens closed by [`Token::EndOfMessage`].
/// The only place the decoder waits on the reader is [`Decoder::fill`].
pub struct Decoder<R> {
    reader: R,
    buffer: Box<[u8]>,
    // Index of the first unconsumed byte.
    cursor: usize,
    // Number of unconsumed bytes starting at `cursor`.
    filled: usize,
}

impl<R: AsyncRead + Unpin> Decoder<R> {
    pub fn new(reader: R) -> Decoder<R> {
        Decoder {
            reader,
            buffer: vec![0; BUFFER_SIZE].into_boxed_slice(),
            cursor: 0,
            filled: 0,
        }
    }

    /// Decodes messages until the reader is exhausted. The sender is dropped on return, which
    /// tells the receiving side that no more tokens are coming.
    pub async fn run(mut self, tx: TokenSender) -> Result<(), Error> {
        while self.decode_message(&tx).await? {}
        Ok(())
    }

    /// Decodes a single message. Returns `false` if the reader ended cleanly before the first
    /// byte of a new message.
    pub async fn decode_message(&mut self, tx: &TokenSender) -> Result<bool, Error> {
        if !self.fill(CRLF.len()).await? {
            return Ok(false);
        }

        match self.read_marker() {
            None => self.send_inline(tx).await?,
            Some(DataType::Array) => {
                let count = self.read_integer().await?;
                if count < 0 {
                    tx.send(Token::NullArray).await?;
                }

                for _ in 0..count {
                    self.require(CRLF.len()).await?;
                    let token = match self.read_marker() {
                        Some(DataType::Array) | None => return Err(Error::NestedMessage),
                        Some(data_type) => self.read_scalar(data_type).await?,
                    };
                    tx.send(token).await?;
                }
            }
            Some(data_type) => {
                let token = self.read_scalar(data_type).await?;
                tx.send(token).await?;
            }
        }

        tx.send(Token::EndOfMessage).await?;
        Ok(true)
    }

    async fn read_scalar(&mut self, data_type: DataType) -> Result<Token, Error> {
        match data_type {
            DataType::SimpleString => Ok(Token::Simple(self.read_line().await?.freeze())),
            DataType::SimpleError => Ok(Token::Error(self.read_line().await?.freeze())),
            DataType::Integer => self.read_integer().await.map(Token::Integer),
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = self.read_integer().await?;
                self.read_bulk(length).await
            }
            DataType::Array => Err(Error::NestedMessage),
        }
    }

    /// Inline commands have no marker: the whole line, including the byte that was peeked as a
    /// possible marker, is split on spaces.
    async fn send_inline(&mut self, tx: &TokenSender) -> Result<(), Error> {
        let line = self.read_line().await?.freeze();

        for part in line.split(|byte| *byte == b' ').filter(|part| !part.is_empty()) {
            tx.send(Token::Simple(line.slice_ref(part))).await?;
        }

        Ok(())
    }

    async fn read_bulk(&mut self, length: i64) -> Result<Token, Error> {
        if length == -1 {
            return Ok(Token::NullBulk);
        }
        if !(0..=MAX_BULK_LENGTH).contains(&length) {
            return Err(Error::InvalidBulkLength(length));
        }

        let length = length as usize;
        let total = length + CRLF.len();
        let mut data = BytesMut::with_capacity(total.min(BUFFER_SIZE));

        while data.len() < total {
            let remaining = total - data.len();
            self.require(remaining.min(CRLF.len())).await?;

            let n = remaining.min(self.filled);
            data.extend_from_slice(&self.buffer[self.cursor..self.cursor + n]);
            self.consume(n);
        }

        // The payload may contain CRLF itself, only the two bytes after it are checked.
        if !data.ends_with(&CRLF[..]) {
            return Err(Error::InvalidBulkFraming);
        }
        data.truncate(length);

        Ok(Token::Bulk(data.freeze()))
    }

    async fn read_integer(&mut self) -> Result<i64, Error> {
        let line = self.read_line().await?;

        str::from_utf8(&line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| Error::InvalidInteger(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Reads up to the next CRLF, refilling the buffer as often as needed. The terminator is
    /// consumed but not returned.
    async fn read_line(&mut self) -> Result<BytesMut, Error> {
        let mut line = BytesMut::new();

        loop {
            self.require(CRLF.len()).await?;

            let available = &self.buffer[self.cursor..self.cursor + self.filled];
            if let Some(position) = available.windows(2).position(|window| window == CRLF) {
                line.extend_from_slice(&available[..position]);
                self.consume(position + CRLF.len());
                return Ok(line);
            }

            // A trailing '\r' may be the first half of a terminator split across reads.
            let mut taken = available.len();
            if available[taken - 1] == CRLF[0] {
                taken -= 1;
            }
            line.extend_from_slice(&available[..taken]);
            self.consume(taken);
        }
    }

    fn read_marker(&mut self) -> Option<DataType> {
        let data_type = DataType::try_from(self.buffer[self.cursor]).ok()?;
        self.consume(1);
        Some(data_type)
    }

    fn consume(&mut self, n: usize) {
        self.cursor += n;
        self.filled -= n;
        if self.filled == 0 {
            self.cursor = 0;
        }
    }

    async fn require(&mut self, wanted: usize) -> Result<(), Error> {
        if self.fill(wanted).await? {
            Ok(())
        } else {
            Err(Error::UnexpectedEof)
        }
    }

    /// Reads until at least `wanted` bytes are buffered. `wanted` never exceeds the terminator
    /// length, so a single leftover byte moved to the front always leaves room for the read.
    ///
    /// Returns `false` when the reader ends with nothing buffered.
    async fn fill(&mut self, wanted: usize) -> Result<bool, Error> {
        debug_assert!(wanted <= CRLF.len());

        if self.filled >= wanted {
            return Ok(true);
        }
        if self.filled == 0 {
            self.cursor = 0;
        } else {
            self.buffer[0] = self.buffer[self.cursor];
            self.cursor = 0;
        }

        let mut end = self.cursor + self.filled;
        while self.filled < wanted {
            let n = self.reader.read(&mut self.buffer[end..]).await?;
            if n == 0 {
                if self.filled == 0 {
                    return Ok(false);
                }
                return Err(Error::UnexpectedEof);
            }
            self.filled += n;
            end += n;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use bytes::Bytes;
    use tokio::io::ReadBuf;

    use super::*;
    use crate::channel::channel;

    /// Hands out one chunk per read so tests control exactly how the input is fragmented.
    struct Chunked {
        chunks: VecDeque<Vec<u8>>,
    }

    impl Chunked {
        fn new(chunks: Vec<&[u8]>) -> Chunked {
            Chunked {
                chunks: chunks.into_iter().map(|c| c.to_vec()).collect(),
            }
        }

        fn bytewise(data: &[u8]) -> Chunked {
            Chunked::new(data.chunks(1).collect())
        }
    }

    impl AsyncRead for Chunked {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if let Some(mut chunk) = self.chunks.pop_front() {
                let n = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..n]);
                if n < chunk.len() {
                    chunk.drain(..n);
                    self.chunks.push_front(chunk);
                }
            }
            Poll::Ready(Ok(()))
        }
    }

    async fn decode<R: AsyncRead + Unpin>(reader: R) -> (Vec<Token>, Result<(), Error>) {
        let (tx, mut rx) = channel();
        let decoder = Decoder::new(reader);

        let collect = async {
            let mut tokens = vec![];
            while let Some(token) = rx.recv().await {
                tokens.push(token);
            }
            tokens
        };

        let (result, tokens) = tokio::join!(decoder.run(tx), collect);
        (tokens, result)
    }

    fn bulk(s: &'static str) -> Token {
        Token::Bulk(Bytes::from(s))
    }

    fn simple(s: &'static str) -> Token {
        Token::Simple(Bytes::from(s))
    }

    #[tokio::test]
    async fn bare_bulk_string() {
        let (tokens, result) = decode(&b"$3\r\nfoo\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![bulk("foo"), Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn simple_string_and_error() {
        let (tokens, result) = decode(&b"+OK\r\n-ERR boom\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                simple("OK"),
                Token::EndOfMessage,
                Token::Error(Bytes::from("ERR boom")),
                Token::EndOfMessage,
            ]
        );
    }

    #[tokio::test]
    async fn integers() {
        let (tokens, result) = decode(&b":1000\r\n:-1000\r\n:+7\r\n:0\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                Token::Integer(1000),
                Token::EndOfMessage,
                Token::Integer(-1000),
                Token::EndOfMessage,
                Token::Integer(7),
                Token::EndOfMessage,
                Token::Integer(0),
                Token::EndOfMessage,
            ]
        );
    }

    #[tokio::test]
    async fn invalid_integer() {
        let (tokens, result) = decode(&b":12a\r\n"[..]).await;

        assert!(tokens.is_empty());
        assert!(matches!(result, Err(Error::InvalidInteger(ref s)) if s == "12a"));
    }

    #[tokio::test]
    async fn inline_command() {
        let (tokens, result) = decode(&b"PING\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![simple("PING"), Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn inline_command_skips_empty_parts() {
        let (tokens, result) = decode(&b"SET  foo bar \r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![simple("SET"), simple("foo"), simple("bar"), Token::EndOfMessage]
        );
    }

    #[tokio::test]
    async fn empty_inline_line() {
        let (tokens, result) = decode(&b"\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn array() {
        let (tokens, result) = decode(&b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![bulk("SET"), bulk("foo"), bulk("bar"), Token::EndOfMessage]
        );
    }

    #[tokio::test]
    async fn array_with_mixed_elements() {
        let (tokens, result) = decode(&b"*4\r\n+GETRANGE\r\n$-1\r\n:-2\r\n-oops\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                simple("GETRANGE"),
                Token::NullBulk,
                Token::Integer(-2),
                Token::Error(Bytes::from("oops")),
                Token::EndOfMessage,
            ]
        );
    }

    #[tokio::test]
    async fn empty_array() {
        let (tokens, result) = decode(&b"*0\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn null_array() {
        let (tokens, result) = decode(&b"*-1\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![Token::NullArray, Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn empty_and_null_bulk_strings() {
        let (tokens, result) = decode(&b"$0\r\n\r\n$-1\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                bulk(""),
                Token::EndOfMessage,
                Token::NullBulk,
                Token::EndOfMessage
            ]
        );
    }

    #[tokio::test]
    async fn bulk_string_containing_terminator() {
        let (tokens, result) = decode(&b"$4\r\na\r\nb\r\n"[..]).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![bulk("a\r\nb"), Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn bulk_string_with_bad_terminator() {
        let (tokens, result) = decode(&b"$3\r\nfooXY"[..]).await;

        assert!(tokens.is_empty());
        assert!(matches!(result, Err(Error::InvalidBulkFraming)));
    }

    #[tokio::test]
    async fn bulk_string_with_negative_length() {
        let (_, result) = decode(&b"$-2\r\n"[..]).await;

        assert!(matches!(result, Err(Error::InvalidBulkLength(-2))));
    }

    #[tokio::test]
    async fn bulk_string_over_the_limit() {
        let (_, result) = decode(&b"$536870913\r\n"[..]).await;

        assert!(matches!(result, Err(Error::InvalidBulkLength(536870913))));
    }

    #[tokio::test]
    async fn nested_array_is_rejected() {
        let (tokens, result) = decode(&b"*2\r\n:1\r\n*1\r\n:2\r\n"[..]).await;

        assert_eq!(tokens, vec![Token::Integer(1)]);
        assert!(matches!(result, Err(Error::NestedMessage)));
    }

    #[tokio::test]
    async fn inline_inside_array_is_rejected() {
        let (tokens, result) = decode(&b"*2\r\n$3\r\nGET\r\nfoo\r\n"[..]).await;

        assert_eq!(tokens, vec![bulk("GET")]);
        assert!(matches!(result, Err(Error::NestedMessage)));
    }

    #[tokio::test]
    async fn empty_input() {
        let (tokens, result) = decode(&b""[..]).await;

        assert!(result.is_ok());
        assert!(tokens.is_empty());
    }

    #[tokio::test]
    async fn stream_ends_inside_a_message() {
        let (tokens, result) = decode(&b"*2\r\n$3\r\nGET\r\n"[..]).await;

        assert_eq!(tokens, vec![bulk("GET")]);
        assert!(matches!(result, Err(Error::UnexpectedEof)));
    }

    #[tokio::test]
    async fn stream_ends_inside_a_bulk_payload() {
        let (_, result) = decode(&b"$10\r\nabc"[..]).await;

        assert!(matches!(result, Err(Error::UnexpectedEof)));
    }

    #[tokio::test]
    async fn byte_by_byte_input() {
        let data = b"*3\r\n$3\r\nSET\r\n$5\r\nmykey\r\n$7\r\nmy\r\nval\r\n:42\r\nGET mykey\r\n";
        let (tokens, result) = decode(Chunked::bytewise(data)).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                bulk("SET"),
                bulk("mykey"),
                bulk("my\r\nval"),
                Token::EndOfMessage,
                Token::Integer(42),
                Token::EndOfMessage,
                simple("GET"),
                simple("mykey"),
                Token::EndOfMessage,
            ]
        );
    }

    #[tokio::test]
    async fn terminator_split_across_reads() {
        let reader = Chunked::new(vec![b"+O", b"K\r", b"\n$3\r\nfoo\r", b"\n"]);
        let (tokens, result) = decode(reader).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                simple("OK"),
                Token::EndOfMessage,
                bulk("foo"),
                Token::EndOfMessage
            ]
        );
    }

    #[tokio::test]
    async fn carriage_returns_inside_a_line() {
        let reader = Chunked::new(vec![b"+a\r", b"\rb\r", b"\n"]);
        let (tokens, result) = decode(reader).await;

        assert!(result.is_ok());
        assert_eq!(tokens, vec![simple("a\r\rb"), Token::EndOfMessage]);
    }

    #[tokio::test]
    async fn payloads_larger_than_the_buffer() {
        let line = "x".repeat(3 * BUFFER_SIZE);
        let payload = "y".repeat(5 * BUFFER_SIZE + 7);

        let mut data = format!("+{}\r\n", line).into_bytes();
        data.extend_from_slice(format!("${}\r\n{}\r\n", payload.len(), payload).as_bytes());

        let (tokens, result) = decode(&data[..]).await;

        assert!(result.is_ok());
        assert_eq!(
            tokens,
            vec![
                Token::Simple(Bytes::from(line)),
                Token::EndOfMessage,
                Token::Bulk(Bytes::from(payload)),
                Token::EndOfMessage,
            ]
        );
    }
}
