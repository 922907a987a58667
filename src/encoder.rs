use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::response::Response;
use crate::token::{DataType, Token, CRLF};

/// Serializes tokens and responses into an [`AsyncWrite`] sink.
///
/// Each response is encoded into a scratch buffer first and handed to the sink with a single
/// `write_all`, so a reply is never interleaved with another one.
pub struct Encoder<W> {
    writer: W,
    buffer: BytesMut,
}

impl<W: AsyncWrite + Unpin> Encoder<W> {
    pub fn new(writer: W) -> Encoder<W> {
        Encoder {
            writer,
            buffer: BytesMut::with_capacity(4096),
        }
    }

    pub async fn write_token(&mut self, token: &Token) -> io::Result<()> {
        encode(token, &mut self.buffer);
        self.write_buffer().await
    }

    pub async fn write_response(&mut self, response: &Response) -> io::Result<()> {
        encode_response(response, &mut self.buffer);
        self.write_buffer().await
    }

    async fn write_buffer(&mut self) -> io::Result<()> {
        self.writer.write_all(&self.buffer).await?;
        self.writer.flush().await?;
        self.buffer.clear();
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub fn encode_response(response: &Response, dst: &mut BytesMut) {
    if response.is_array() {
        let count = response
            .tokens()
            .iter()
            .filter(|token| !token.is_end_of_message())
            .count();
        encode_array_header(count, dst);
    }

    for token in response.tokens() {
        encode(token, dst);
    }
}

pub fn encode_array_header(count: usize, dst: &mut BytesMut) {
    dst.put_u8(u8::from(DataType::Array));
    dst.put_slice(count.to_string().as_bytes());
    dst.put_slice(CRLF);
}

pub fn encode(token: &Token, dst: &mut BytesMut) {
    match token {
        Token::Integer(i) => {
            dst.put_u8(u8::from(DataType::Integer));
            dst.put_slice(i.to_string().as_bytes());
            dst.put_slice(CRLF);
        }
        Token::Bulk(bytes) => {
            dst.put_u8(u8::from(DataType::BulkString));
            dst.put_slice(bytes.len().to_string().as_bytes());
            dst.put_slice(CRLF);
            dst.put_slice(bytes);
            dst.put_slice(CRLF);
        }
        Token::Simple(bytes) => {
            dst.put_u8(u8::from(DataType::SimpleString));
            dst.put_slice(bytes);
            dst.put_slice(CRLF);
        }
        Token::Error(bytes) => {
            dst.put_u8(u8::from(DataType::SimpleError));
            dst.put_slice(bytes);
            dst.put_slice(CRLF);
        }
        Token::NullBulk => dst.put_slice(b"$-1\r\n"),
        Token::NullArray => dst.put_slice(b"*-1\r\n"),
        Token::EndOfMessage => {}
    }
}

impl From<&Token> for Vec<u8> {
    fn from(token: &Token) -> Self {
        let mut dst = BytesMut::new();
        encode(token, &mut dst);
        dst.to_vec()
    }
}

impl From<&Response> for Vec<u8> {
    fn from(response: &Response) -> Self {
        let mut dst = BytesMut::new();
        encode_response(response, &mut dst);
        dst.to_vec()
    }
}
