use crate::token::Token;

/// The reply to one request: the tokens to write, in order, and whether they are framed as an
/// array on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    tokens: Vec<Token>,
    array: bool,
}

impl Response {
    pub fn single(token: Token) -> Response {
        Response {
            tokens: vec![token],
            array: false,
        }
    }

    pub fn array(tokens: Vec<Token>) -> Response {
        Response {
            tokens,
            array: true,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_array(&self) -> bool {
        self.array
    }
}

impl From<Token> for Response {
    fn from(token: Token) -> Self {
        Response::single(token)
    }
}
