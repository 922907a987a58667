//! Single-slot handoff between the decoder and the dispatcher.
//!
//! Only one token can be in flight at a time, so the decoder never runs ahead of the command
//! being built. A request declaring a huge array count is therefore consumed one element at a
//! time instead of being buffered.

use thiserror::Error as ThisError;
use tokio::sync::mpsc;

use crate::token::Token;

const CAPACITY: usize = 1;

#[derive(Debug, ThisError, PartialEq)]
#[error("token channel closed")]
pub struct ChannelClosed;

pub fn channel() -> (TokenSender, TokenReceiver) {
    let (tx, rx) = mpsc::channel(CAPACITY);
    (TokenSender { tx }, TokenReceiver { rx })
}

#[derive(Debug)]
pub struct TokenSender {
    tx: mpsc::Sender<Token>,
}

impl TokenSender {
    /// Waits until the slot is free, then hands `token` over.
    pub async fn send(&self, token: Token) -> Result<(), ChannelClosed> {
        self.tx.send(token).await.map_err(|_| ChannelClosed)
    }
}

#[derive(Debug)]
pub struct TokenReceiver {
    rx: mpsc::Receiver<Token>,
}

impl TokenReceiver {
    /// Returns `None` once the sender is gone and the slot is empty.
    pub async fn recv(&mut self) -> Option<Token> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn holds_a_single_token() {
        let (tx, mut rx) = channel();

        tx.send(Token::Integer(1)).await.unwrap();

        // The slot is taken, a second send has to wait for the receiver.
        let blocked = timeout(Duration::from_millis(20), tx.send(Token::Integer(2))).await;
        assert!(blocked.is_err());

        assert_eq!(rx.recv().await, Some(Token::Integer(1)));
        tx.send(Token::Integer(2)).await.unwrap();
        assert_eq!(rx.recv().await, Some(Token::Integer(2)));
    }

    #[tokio::test]
    async fn closes_when_sender_is_dropped() {
        let (tx, mut rx) = channel();

        tx.send(Token::EndOfMessage).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(Token::EndOfMessage));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn send_fails_without_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        assert_eq!(tx.send(Token::NullBulk).await, Err(ChannelClosed));
    }
}
