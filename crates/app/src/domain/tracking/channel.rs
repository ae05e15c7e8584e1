//! Status channel.
//!
//! A push channel that delivers raw status messages for one order.

use async_trait::async_trait;
use futures::StreamExt as _;
use sacola::ids::OrderId;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, trace};

/// Errors from the status channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel could not be opened.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        /// Channel URL.
        url: String,
        /// Underlying WebSocket error.
        #[source]
        source: tungstenite::Error,
    },

    /// The open channel failed.
    #[error("status channel failed: {0}")]
    Transport(#[from] tungstenite::Error),
}

/// Opens status streams.
#[async_trait]
pub trait StatusChannel: Send + Sync {
    /// Open the status stream for `order`.
    async fn connect(&self, order: OrderId) -> Result<Box<dyn StatusStream>, ChannelError>;
}

/// One open status stream.
#[async_trait]
pub trait StatusStream: Send {
    /// Next text message, or `None` once the backend closed the stream.
    async fn next_message(&mut self) -> Option<Result<String, ChannelError>>;

    /// Send a close frame.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// WebSocket status channel at `{base_url}/{order_id}`.
#[derive(Debug, Clone)]
pub struct WsStatusChannel {
    base_url: String,
}

impl WsStatusChannel {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Channel URL for `order`.
    pub fn url_for(&self, order: OrderId) -> String {
        format!("{}/{order}", self.base_url)
    }
}

#[async_trait]
impl StatusChannel for WsStatusChannel {
    async fn connect(&self, order: OrderId) -> Result<Box<dyn StatusStream>, ChannelError> {
        let url = self.url_for(order);

        debug!(%url, "opening status channel");

        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|source| ChannelError::Connect { url, source })?;

        Ok(Box::new(WsStatusStream { socket }))
    }
}

struct WsStatusStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StatusStream for WsStatusStream {
    async fn next_message(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_string())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => trace!("skipping non-text binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "status channel closed by backend");

                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(error) => return Some(Err(error.into())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        match self.socket.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_order_id() {
        let channel = WsStatusChannel::new("ws://localhost:8000/ws/order/");

        assert_eq!(channel.url_for(OrderId::new(42)), "ws://localhost:8000/ws/order/42");
    }
}
