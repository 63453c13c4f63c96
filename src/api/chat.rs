//! Blocking WebSocket client for the chat assistant.

use std::net::TcpStream;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::error::{Error, Result};

use super::types::{ChatMessage, ChatResponse};

/// One chat session over a WebSocket connection.
///
/// Each [`ChatClient::send`] writes one message and waits for the next text
/// frame, so exchanges on one client are strictly sequential.
pub struct ChatClient {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl ChatClient {
    /// Open a chat session, e.g. `ws://localhost:5000/ws/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails.
    pub fn connect(url: &str) -> Result<Self> {
        tracing::info!("Connecting to chat at {url}");
        let (socket, response) = tungstenite::connect(url)?;
        tracing::debug!("Chat handshake answered with {}", response.status());
        Ok(Self { socket })
    }

    /// Send a message and wait for the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the peer closes first,
    /// [`Error::Json`] if the reply is not a chat response, and transport
    /// errors otherwise.
    pub fn send(&mut self, message: &ChatMessage) -> Result<ChatResponse> {
        let payload = serde_json::to_string(message)?;
        tracing::info!(
            "Sending chat message ({} bytes, image: {})",
            payload.len(),
            message.image_data.is_some()
        );
        self.socket.send(Message::Text(payload))?;

        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(serde_json::from_str(&text)?),
                Ok(Message::Close(_)) | Err(tungstenite::Error::ConnectionClosed) => {
                    return Err(Error::ConnectionClosed)
                }
                // Pongs are queued by tungstenite and flushed on the next read
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Binary(data)) => {
                    tracing::debug!("Ignoring {} byte binary frame", data.len());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Ask a text-only question.
    ///
    /// # Errors
    ///
    /// See [`ChatClient::send`].
    pub fn ask(&mut self, text: &str) -> Result<ChatResponse> {
        self.send(&ChatMessage::text(text))
    }

    /// Ask about a base64-encoded screenshot.
    ///
    /// # Errors
    ///
    /// See [`ChatClient::send`].
    pub fn ask_with_image(&mut self, text: &str, image_base64: &str) -> Result<ChatResponse> {
        self.send(&ChatMessage::with_image(text, image_base64))
    }

    /// Perform the closing handshake.
    ///
    /// # Errors
    ///
    /// Returns transport errors other than the connection already being closed.
    pub fn close(mut self) -> Result<()> {
        self.socket.close(None)?;
        loop {
            match self.socket.read() {
                Ok(_) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(())
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Accept one WebSocket client, reply to its first text frame with `reply`.
    ///
    /// The join handle yields the text the client sent.
    fn serve_chat(reply: Option<&'static str>) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws/", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();

            let received = loop {
                if let Message::Text(text) = ws.read().unwrap() {
                    break text;
                }
            };

            match reply {
                Some(body) => {
                    ws.send(Message::Ping(vec![1, 2, 3])).unwrap();
                    ws.send(Message::Text(body.to_string())).unwrap();
                }
                None => ws.close(None).unwrap(),
            }

            // Drain until the client goes away
            while ws.read().is_ok() {}
            received
        });

        (url, handle)
    }

    #[test]
    fn test_text_exchange() {
        let (url, server) = serve_chat(Some(
            r#"{"response":"Загрузите скриншот","analysis":null,"suggestions":["a","b"]}"#,
        ));

        let mut client = ChatClient::connect(&url).unwrap();
        let response = client.ask("help").unwrap();
        drop(client);

        let sent: ChatMessage = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent, ChatMessage::text("help"));
        assert_eq!(response.response, "Загрузите скриншот");
        assert_eq!(response.suggestions.len(), 2);
    }

    #[test]
    fn test_image_message_carries_payload() {
        let (url, server) = serve_chat(Some(r#"{"response":"ok","suggestions":[]}"#));

        let mut client = ChatClient::connect(&url).unwrap();
        client.ask_with_image("analyze", "AAAA").unwrap();
        drop(client);

        let sent: ChatMessage = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent.image_data.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_bad_reply_is_json_error() {
        let (url, server) = serve_chat(Some("not json"));

        let mut client = ChatClient::connect(&url).unwrap();
        let err = client.ask("hello").unwrap_err();
        drop(client);
        server.join().unwrap();

        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_peer_close_is_reported() {
        let (url, server) = serve_chat(None);

        let mut client = ChatClient::connect(&url).unwrap();
        let err = client.ask("hello").unwrap_err();
        drop(client);
        server.join().unwrap();

        assert!(matches!(err, Error::ConnectionClosed));
    }
}
