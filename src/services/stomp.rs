//! Minimal STOMP client
//!
//! Just enough of the protocol to publish one message per status
//! transition: CONNECT, SEND, DISCONNECT over a plain TCP stream, with
//! failover across a static ordered broker list. Frames are the classic
//! text layout: command line, `name:value` headers, blank line, body,
//! NUL terminator.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::utils::{AppError, AppResult};

/// One STOMP frame
#[derive(Debug, Clone, PartialEq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StompFrame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        // Header values must stay on one line; the protocol has no escaping
        // in 1.0, so line breaks are stripped.
        let value = value.into().replace(['\r', '\n'], " ");
        self.headers.push((name.to_string(), value));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Wire encoding, including the NUL terminator
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.body.len());
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.push(b':');
            out.extend_from_slice(value.as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }

    /// Decode a frame from bytes read up to (but not including) the NUL
    pub fn decode(raw: &[u8]) -> AppResult<Self> {
        // Tolerate heartbeat/EOL bytes between frames
        let mut start = 0;
        while start < raw.len() && (raw[start] == b'\n' || raw[start] == b'\r') {
            start += 1;
        }
        let raw = &raw[start..];

        let header_end = raw
            .windows(2)
            .position(|w| w == b"\n\n")
            .ok_or_else(|| AppError::Broker("malformed STOMP frame".to_string()))?;
        let head = std::str::from_utf8(&raw[..header_end])
            .map_err(|_| AppError::Broker("non-UTF8 STOMP frame header".to_string()))?;
        let body = raw[header_end + 2..].to_vec();

        let mut lines = head.lines();
        let command = lines
            .next()
            .ok_or_else(|| AppError::Broker("empty STOMP frame".to_string()))?
            .trim_end_matches('\r')
            .to_string();

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        Ok(Self {
            command,
            headers,
            body,
        })
    }
}

/// A connected STOMP session
pub struct StompClient {
    stream: BufReader<TcpStream>,
    peer: String,
}

impl StompClient {
    /// Connect to the first reachable broker in the failover list and
    /// complete the CONNECT handshake.
    pub async fn connect(brokers: &[String]) -> AppResult<Self> {
        for addr in brokers {
            match TcpStream::connect(addr.as_str()).await {
                Ok(stream) => match Self::handshake(stream, addr).await {
                    Ok(client) => return Ok(client),
                    Err(err) => {
                        warn!("STOMP handshake with {} failed: {}", addr, err);
                    }
                },
                Err(err) => {
                    warn!("Could not reach broker {}: {}", addr, err);
                }
            }
        }
        Err(AppError::Broker(format!(
            "no broker reachable in {:?}",
            brokers
        )))
    }

    async fn handshake(stream: TcpStream, addr: &str) -> AppResult<Self> {
        let host = addr.split(':').next().unwrap_or(addr).to_string();
        let mut client = Self {
            stream: BufReader::new(stream),
            peer: addr.to_string(),
        };

        let connect = StompFrame::new("CONNECT")
            .header("accept-version", "1.0,1.1")
            .header("host", host);
        client.write_frame(&connect).await?;

        let reply = client.read_frame().await?;
        if reply.command != "CONNECTED" {
            return Err(AppError::Broker(format!(
                "broker {} answered CONNECT with {}",
                addr, reply.command
            )));
        }
        debug!("Connected to broker {}", addr);
        Ok(client)
    }

    /// The `host:port` this session is connected to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Publish one message to a destination
    pub async fn send(
        &mut self,
        destination: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> AppResult<()> {
        let mut frame = StompFrame::new("SEND")
            .header("destination", destination)
            .header("content-length", body.len().to_string());
        for (name, value) in headers {
            frame = frame.header(name, value.clone());
        }
        self.write_frame(&frame.body(body.to_vec())).await
    }

    /// Close the session
    pub async fn disconnect(mut self) -> AppResult<()> {
        self.write_frame(&StompFrame::new("DISCONNECT")).await?;
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }

    async fn write_frame(&mut self, frame: &StompFrame) -> AppResult<()> {
        let encoded = frame.encode();
        self.stream.get_mut().write_all(&encoded).await?;
        self.stream.get_mut().flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> AppResult<StompFrame> {
        let mut raw = Vec::new();
        let n = self.stream.read_until(0, &mut raw).await?;
        if n == 0 {
            return Err(AppError::Broker("broker closed connection".to_string()));
        }
        if raw.last() == Some(&0) {
            raw.pop();
        }
        StompFrame::decode(&raw)
    }
}
