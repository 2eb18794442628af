//! In-process fake HDC server used by the client tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::protocol::{ChannelHandShake, HdcCommand, PacketCodec, HANDSHAKE_BANNER};

/// What the fake server sends back for one command
#[derive(Debug, Clone, Default)]
pub(crate) struct Reply {
    packets: Vec<Vec<u8>>,
    /// Packet whose payload is held back after its length prefix is sent
    stalled: Option<(Vec<u8>, Duration)>,
    close: bool,
}

impl Reply {
    pub(crate) fn none() -> Self {
        Self::default()
    }

    pub(crate) fn text(text: &str) -> Self {
        Self::texts(&[text])
    }

    pub(crate) fn texts(texts: &[&str]) -> Self {
        Self {
            packets: texts.iter().map(|t| t.as_bytes().to_vec()).collect(),
            ..Self::default()
        }
    }

    /// A text packet carrying the 2-byte `KernelEcho` prefix
    pub(crate) fn echo(text: &str) -> Self {
        let mut packet = HdcCommand::KernelEcho.as_u16().to_le_bytes().to_vec();
        packet.extend_from_slice(text.as_bytes());
        Self {
            packets: vec![packet],
            ..Self::default()
        }
    }

    /// After the other packets, send the length of `text` and wait `delay`
    /// before sending its payload
    pub(crate) fn then_stalled(mut self, text: &str, delay: Duration) -> Self {
        self.stalled = Some((text.as_bytes().to_vec(), delay));
        self
    }

    pub(crate) fn and_close(mut self) -> Self {
        self.close = true;
        self
    }
}

/// One accepted channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub channel_id: u32,
    pub connect_key: String,
    pub reply_len: usize,
}

type Responder = dyn Fn(&str, &str) -> Reply + Send + Sync;

#[derive(Default)]
struct Log {
    sessions: Vec<Session>,
    commands: Vec<(String, String)>,
}

pub(crate) struct FakeServer {
    addr: SocketAddr,
    log: Arc<Mutex<Log>>,
}

impl FakeServer {
    /// Start a server sending 44-byte handshakes
    pub(crate) async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + Sync + 'static,
    {
        Self::start_with_handshake(ChannelHandShake::SIZE_WITHOUT_VERSION, responder).await
    }

    /// Start a server sending handshakes of `handshake_len` bytes
    pub(crate) async fn start_with_handshake<F>(handshake_len: usize, responder: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(Log::default()));
        let responder: Arc<Responder> = Arc::new(responder);
        let next_channel = Arc::new(AtomicU32::new(1));

        let accept_log = log.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let channel_id = next_channel.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(
                    stream,
                    channel_id,
                    handshake_len,
                    accept_log.clone(),
                    responder.clone(),
                ));
            }
        });

        Self { addr, log }
    }

    pub(crate) fn address(&self) -> String {
        self.addr.to_string()
    }

    pub(crate) fn sessions(&self) -> Vec<Session> {
        self.log.lock().unwrap().sessions.clone()
    }

    /// Commands received so far as `(connect key, command)`
    pub(crate) fn commands(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().commands.clone()
    }
}

async fn serve(
    mut stream: TcpStream,
    channel_id: u32,
    handshake_len: usize,
    log: Arc<Mutex<Log>>,
    responder: Arc<Responder>,
) {
    let codec = PacketCodec::new();

    let mut handshake = ChannelHandShake::default();
    handshake.banner[..HANDSHAKE_BANNER.len()].copy_from_slice(HANDSHAKE_BANNER);
    handshake.set_channel_id(channel_id);
    handshake.set_version("Ver: 3.1.0e");
    let mut hello = handshake.to_bytes();
    hello.truncate(handshake_len);
    if codec.write_packet(&mut stream, &hello).await.is_err() {
        return;
    }

    let reply = match codec.read_packet(&mut stream).await {
        Ok(reply) => reply,
        Err(_) => return,
    };
    let connect_key = ChannelHandShake::from_bytes(&reply)
        .map(|hs| hs.connect_key())
        .unwrap_or_default();
    log.lock().unwrap().sessions.push(Session {
        channel_id,
        connect_key: connect_key.clone(),
        reply_len: reply.len(),
    });

    while let Ok(packet) = codec.read_packet(&mut stream).await {
        let command = String::from_utf8_lossy(&packet).into_owned();
        debug!("fake server got {:?} on channel {}", command, channel_id);
        log.lock()
            .unwrap()
            .commands
            .push((connect_key.clone(), command.clone()));

        let reply = responder(&connect_key, &command);
        for packet in &reply.packets {
            if codec.write_packet(&mut stream, packet).await.is_err() {
                return;
            }
        }
        if let Some((payload, delay)) = &reply.stalled {
            let length = (payload.len() as u32).to_be_bytes();
            if stream.write_all(&length).await.is_err() {
                return;
            }
            tokio::time::sleep(*delay).await;
            if stream.write_all(payload).await.is_err() {
                return;
            }
        }
        if reply.close {
            let _ = stream.shutdown().await;
            return;
        }
    }
}
