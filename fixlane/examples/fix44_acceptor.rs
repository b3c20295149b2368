//! FIX 4.4 acceptor example.
//!
//! Accepts connections, frames and decodes inbound traffic with the tokio
//! codec, answers Logon, TestRequest and Logout, and applies sequence
//! corrections recovered from Reject and Logout text.
//!
//! Run with `FIX_PORT=9876 cargo run --example fix44_acceptor`.

use fixlane::dictionary::embedded;
use fixlane::prelude::*;
use fixlane::session::IdGenerator;
use futures::{SinkExt, StreamExt};
use std::env;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 9876;

/// Initializes logging with env filter support.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Per-connection session state.
struct Connection {
    sender_comp_id: String,
    target_comp_id: String,
    counters: SequenceManager,
    send_lock: SendLock,
    resync: SequenceResynchronizer,
}

impl Connection {
    fn new(resync: SequenceResynchronizer) -> Self {
        Self {
            sender_comp_id: env::var("FIX_SENDER").unwrap_or_else(|_| "SERVER".to_string()),
            target_comp_id: env::var("FIX_TARGET").unwrap_or_else(|_| "CLIENT".to_string()),
            counters: SequenceManager::new(),
            send_lock: SendLock::new(),
            resync,
        }
    }

    /// Builds an outbound message with a fully populated header.
    fn outbound(&self, msg_type: &str) -> MessageTree {
        let seq = self.counters.allocate_sender_seq();
        let mut tree = MessageTree::new("FIX.4.4", msg_type);
        let header = tree.header_mut();
        header.set_field("SenderCompID", 49, self.sender_comp_id.as_str());
        header.set_field("TargetCompID", 56, self.target_comp_id.as_str());
        header.set_field("MsgSeqNum", 34, seq);
        header.set_field(
            "SendingTime",
            52,
            Timestamp::now().truncate(TimePrecision::Millis),
        );
        tree
    }

    /// Produces the reply to one inbound message, if any.
    fn respond(&mut self, tree: &MessageTree) -> Option<MessageTree> {
        self.counters.increment_target_seq();

        match self.resync.observe(tree) {
            Ok(corrections) if !corrections.is_empty() => {
                self.send_lock
                    .with(|guard| self.resync.apply_pending(guard, &self.counters));
            }
            Ok(_) => {}
            Err(e) => warn!("No sequence correction: {}", e),
        }

        match tree.msg_type()? {
            "A" => {
                let mut reply = self.outbound("A");
                let interval = tree.body().value(108).cloned().unwrap_or(FieldValue::Int(30));
                reply.body_mut().set_field("EncryptMethod", 98, 0i64);
                reply.body_mut().set_field("HeartBtInt", 108, interval);
                Some(reply)
            }
            "1" => {
                let mut reply = self.outbound("0");
                if let Some(id) = tree.body().value(112).cloned() {
                    reply.body_mut().set_field("TestReqID", 112, id);
                }
                Some(reply)
            }
            "5" => Some(self.outbound("5")),
            _ => None,
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    codec: FixMessageCodec,
    resync: SequenceResynchronizer,
) -> anyhow::Result<()> {
    let peer = socket.peer_addr()?;
    let mut framed = Framed::new(socket, codec);
    let mut connection = Connection::new(resync);
    let ids = IdGenerator::new("FAULT-");

    while let Some(item) = framed.next().await {
        match item? {
            Inbound::Message(message) => {
                let Some(tree) = message.tree() else {
                    continue;
                };
                info!(%peer, msg_type = ?tree.msg_type(), "received");
                let logout = tree.msg_type() == Some("5");
                if let Some(reply) = connection.respond(tree) {
                    framed.send(&reply).await?;
                }
                if logout {
                    break;
                }
            }
            Inbound::DecodeFailed(failure) => {
                warn!(%peer, id = %ids.next_id(), cause = %failure.cause, "undecodable message");
            }
            Inbound::FramingFault(fault) => {
                warn!(
                    %peer,
                    id = %ids.next_id(),
                    discarded = fault.discarded,
                    cause = %fault.cause,
                    "framing fault"
                );
            }
        }
    }

    info!(%peer, next_sender = %connection.counters.next_sender_seq(), "connection closed");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let port = env::var("FIX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = format!("{}:{}", DEFAULT_HOST, port);

    let dictionary = Arc::new(embedded::fix44()?);
    let codec = FixMessageCodec::new(dictionary, CodecConfig::default())?;
    let resync = SequenceResynchronizer::new(
        ResyncConfig::default().with_reject_pattern(r"(?i)expected\s+(?P<sender>\d+)"),
    )?;

    let listener = TcpListener::bind(&addr).await?;
    info!("FIX 4.4 acceptor listening on {}", addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);
        let codec = codec.clone();
        let resync = resync.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, codec, resync).await {
                error!("Connection {} failed: {}", peer, e);
            }
        });
    }
}
