use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::{
    io::BufReader,
    net::{tcp::OwnedReadHalf, TcpListener, TcpStream},
    select,
    sync::watch,
};
use tracing::{debug, info, warn};

use crate::{
    message::{self, read_line},
    registry::ParticipantId,
    room::Room,
};

/// Accepts TCP connections and runs one receive loop per participant.
///
/// The accept loop itself handles one connection at a time; every accepted
/// connection gets its own task. Those tasks share nothing but the room,
/// and they block on their sockets without holding its lock.
pub struct Server {
    listener: TcpListener,
    room: Arc<Room>,
}

impl Server {
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            room: Arc::new(Room::new()),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the shutdown future resolves. Shutdown
    /// flips a watch channel, which pops every receive loop out of its
    /// blocking read so connections drain through the normal leave path.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Server { listener, room } = self;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("server shutting down");
                    let _ = shutdown_tx.send(true);
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &room, &shutdown_rx);
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn handle_accept_result(
    result: std::io::Result<(TcpStream, SocketAddr)>,
    room: &Arc<Room>,
    shutdown: &watch::Receiver<bool>,
) {
    match result {
        Ok((stream, peer)) => {
            info!(%peer, "accepted connection");
            spawn_connection_handler(stream, peer, room, shutdown.clone());
        }
        Err(err) => warn!(error = ?err, "failed to accept connection"),
    }
}

fn spawn_connection_handler(
    stream: TcpStream,
    peer: SocketAddr,
    room: &Arc<Room>,
    shutdown: watch::Receiver<bool>,
) {
    let room = Arc::clone(room);
    tokio::spawn(async move {
        if let Err(err) = handle_connection(stream, peer, room, shutdown).await {
            warn!(%peer, error = ?err, "connection closed with error");
        }
    });
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    room: Arc<Room>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (reader, writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    // No registration happens until a usable name has arrived; a failure
    // here aborts the connection with nothing to clean up.
    let name = read_participant_name(&mut reader).await?;
    let id = room.join(name.clone(), peer, writer).await;
    info!(%peer, name, "participant joined");

    let result = run_receive_loop(&room, &mut reader, id, &name, shutdown).await;

    // Every exit path funnels through here exactly once; a second leave
    // for the same id would be a silent no-op anyway.
    room.leave(id).await;
    result
}

async fn read_participant_name<R>(reader: &mut R) -> Result<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let line = match read_line(reader).await? {
        Some(line) => line,
        None => anyhow::bail!("connection closed before a name was sent"),
    };

    let name = message::truncate_name(&line);
    if name.is_empty() {
        anyhow::bail!("empty participant name");
    }
    Ok(name.to_string())
}

async fn run_receive_loop(
    room: &Room,
    reader: &mut BufReader<OwnedReadHalf>,
    id: ParticipantId,
    name: &str,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        select! {
            incoming = read_line(reader) => {
                match incoming? {
                    Some(text) if text.is_empty() => continue,
                    Some(text) => {
                        debug!(%id, name, text, "relaying line");
                        room.broadcast(id, message::peer_message(name, &text)).await;
                    }
                    None => break,
                }
            }
            // Fires on the shutdown flag flipping and on the server side
            // of the channel going away; both mean stop reading.
            _ = shutdown.changed() => break,
        }
    }
    Ok(())
}
