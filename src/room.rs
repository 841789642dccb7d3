use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::{io::AsyncWrite, sync::Mutex};
use tracing::{info, warn};

use crate::{
    history::HistoryLog,
    message,
    registry::{ConnectionRegistry, Participant, ParticipantId},
};

/// Shared chat-room state: the connection registry and the broadcast
/// history behind a single lock.
///
/// Every state-changing event (join, leave, relayed line) appends to the
/// history and fans out to its recipients while the lock is held, so all
/// participants observe one global order identical to the history order,
/// and a replay handed to a joiner is never missing a line and never
/// contains half of one. Receive loops block on their sockets outside the
/// lock and only take it for the duration of one event.
pub struct Room {
    state: Mutex<RoomState>,
    next_id: AtomicU64,
}

struct RoomState {
    registry: ConnectionRegistry,
    history: HistoryLog,
}

impl Room {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RoomState {
                registry: ConnectionRegistry::new(),
                history: HistoryLog::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new participant: replays the history as it stood before
    /// this join in one shot, then announces the arrival to everyone else.
    /// The joiner is excluded from its own notice, so the replay plus
    /// subsequent traffic contains no duplicates.
    pub async fn join(
        &self,
        name: impl Into<String>,
        addr: SocketAddr,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> ParticipantId {
        let name = name.into();
        let id = ParticipantId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut participant = Participant::new(id, name.clone(), addr, writer);

        let mut state = self.state.lock().await;
        if let Some(replay) = state.history.snapshot_joined() {
            if let Err(error) = participant.send_line(&replay).await {
                warn!(%id, name, peer = %addr, ?error, "failed to replay history");
            }
        }
        state.registry.add(participant);
        state.deliver(id, message::join_notice(&name)).await;
        id
    }

    /// Appends the line to the history and writes it to every registered
    /// participant except the sender.
    pub async fn broadcast(&self, sender: ParticipantId, line: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.deliver(sender, line.into()).await;
    }

    /// Removes the participant, closes its transport, and announces the
    /// departure. Calling this again for an id that already left is a
    /// no-op.
    pub async fn leave(&self, id: ParticipantId) {
        let mut state = self.state.lock().await;
        let Some(participant) = state.registry.remove(id) else {
            return;
        };

        info!(%id, name = participant.name(), peer = %participant.addr(), "participant left");
        let notice = message::leave_notice(participant.name());
        drop(participant);
        state.deliver(id, notice).await;
    }

    /// Cloned view of the history, oldest line first.
    pub async fn history(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.history.lines().to_vec()
    }

    pub async fn participant_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomState {
    /// Appends one line and fans it out. A failed write to one recipient is
    /// logged and skipped: delivery to the rest continues and the failing
    /// recipient stays registered until its own receive loop notices the
    /// broken transport.
    async fn deliver(&mut self, sender: ParticipantId, line: String) {
        self.history.append(line.clone());
        for recipient in self.registry.iter_mut() {
            if recipient.id() == sender {
                continue;
            }
            if let Err(error) = recipient.send_line(&line).await {
                warn!(
                    recipient = %recipient.id(),
                    name = recipient.name(),
                    ?error,
                    "failed to deliver line"
                );
            }
        }
    }
}
