use std::{fmt, io, net::SocketAddr};

use tokio::io::AsyncWrite;

use crate::message;

/// Opaque per-connection identity. Registry removal and broadcast
/// self-exclusion key on this rather than the display name, so two
/// participants sharing a name cannot swallow each other's messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantId(u64);

impl ParticipantId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One connected, named chat session.
///
/// The read half of the connection stays with the session's receive loop;
/// the write half lives here so that fan-out writes are serialized by the
/// room lock. Dropping a participant closes its write half.
pub struct Participant {
    id: ParticipantId,
    name: String,
    addr: SocketAddr,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        name: String,
        addr: SocketAddr,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            id,
            name,
            addr,
            writer: Box::new(writer),
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        message::write_line(&mut self.writer, line).await
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered set of currently live participants.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    participants: Vec<Participant>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    /// Removes by connection identity. Returns `None` when the id is no
    /// longer present, which is what makes disconnect cleanup idempotent.
    pub fn remove(&mut self, id: ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id() == id)?;
        Some(self.participants.remove(index))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    fn test_addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn participant(raw_id: u64, name: &str) -> (Participant, tokio::io::DuplexStream) {
        let (writer, peer) = tokio::io::duplex(256);
        let participant = Participant::new(
            ParticipantId::new(raw_id),
            name.to_string(),
            test_addr(40000 + raw_id as u16),
            writer,
        );
        (participant, peer)
    }

    #[test]
    fn removal_is_by_identity_not_name() {
        let mut registry = ConnectionRegistry::new();
        let (first, _peer_one) = participant(1, "docent");
        let (second, _peer_two) = participant(2, "docent");
        registry.add(first);
        registry.add(second);

        let removed = registry
            .remove(ParticipantId::new(1))
            .expect("first docent should be removable");

        assert_eq!(removed.id(), ParticipantId::new(1));
        assert_eq!(registry.len(), 1);
        let survivor: Vec<_> = registry.iter_mut().map(|p| p.id()).collect();
        assert_eq!(survivor, [ParticipantId::new(2)]);
    }

    #[test]
    fn removing_twice_yields_nothing() {
        let mut registry = ConnectionRegistry::new();
        let (p, _peer) = participant(7, "alice");
        registry.add(p);

        assert!(registry.remove(ParticipantId::new(7)).is_some());
        assert!(registry.remove(ParticipantId::new(7)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut registry = ConnectionRegistry::new();
        let mut peers = Vec::new();
        for (raw_id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
            let (p, peer) = participant(raw_id, name);
            peers.push(peer);
            registry.add(p);
        }

        let names: Vec<_> = registry.iter_mut().map(|p| p.name().to_string()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn send_line_reaches_the_peer() {
        let (mut p, peer) = participant(4, "alice");
        p.send_line("[alice] hi").await.expect("send line");
        drop(p);

        let mut reader = BufReader::new(peer);
        let mut received = String::new();
        reader
            .read_to_string(&mut received)
            .await
            .expect("read peer bytes");
        assert_eq!(received, "[alice] hi\n");
    }
}
