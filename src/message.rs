use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Longest display name accepted on the wire, in bytes.
pub const MAX_NAME_BYTES: usize = 16;

/// Wire form of a relayed chat line.
pub fn peer_message(name: &str, text: &str) -> String {
    format!("[{name}] {text}")
}

/// System notice announcing a new participant.
pub fn join_notice(name: &str) -> String {
    format!("[Server] {name} joined chat")
}

/// System notice announcing a departure.
pub fn leave_notice(name: &str) -> String {
    format!("[Server] {name} left the chat")
}

/// Caps a display name at [`MAX_NAME_BYTES`] without splitting a UTF-8
/// character.
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_BYTES {
        return name;
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Reads the next line, trimmed of surrounding whitespace. Returns
/// `Ok(None)` once the peer has closed the stream.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    // Simple line-oriented framing keeps interoperability with netcat-style tools.
    let mut line = String::new();
    let bytes = reader.read_line(&mut line).await?;
    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Writes one line, appending the newline delimiter and flushing so peers
/// get timely updates.
pub async fn write_line<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_chat_line() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut reader = tokio::io::BufReader::new(reader);
        let line = peer_message("alice", "hello");

        write_line(&mut writer, &line).await.expect("write line");
        let parsed = read_line(&mut reader)
            .await
            .expect("read line")
            .expect("expected line");

        assert_eq!(parsed, "[alice] hello");
    }

    #[tokio::test]
    async fn read_line_reports_end_of_stream() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(writer);
        let mut reader = tokio::io::BufReader::new(reader);

        let result = read_line(&mut reader).await.expect("read should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn read_line_trims_surrounding_whitespace() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut reader = tokio::io::BufReader::new(reader);

        writer
            .write_all(b"  hi there \r\n")
            .await
            .expect("write bytes");
        let parsed = read_line(&mut reader)
            .await
            .expect("read line")
            .expect("expected line");

        assert_eq!(parsed, "hi there");
    }

    #[test]
    fn notices_match_wire_format() {
        assert_eq!(join_notice("alice"), "[Server] alice joined chat");
        assert_eq!(leave_notice("alice"), "[Server] alice left the chat");
        assert_eq!(peer_message("alice", "hi"), "[alice] hi");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_name("docent"), "docent");
        assert_eq!(truncate_name("abcdefghijklmnopqrst"), "abcdefghijklmnop");
        // Nine two-byte characters: the 16-byte cap lands on a boundary.
        assert_eq!(truncate_name("ééééééééé"), "éééééééé");
        // A three-byte character straddling the cap is dropped whole.
        assert_eq!(truncate_name("aaaaaaaaaaaaaaa€"), "aaaaaaaaaaaaaaa");
    }
}
