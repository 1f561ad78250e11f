//! Minimal RESP2 encoding and reply parsing
//!
//! Only what the probe needs: multi-bulk command encoding and the scalar
//! reply types a server sends back for `AUTH` and `PING`.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Largest bulk reply accepted; probes never expect more than a few bytes
const MAX_BULK_LEN: usize = 64 * 1024;

/// A scalar RESP reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`, `+PONG`
    Simple(String),
    /// `-ERR ...`
    Error(String),
    /// `:42`
    Integer(i64),
    /// `$n` payload, `None` for the null bulk string
    Bulk(Option<Vec<u8>>),
}

/// Encode a command as a RESP array of bulk strings
pub fn encode_command(args: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + args.iter().map(|a| a.len() + 16).sum::<usize>());
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg);
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

fn protocol_error(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Read one reply. Malformed input is reported as `InvalidData`, a closed
/// connection as `UnexpectedEof`.
pub async fn read_reply<R>(reader: &mut R) -> io::Result<Reply>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by server"));
    }

    let line = line
        .strip_suffix("\r\n")
        .ok_or_else(|| protocol_error(format!("unterminated reply line: {:?}", line)))?;

    let (kind, body) = line.split_at(line.chars().next().map(|c| c.len_utf8()).unwrap_or(0));
    match kind {
        "+" => Ok(Reply::Simple(body.to_string())),
        "-" => Ok(Reply::Error(body.to_string())),
        ":" => body
            .parse()
            .map(Reply::Integer)
            .map_err(|_| protocol_error(format!("invalid integer reply: {:?}", body))),
        "$" => {
            let len: i64 = body
                .parse()
                .map_err(|_| protocol_error(format!("invalid bulk length: {:?}", body)))?;
            if len < 0 {
                return Ok(Reply::Bulk(None));
            }
            let len = len as usize;
            if len > MAX_BULK_LEN {
                return Err(protocol_error(format!("bulk reply of {} bytes exceeds limit", len)));
            }

            let mut payload = vec![0u8; len + 2];
            reader.read_exact(&mut payload).await?;
            if &payload[len..] != b"\r\n" {
                return Err(protocol_error("bulk reply missing terminator".to_string()));
            }
            payload.truncate(len);
            Ok(Reply::Bulk(Some(payload)))
        }
        _ => Err(protocol_error(format!("unsupported reply: {:?}", line))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn parse(input: &[u8]) -> io::Result<Reply> {
        let mut reader = BufReader::new(input);
        read_reply(&mut reader).await
    }

    #[test]
    fn test_encode_ping() {
        assert_eq!(encode_command(&[b"PING"]), b"*1\r\n$4\r\nPING\r\n".to_vec());
    }

    #[test]
    fn test_encode_auth() {
        assert_eq!(
            encode_command(&[b"AUTH", b"s3cret"]),
            b"*2\r\n$4\r\nAUTH\r\n$6\r\ns3cret\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_simple_and_error_replies() {
        assert_eq!(parse(b"+PONG\r\n").await.unwrap(), Reply::Simple("PONG".into()));
        assert_eq!(
            parse(b"-NOAUTH Authentication required.\r\n").await.unwrap(),
            Reply::Error("NOAUTH Authentication required.".into())
        );
        assert_eq!(parse(b":12\r\n").await.unwrap(), Reply::Integer(12));
    }

    #[tokio::test]
    async fn test_bulk_replies() {
        assert_eq!(parse(b"$4\r\nPONG\r\n").await.unwrap(), Reply::Bulk(Some(b"PONG".to_vec())));
        assert_eq!(parse(b"$-1\r\n").await.unwrap(), Reply::Bulk(None));
        assert_eq!(parse(b"$0\r\n\r\n").await.unwrap(), Reply::Bulk(Some(Vec::new())));
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let err = parse(b"").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_malformed_replies() {
        for input in [&b"?what\r\n"[..], b"+PONG\n", b":abc\r\n", b"$4\r\nPONGxx"] {
            let err = parse(input).await.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData, "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_truncated_bulk() {
        let err = parse(b"$10\r\nPONG").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
