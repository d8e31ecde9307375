use std::io::{Read, Write};
use std::net::TcpStream;

use eau2_errors::NetError;

use crate::MAX_FRAME_BYTES;

/// Opens a blocking connection to `host:port`.
pub fn connect(host: &str, port: u16) -> Result<TcpStream, NetError> {
    Ok(TcpStream::connect((host, port))?)
}

/// Writes `payload` as one frame: an 8-byte native-endian length prefix followed by the bytes.
pub fn send_framed(stream: &mut TcpStream, payload: &[u8]) -> Result<(), NetError> {
    if payload.len() > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge(payload.len()));
    }
    stream.write_all(&(payload.len() as u64).to_ne_bytes())?;
    stream.write_all(payload)?;
    stream.flush()?;
    Ok(())
}

/// Reads one length-prefixed frame, looping until every expected byte has arrived. An early EOF
/// is a `ShortRead`, not a silent empty frame.
pub fn recv_framed(stream: &mut TcpStream) -> Result<Vec<u8>, NetError> {
    let mut len_buf = [0u8; 8];
    read_exact_or_short(stream, &mut len_buf)?;
    let len = u64::from_ne_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    read_exact_or_short(stream, &mut payload)?;
    Ok(payload)
}

fn read_exact_or_short(stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), NetError> {
    let mut got = 0;
    while got < buf.len() {
        let n = stream.read(&mut buf[got..])?;
        if n == 0 {
            return Err(NetError::ShortRead {
                expected: buf.len(),
                got,
            });
        }
        got += n;
    }
    Ok(())
}

/// Opens a fresh connection, sends one frame, reads the single reply frame, and closes.
/// Used for one-shot requests (PUT/GET to a remote node, REGISTER to the coordinator) where
/// keeping the connection open isn't worth the bookkeeping.
pub fn request(host: &str, port: u16, payload: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut stream = connect(host, port)?;
    send_framed(&mut stream, payload)?;
    recv_framed(&mut stream)
}
