use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use eau2_errors::NetError;
use tracing::debug;

/// A bound TCP socket polled in short bursts so the owning thread can check a shutdown flag
/// between calls instead of blocking on `accept` forever.
pub struct Listener {
    inner: TcpListener,
    poll_interval: Duration,
}

impl Listener {
    /// Binds `host:port` and puts the socket in non-blocking mode so `accept_with_timeout` can
    /// poll it.
    pub fn bind(host: &str, port: u16) -> Result<Self, NetError> {
        let inner = TcpListener::bind((host, port))?;
        inner.set_nonblocking(true)?;
        Ok(Self {
            inner,
            poll_interval: Duration::from_millis(50),
        })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, NetError> {
        Ok(self.inner.local_addr()?)
    }

    /// Polls for an incoming connection for up to `timeout`, sleeping `poll_interval` between
    /// attempts. Returns `Ok(None)` on timeout so the caller can re-check its shutdown flag.
    pub fn accept_with_timeout(&self, timeout: Duration) -> Result<Option<TcpStream>, NetError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.inner.accept() {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "accepted connection");
                    stream.set_nonblocking(false)?;
                    return Ok(Some(stream));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    std::thread::sleep(self.poll_interval.min(deadline - Instant::now()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
