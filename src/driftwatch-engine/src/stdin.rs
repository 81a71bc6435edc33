//! Cancellable operator input.
//!
//! `tokio::io::stdin` reads on the blocking pool, and runtime shutdown waits
//! for that read to finish. Lines are read on a detached thread instead and
//! handed over a channel, so dropping the reader never blocks exit.

use std::io::{self, BufRead};
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tracing::warn;

/// Async reader over byte chunks received from a channel.
///
/// The stream ends once every sender is dropped.
#[derive(Debug)]
pub struct ChannelReader {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            pos: 0,
        }
    }
}

impl AsyncRead for ChannelReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        while this.pos >= this.pending.len() {
            match ready!(this.rx.poll_recv(cx)) {
                Some(chunk) => {
                    this.pending = chunk;
                    this.pos = 0;
                }
                None => return Poll::Ready(Ok(())),
            }
        }
        let n = buf.remaining().min(this.pending.len() - this.pos);
        buf.put_slice(&this.pending[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

/// Start reading process stdin line by line on a background thread.
///
/// A read error or EOF ends the stream.
pub fn spawn_stdin_reader() -> ChannelReader {
    let (tx, rx) = mpsc::channel(1);
    let spawned = std::thread::Builder::new()
        .name("driftwatch-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            loop {
                let mut line = Vec::new();
                match input.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Unable to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Unable to start stdin reader: {}", e);
    }
    ChannelReader::new(rx)
}
