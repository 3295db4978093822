//! The two concurrent forwarding paths.
//!
//! Each path is a reader task and a writer task joined by an unbounded
//! channel of owned chunks: the reader copies every non-empty read out of
//! its scratch buffer and queues the copy; the writer drains the queue in
//! order. Writes never exert backpressure on reads -- queueing is bounded
//! only by memory, an accepted limitation of the design.
//!
//! Path A forwards stdin to the socket write half; path B forwards the
//! socket read half to stdout. The paths share nothing and interleave
//! arbitrarily relative to one another.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::buffer::{Direction, ReadBuffer};

/// Notification from a forwarding path to the shutdown coordinator.
#[derive(Debug)]
pub enum PathEvent {
    /// End-of-stream on the path's source; a normal shutdown trigger.
    Eof(Direction),
    /// A write to the path's sink failed. Unrecoverable: the relay tears
    /// down and the process exits with the call's error code.
    WriteFailed {
        direction: Direction,
        error: std::io::Error,
    },
}

/// Handles to every task spawned for the relay.
///
/// Owned by the shutdown coordinator, which stops and joins them during
/// teardown; a completed join is that handle's close confirmation.
pub struct RelayPaths {
    pub(crate) readers: Vec<JoinHandle<()>>,
    pub(crate) writers: Vec<JoinHandle<()>>,
    pub(crate) events_rx: mpsc::Receiver<PathEvent>,
}

/// Spawn both forwarding paths on an established connection.
///
/// Generic over the local streams so tests can substitute in-memory pipes
/// for real stdin/stdout.
pub fn spawn_paths<I, O>(
    stream: TcpStream,
    input: I,
    output: O,
    read_buffer_size: usize,
) -> RelayPaths
where
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    let (sock_rd, sock_wr) = stream.into_split();
    let (events_tx, events_rx) = mpsc::channel(4);
    let writer_events_tx = events_tx.clone();

    let (chunks_a_tx, chunks_a_rx) = mpsc::unbounded_channel();
    let (chunks_b_tx, chunks_b_rx) = mpsc::unbounded_channel();

    let readers = vec![
        tokio::spawn(pump_reads(
            input,
            ReadBuffer::new(Direction::StdinToSocket, read_buffer_size),
            chunks_a_tx,
            events_tx.clone(),
        )),
        tokio::spawn(pump_reads(
            sock_rd,
            ReadBuffer::new(Direction::SocketToStdout, read_buffer_size),
            chunks_b_tx,
            events_tx,
        )),
    ];
    let writers = vec![
        tokio::spawn(drain_writes(
            chunks_a_rx,
            sock_wr,
            Direction::StdinToSocket,
            writer_events_tx.clone(),
        )),
        tokio::spawn(drain_writes(
            chunks_b_rx,
            output,
            Direction::SocketToStdout,
            writer_events_tx,
        )),
    ];

    RelayPaths {
        readers,
        writers,
        events_rx,
    }
}

/// Read loop for one path: fill the scratch buffer, copy out, queue.
async fn pump_reads<R>(
    mut source: R,
    mut scratch: ReadBuffer,
    chunks: mpsc::UnboundedSender<Vec<u8>>,
    events: mpsc::Sender<PathEvent>,
) where
    R: AsyncRead + Unpin,
{
    let direction = scratch.direction();
    loop {
        match source.read(scratch.as_mut_slice()).await {
            Ok(0) => {
                debug!(direction = direction.label(), "End of stream");
                let _ = events.send(PathEvent::Eof(direction)).await;
                break;
            }
            Ok(n) => {
                trace!(direction = direction.label(), bytes = n, "Queueing chunk");
                if chunks.send(scratch.copy_out(n)).is_err() {
                    // Writer is gone; nothing left to forward to.
                    break;
                }
            }
            Err(e) => {
                // A mid-stream read error is not a shutdown trigger: the
                // path stops reading and the relay keeps running until a
                // signal or EOF on the other path.
                debug!(direction = direction.label(), error = %e, "Read failed, path stalled");
                break;
            }
        }
    }
}

/// Write loop for one path: drain queued chunks in read order, byte-exact.
///
/// Exits once the queue closes (reader gone), then shuts the sink down.
/// A failed write or flush is unrecoverable and is reported to the
/// coordinator, which tears the relay down with that error. Each chunk is
/// dropped when its write completes, releasing the in-flight write and its
/// payload together.
async fn drain_writes<W>(
    mut chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    mut sink: W,
    direction: Direction,
    events: mpsc::Sender<PathEvent>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = chunks.recv().await {
        let result = match sink.write_all(&chunk).await {
            Ok(()) => sink.flush().await,
            Err(e) => Err(e),
        };
        if let Err(error) = result {
            warn!(direction = direction.label(), error = %error, "Write failed");
            let _ = events
                .send(PathEvent::WriteFailed { direction, error })
                .await;
            break;
        }
    }
    if let Err(e) = sink.shutdown().await {
        debug!(direction = direction.label(), error = %e, "Sink close reported an error");
    }
}
