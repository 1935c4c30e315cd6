use anyhow::{Context, Result};
use log::{info, warn};
use nfq::{Message, Queue, Verdict};
use std::io::{self, ErrorKind};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::allowset::AllowSet;
use crate::handler::{PacketHandler, Stats};

/// Sleep between polls of an empty queue. The kernel holds every queued
/// response until its verdict, so this bounds the latency added to a lookup
/// arriving on an idle queue.
pub(super) const NFQUEUE_IDLE_SLEEP_MS: u64 = 2;

/// The part of a netfilter queue the receive loop talks to.
pub(super) trait VerdictQueue {
    type Message;

    /// Next queued packet; `WouldBlock` when the queue is empty.
    fn recv(&mut self) -> io::Result<Self::Message>;
    fn payload(message: &Self::Message) -> &[u8];
    fn accept(&mut self, message: Self::Message) -> io::Result<()>;
}

impl VerdictQueue for Queue {
    type Message = Message;

    fn recv(&mut self) -> io::Result<Message> {
        Queue::recv(self)
    }

    fn payload(message: &Message) -> &[u8] {
        message.get_payload()
    }

    fn accept(&mut self, mut message: Message) -> io::Result<()> {
        message.set_verdict(Verdict::Accept);
        self.verdict(message)
    }
}

pub(super) fn run(
    queue_num: u16,
    mut handler: PacketHandler,
    token: CancellationToken,
) -> Result<Stats> {
    let mut queue = Queue::open().context("Failed to open netfilter queue socket")?;
    queue
        .bind(queue_num)
        .with_context(|| format!("Failed to bind NFQUEUE {queue_num}"))?;
    queue.set_nonblocking(true);
    info!("NFQUEUE {queue_num} bound");

    serve(&mut queue, &mut handler, &token);

    if let Err(e) = queue.unbind(queue_num) {
        warn!("Failed to unbind NFQUEUE {queue_num}: {e}");
    }
    info!("NFQUEUE task terminated");
    Ok(handler.into_stats())
}

/// Handle and accept queued packets until `token` is cancelled.
pub(super) fn serve<Q: VerdictQueue, S: AllowSet>(
    queue: &mut Q,
    handler: &mut PacketHandler<S>,
    token: &CancellationToken,
) {
    while !token.is_cancelled() {
        let msg = match queue.recv() {
            Ok(msg) => msg,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(NFQUEUE_IDLE_SLEEP_MS));
                continue;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Error reading from NFQUEUE: {e}");
                continue;
            }
        };

        handler.handle(Q::payload(&msg));

        if let Err(e) = queue.accept(msg) {
            warn!("Failed to send verdict: {e}");
        }
    }
}
