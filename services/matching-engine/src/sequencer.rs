//! Single-writer sequencing for one instrument
//!
//! One tokio task owns the `OrderBook`. Every mutation arrives as a command
//! on a bounded channel and is applied in receive order, one at a time, so
//! the book needs no locks. Producers hold cloneable `BookHandle`s and never
//! touch book state directly.
//!
//! ```text
//!  Intake ─┐
//!  Intake ─┼─► mpsc ─► BookWorker (owns OrderBook) ─► trade sink (unbounded)
//!  Intake ─┘                 │
//!                            └─► oneshot replies
//! ```
//!
//! If the book hits a fatal invariant violation it panics, the task ends and
//! every handle starts returning `SequencerError::Stopped`.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::errors::ValidationError;
use types::ids::{OrderId, Pair};
use types::order::Order;
use types::trade::Trade;

use crate::events::CancelOutcome;
use crate::order_book::{BookSnapshot, OrderBook, SubmitResult};

/// Errors returned to producers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("sequencer for {0} has stopped")]
    Stopped(Pair),

    #[error("order rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("order {0} is already resting")]
    DuplicateOrder(OrderId),
}

enum BookCommand {
    Submit {
        order: Order,
        reply: oneshot::Sender<Result<SubmitResult, SequencerError>>,
    },
    Cancel {
        id: OrderId,
        reply: oneshot::Sender<CancelOutcome>,
    },
    Snapshot {
        depth: usize,
        reply: oneshot::Sender<BookSnapshot>,
    },
}

/// Producer side of a book's command stream
#[derive(Debug, Clone)]
pub struct BookHandle {
    pair: Pair,
    commands: mpsc::Sender<BookCommand>,
}

impl std::fmt::Debug for BookCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookCommand::Submit { order, .. } => write!(f, "Submit({})", order.id),
            BookCommand::Cancel { id, .. } => write!(f, "Cancel({})", id),
            BookCommand::Snapshot { depth, .. } => write!(f, "Snapshot({})", depth),
        }
    }
}

/// Start the owning task for `book`
///
/// `capacity` bounds the command queue. Trades are pushed to `trades`
/// without waiting. The join handle yields the book once every handle has
/// been dropped.
pub fn spawn(
    book: OrderBook,
    capacity: usize,
    trades: mpsc::UnboundedSender<Trade>,
) -> (BookHandle, JoinHandle<OrderBook>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let pair = book.pair().clone();
    let worker = BookWorker {
        book,
        commands: rx,
        trades,
        sink_closed: false,
    };

    let join = tokio::spawn(worker.run());
    (BookHandle { pair, commands: tx }, join)
}

impl BookHandle {
    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Submit a validated order and wait for its matching result
    ///
    /// Orders for another pair, or outside the amount and price bounds, are
    /// rejected here and never reach the book.
    pub async fn submit(&self, order: Order) -> Result<SubmitResult, SequencerError> {
        if order.pair != self.pair {
            return Err(ValidationError::UnknownPair {
                expected: self.pair.to_string(),
                actual: order.pair.to_string(),
            }
            .into());
        }
        order.check_bounds()?;

        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::Submit { order, reply }).await?;
        rx.await.map_err(|_| self.stopped())?
    }

    /// Cancel a resting order by id
    pub async fn cancel(&self, id: OrderId) -> Result<CancelOutcome, SequencerError> {
        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::Cancel { id, reply }).await?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Aggregated depth, consistent with every command sent before it
    pub async fn snapshot(&self, depth: usize) -> Result<BookSnapshot, SequencerError> {
        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::Snapshot { depth, reply }).await?;
        rx.await.map_err(|_| self.stopped())
    }

    async fn send(&self, command: BookCommand) -> Result<(), SequencerError> {
        self.commands.send(command).await.map_err(|_| self.stopped())
    }

    fn stopped(&self) -> SequencerError {
        SequencerError::Stopped(self.pair.clone())
    }
}

struct BookWorker {
    book: OrderBook,
    commands: mpsc::Receiver<BookCommand>,
    trades: mpsc::UnboundedSender<Trade>,
    sink_closed: bool,
}

impl BookWorker {
    async fn run(mut self) -> OrderBook {
        info!(pair = %self.book.pair(), "sequencer started");

        while let Some(command) = self.commands.recv().await {
            debug!(?command, "applying command");
            self.apply(command);
        }

        info!(
            pair = %self.book.pair(),
            resting = self.book.len(),
            "sequencer stopped"
        );
        self.book
    }

    fn apply(&mut self, command: BookCommand) {
        match command {
            BookCommand::Submit { order, reply } => {
                let result = self.submit(order);
                // Producer may have given up waiting; the book state stands
                let _ = reply.send(result);
            }
            BookCommand::Cancel { id, reply } => {
                let outcome = match self.book.cancel_order(&id) {
                    Some(order) => CancelOutcome::Canceled {
                        order_id: id,
                        remaining: order.remaining,
                    },
                    None => CancelOutcome::NotFound { order_id: id },
                };
                let _ = reply.send(outcome);
            }
            BookCommand::Snapshot { depth, reply } => {
                let _ = reply.send(self.book.snapshot(depth));
            }
        }
    }

    fn submit(&mut self, order: Order) -> Result<SubmitResult, SequencerError> {
        if self.book.contains(&order.id) {
            warn!(order_id = %order.id, "duplicate order id rejected");
            return Err(SequencerError::DuplicateOrder(order.id));
        }

        let order_id = order.id.clone();
        let result = self.book.process_order(order);
        debug!(
            order_id = %order_id,
            trades = result.trades().len(),
            remaining = %result.remaining(),
            resting = result.is_resting(),
            "order processed"
        );

        self.publish(result.trades());
        Ok(result)
    }

    /// Hand trades to the downstream sink without blocking
    fn publish(&mut self, trades: &[Trade]) {
        for trade in trades {
            if self.trades.send(trade.clone()).is_err() && !self.sink_closed {
                self.sink_closed = true;
                warn!(pair = %self.book.pair(), "trade sink closed, trades are no longer published");
            }
        }
    }
}
