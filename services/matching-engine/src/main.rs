//! Matching engine process
//!
//! Reads `OrderMessage` JSON lines on stdin, runs them through one book and
//! prints every trade as a JSON line on stdout. Logs go to stderr.
//!
//! ```text
//! echo '{"action":"new","order":{"pair":"BTC/USDT","side":"SELL","price":"100","amount":"1"}}' \
//!   | matching-engine
//! ```

use anyhow::Context;
use market_data::{CandleAggregator, Timeframe};
use matching_engine::events::{OrderAction, OrderMessage};
use matching_engine::{sequencer, EngineConfig, Intake, OrderBook, SequencerError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env().context("loading engine configuration")?;
    info!(
        pair = %config.pair,
        command_buffer = config.command_buffer,
        dedup_window = config.dedup_window,
        "starting matching engine"
    );

    let (trade_tx, mut trade_rx) = mpsc::unbounded_channel();
    let (handle, book_task) =
        sequencer::spawn(OrderBook::new(config.pair.clone()), config.command_buffer, trade_tx);

    let dedup_window = config.dedup_window;
    let publisher = tokio::spawn(async move {
        let mut candles = CandleAggregator::new(Timeframe::M1, dedup_window);
        while let Some(trade) = trade_rx.recv().await {
            match serde_json::to_string(&trade) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(error = %err, sequence = trade.sequence, "failed to encode trade"),
            }
            candles.apply(&trade);
        }
        candles
    });

    let mut intake = Intake::new(config.pair.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let message: OrderMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(err) => {
                warn!(line = line_no, error = %err, "malformed order message");
                continue;
            }
        };

        let outcome = match message.action {
            OrderAction::New => match intake.accept(message.order) {
                Ok(order) => handle.submit(order).await.map(|_| ()),
                Err(_) => continue,
            },
            OrderAction::Cancel => match intake.cancel_target(&message.order) {
                Ok(id) => handle.cancel(id).await.map(|outcome| {
                    info!(?outcome, "cancel processed");
                }),
                Err(err) => {
                    warn!(line = line_no, error = %err, "cancel rejected");
                    continue;
                }
            },
        };

        match outcome {
            Ok(()) => {}
            Err(err @ SequencerError::Stopped(_)) => return Err(err).context("order book stopped"),
            Err(err) => warn!(line = line_no, error = %err, "command rejected"),
        }
    }

    let snapshot = handle.snapshot(config.snapshot_depth).await?;
    drop(handle);

    let book = book_task.await.context("order book task panicked")?;
    let candles = publisher.await.context("trade publisher panicked")?;

    info!(
        pair = %book.pair(),
        resting = book.len(),
        bids = ?snapshot.bids,
        asks = ?snapshot.asks,
        trades = candles.trades_applied(),
        candles = candles.len(),
        "input exhausted"
    );
    for candle in candles.candles(book.pair()) {
        info!(
            open_time = candle.open_time,
            open = %candle.open,
            high = %candle.high,
            low = %candle.low,
            close = %candle.close,
            volume = %candle.volume,
            "candle"
        );
    }

    Ok(())
}
