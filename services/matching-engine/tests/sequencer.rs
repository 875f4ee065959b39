//! Single-writer sequencing through `BookHandle`

use std::str::FromStr;

use matching_engine::sequencer::{self, BookHandle};
use matching_engine::{CancelOutcome, OrderBook, SequencerError, SubmitResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use types::errors::ValidationError;
use types::ids::{OrderId, Pair};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

fn pair() -> Pair {
    Pair::new("BTC/USDT")
}

fn limit(id: &str, side: Side, price: u64, amount: &str, timestamp: i64) -> Order {
    Order::limit(
        OrderId::new(id),
        pair(),
        side,
        Price::from_u64(price),
        Quantity::from_str(amount).unwrap(),
        timestamp,
    )
}

fn start() -> (
    BookHandle,
    JoinHandle<OrderBook>,
    mpsc::UnboundedReceiver<Trade>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (handle, task) = sequencer::spawn(OrderBook::new(pair()), 16, tx);
    (handle, task, rx)
}

#[tokio::test]
async fn test_submit_publishes_trades() {
    let (handle, task, mut trades) = start();

    let rested = handle.submit(limit("a1", Side::Sell, 100, "2", 1)).await.unwrap();
    assert_eq!(
        rested,
        SubmitResult::Resting {
            remaining: Quantity::from_u64(2)
        }
    );

    let result = handle.submit(limit("b1", Side::Buy, 100, "1", 2)).await.unwrap();
    assert_eq!(result.trades().len(), 1);

    let published = trades.recv().await.unwrap();
    assert_eq!(&published, &result.trades()[0]);
    assert_eq!(published.maker_order_id, OrderId::new("a1"));

    drop(handle);
    let book = task.await.unwrap();
    assert_eq!(book.len(), 1);
    book.check_invariants().unwrap();
}

#[tokio::test]
async fn test_duplicate_resting_id_rejected() {
    let (handle, _task, _trades) = start();

    handle.submit(limit("a1", Side::Sell, 100, "1", 1)).await.unwrap();
    let err = handle
        .submit(limit("a1", Side::Sell, 101, "1", 2))
        .await
        .unwrap_err();
    assert_eq!(err, SequencerError::DuplicateOrder(OrderId::new("a1")));

    let snapshot = handle.snapshot(5).await.unwrap();
    assert_eq!(snapshot.resting_orders, 1);
    assert_eq!(snapshot.asks, vec![(Price::from_u64(100), Quantity::from_u64(1))]);
}

#[tokio::test]
async fn test_foreign_pair_rejected_before_book() {
    let (handle, _task, _trades) = start();

    let mut order = limit("e1", Side::Buy, 100, "1", 1);
    order.pair = Pair::new("ETH/USDT");

    let err = handle.submit(order).await.unwrap_err();
    assert!(matches!(
        err,
        SequencerError::Rejected(ValidationError::UnknownPair { .. })
    ));
    assert_eq!(handle.snapshot(5).await.unwrap().resting_orders, 0);
}

#[tokio::test]
async fn test_out_of_bounds_amount_rejected_before_book() {
    let (handle, task, mut trades) = start();
    handle.submit(limit("a1", Side::Sell, 100, "1", 1)).await.unwrap();

    let err = handle
        .submit(limit("zero", Side::Buy, 100, "0", 2))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SequencerError::Rejected(ValidationError::NonPositiveAmount("0".to_string()))
    );

    let err = handle
        .submit(limit("huge", Side::Buy, 100, "50000000000000000000000000000", 3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SequencerError::Rejected(ValidationError::AmountTooLarge { .. })
    ));

    // Book still alive and unchanged
    let snapshot = handle.snapshot(5).await.unwrap();
    assert_eq!(snapshot.asks, vec![(Price::from_u64(100), Quantity::from_u64(1))]);
    assert!(trades.try_recv().is_err());

    drop(handle);
    task.await.unwrap().check_invariants().unwrap();
}

#[tokio::test]
async fn test_cancel_outcomes() {
    let (handle, _task, _trades) = start();
    handle.submit(limit("b1", Side::Buy, 99, "3", 1)).await.unwrap();

    assert_eq!(
        handle.cancel(OrderId::new("b1")).await.unwrap(),
        CancelOutcome::Canceled {
            order_id: OrderId::new("b1"),
            remaining: Quantity::from_u64(3),
        }
    );
    assert_eq!(
        handle.cancel(OrderId::new("b1")).await.unwrap(),
        CancelOutcome::NotFound {
            order_id: OrderId::new("b1")
        }
    );
}

#[tokio::test]
async fn test_concurrent_producers_are_serialized() {
    let (handle, task, mut trades) = start();

    let mut producers = Vec::new();
    for p in 0..4 {
        let handle = handle.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..25 {
                let n = p * 25 + i;
                let side = if n % 2 == 0 { Side::Buy } else { Side::Sell };
                let order = limit(&format!("o-{n}"), side, 100, "1", n as i64 + 1);
                handle.submit(order).await.unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }
    drop(handle);

    let book = task.await.unwrap();
    book.check_invariants().unwrap();

    let mut sequences = Vec::new();
    while let Ok(trade) = trades.try_recv() {
        sequences.push(trade.sequence);
    }
    // 50 buys against 50 sells at one price: everything trades
    assert_eq!(sequences.len(), 50);
    assert!(sequences.windows(2).all(|w| w[1] == w[0] + 1));
    assert!(book.is_empty());
}

#[tokio::test]
async fn test_dropped_trade_receiver_does_not_stop_matching() {
    let (handle, task, trades) = start();
    drop(trades);

    handle.submit(limit("a1", Side::Sell, 100, "1", 1)).await.unwrap();
    let result = handle.submit(limit("b1", Side::Buy, 100, "1", 2)).await.unwrap();
    assert!(matches!(result, SubmitResult::Filled { .. }));

    drop(handle);
    assert!(task.await.unwrap().is_empty());
}

#[tokio::test]
async fn test_handle_reports_stopped_book() {
    let (handle, task, _trades) = start();
    task.abort();
    let _ = task.await;

    let err = handle.snapshot(1).await.unwrap_err();
    assert_eq!(err, SequencerError::Stopped(pair()));
}
