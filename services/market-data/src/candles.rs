//! OHLCV Candle Aggregation
//!
//! Folds the engine's trade stream into OHLCV (Open, High, Low, Close,
//! Volume) candles for one timeframe, keyed by pair and bucket start.
//!
//! Delivery from the engine is at-least-once, so the aggregator remembers a
//! bounded window of recent fills and ignores replays. A fill is identified
//! by its pair and the per-book trade sequence, which the engine never
//! reuses. Order ids may repeat once an order has left the book.
//!
//! Open and close follow trade time rather than arrival order, so a late
//! trade inside a bucket never overwrites a newer close.

use std::collections::{BTreeMap, HashSet, VecDeque};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::ids::Pair;
use types::trade::Trade;

/// Supported candle timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute
    M1,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 1 hour
    H1,
    /// 1 day
    D1,
}

impl Timeframe {
    /// Duration of this timeframe in nanoseconds.
    pub fn duration_nanos(&self) -> i64 {
        match self {
            Timeframe::M1 => 60 * 1_000_000_000,
            Timeframe::M5 => 5 * 60 * 1_000_000_000,
            Timeframe::M15 => 15 * 60 * 1_000_000_000,
            Timeframe::H1 => 3600 * 1_000_000_000,
            Timeframe::D1 => 86400 * 1_000_000_000_i64,
        }
    }

    /// Align a timestamp to this timeframe's boundary (floor).
    ///
    /// Pre-epoch timestamps floor towards negative infinity.
    pub fn align_to_boundary(&self, timestamp_nanos: i64) -> i64 {
        let duration = self.duration_nanos();
        timestamp_nanos.div_euclid(duration) * duration
    }
}

/// A single OHLCV candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub pair: Pair,
    pub timeframe: Timeframe,
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trade_count: u64,
}

impl Candle {
    fn from_trade(trade: &Trade, timeframe: Timeframe) -> Self {
        let open_time = timeframe.align_to_boundary(trade.timestamp);
        let price = trade.price.as_decimal();
        Self {
            pair: trade.pair.clone(),
            timeframe,
            open_time,
            close_time: open_time + timeframe.duration_nanos() - 1,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: trade.amount.as_decimal(),
            trade_count: 1,
        }
    }

    /// Validate candle integrity (OHLCV invariants).
    pub fn is_valid(&self) -> bool {
        self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= Decimal::ZERO
            && self.close_time > self.open_time
    }
}

/// Outcome of feeding one trade to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleUpdate {
    /// Trade folded into the candle starting at `open_time`
    Applied { open_time: i64 },
    /// Replay of a fill already seen; nothing changed
    Duplicate,
}

/// Trade-time ordering key: timestamp, then per-book trade sequence
type TradeKey = (i64, u64);

/// Replay identity of a fill: pair and per-book trade sequence
type FillKey = (Pair, u64);

#[derive(Debug, Clone)]
struct Bucket {
    candle: Candle,
    first: TradeKey,
    last: TradeKey,
}

impl Bucket {
    fn new(trade: &Trade, timeframe: Timeframe) -> Self {
        let key = (trade.timestamp, trade.sequence);
        Self {
            candle: Candle::from_trade(trade, timeframe),
            first: key,
            last: key,
        }
    }

    fn update(&mut self, trade: &Trade) {
        let key = (trade.timestamp, trade.sequence);
        let price = trade.price.as_decimal();
        let candle = &mut self.candle;

        if price > candle.high {
            candle.high = price;
        }
        if price < candle.low {
            candle.low = price;
        }
        if key < self.first {
            self.first = key;
            candle.open = price;
        }
        if key >= self.last {
            self.last = key;
            candle.close = price;
        }
        candle.volume += trade.amount.as_decimal();
        candle.trade_count += 1;
    }
}

/// Builds candles for a single timeframe across any number of pairs.
pub struct CandleAggregator {
    timeframe: Timeframe,
    /// Candles keyed by (pair, open_time); BTreeMap keeps them chronological.
    buckets: BTreeMap<(Pair, i64), Bucket>,
    /// Recently applied fills, oldest first.
    recent: VecDeque<FillKey>,
    seen: HashSet<FillKey>,
    dedup_window: usize,
    trades_applied: u64,
    duplicates_dropped: u64,
}

impl CandleAggregator {
    pub fn new(timeframe: Timeframe, dedup_window: usize) -> Self {
        info!(?timeframe, dedup_window, "CandleAggregator initialized");
        Self {
            timeframe,
            buckets: BTreeMap::new(),
            recent: VecDeque::with_capacity(dedup_window),
            seen: HashSet::with_capacity(dedup_window),
            dedup_window,
            trades_applied: 0,
            duplicates_dropped: 0,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Fold a trade into its candle, ignoring replays inside the window.
    pub fn apply(&mut self, trade: &Trade) -> CandleUpdate {
        let fill = (trade.pair.clone(), trade.sequence);
        if self.seen.contains(&fill) {
            self.duplicates_dropped += 1;
            debug!(
                pair = %trade.pair,
                sequence = trade.sequence,
                "Dropping duplicate trade"
            );
            return CandleUpdate::Duplicate;
        }
        self.remember(fill);

        let timeframe = self.timeframe;
        let open_time = timeframe.align_to_boundary(trade.timestamp);
        self.buckets
            .entry((trade.pair.clone(), open_time))
            .and_modify(|bucket| bucket.update(trade))
            .or_insert_with(|| Bucket::new(trade, timeframe));
        self.trades_applied += 1;

        CandleUpdate::Applied { open_time }
    }

    /// Candle for `pair` whose bucket starts at `open_time`
    pub fn candle(&self, pair: &Pair, open_time: i64) -> Option<&Candle> {
        self.buckets
            .get(&(pair.clone(), open_time))
            .map(|bucket| &bucket.candle)
    }

    /// All candles for `pair`, oldest first
    pub fn candles(&self, pair: &Pair) -> Vec<&Candle> {
        self.buckets
            .range((pair.clone(), i64::MIN)..=(pair.clone(), i64::MAX))
            .map(|(_, bucket)| &bucket.candle)
            .collect()
    }

    /// Number of candles held, across all pairs
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn trades_applied(&self) -> u64 {
        self.trades_applied
    }

    pub fn duplicates_dropped(&self) -> u64 {
        self.duplicates_dropped
    }

    fn remember(&mut self, fill: FillKey) {
        if self.dedup_window == 0 {
            return;
        }
        if self.recent.len() >= self.dedup_window {
            if let Some(oldest) = self.recent.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(fill.clone());
        self.recent.push_back(fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use types::ids::OrderId;
    use types::numeric::{Price, Quantity};

    fn nanos(minutes: i64) -> i64 {
        minutes * 60 * 1_000_000_000
    }

    fn trade(seq: u64, price: u64, amount: &str, timestamp: i64) -> Trade {
        Trade {
            sequence: seq,
            maker_order_id: OrderId::new(format!("m-{seq}")),
            taker_order_id: OrderId::new(format!("t-{seq}")),
            price: Price::from_u64(price),
            amount: Quantity::from_str(amount).unwrap(),
            pair: Pair::new("BTC/USDT"),
            timestamp,
        }
    }

    fn btc() -> Pair {
        Pair::new("BTC/USDT")
    }

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::M1.duration_nanos(), 60_000_000_000);
        assert_eq!(Timeframe::H1.duration_nanos(), 3_600_000_000_000);
        assert_eq!(Timeframe::D1.duration_nanos(), 86_400_000_000_000);
    }

    #[test]
    fn test_timeframe_alignment() {
        let ts = nanos(5) + 30_000_000_000; // 5m30s
        assert_eq!(Timeframe::M1.align_to_boundary(ts), nanos(5));
        assert_eq!(Timeframe::M5.align_to_boundary(ts), nanos(5));
        assert_eq!(Timeframe::M15.align_to_boundary(ts), nanos(0));
        assert_eq!(Timeframe::M1.align_to_boundary(-1), -nanos(1));
    }

    #[test]
    fn test_ohlcv_within_bucket() {
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        agg.apply(&trade(1, 50000, "1", nanos(0) + 1));
        agg.apply(&trade(2, 51000, "2", nanos(0) + 2)); // New high
        agg.apply(&trade(3, 49000, "3", nanos(0) + 3)); // New low
        agg.apply(&trade(4, 50500, "1", nanos(0) + 4)); // Close

        let candle = agg.candle(&btc(), nanos(0)).unwrap();
        assert_eq!(candle.open, Decimal::from(50000));
        assert_eq!(candle.high, Decimal::from(51000));
        assert_eq!(candle.low, Decimal::from(49000));
        assert_eq!(candle.close, Decimal::from(50500));
        assert_eq!(candle.volume, Decimal::from(7));
        assert_eq!(candle.trade_count, 4);
        assert_eq!(candle.close_time, nanos(1) - 1);
        assert!(candle.is_valid());
    }

    #[test]
    fn test_boundary_starts_new_candle() {
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        assert_eq!(
            agg.apply(&trade(1, 50000, "1", nanos(0) + 10)),
            CandleUpdate::Applied { open_time: nanos(0) }
        );
        assert_eq!(
            agg.apply(&trade(2, 51000, "2", nanos(1) + 5)),
            CandleUpdate::Applied { open_time: nanos(1) }
        );

        let candles = agg.candles(&btc());
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, Decimal::from(50000));
        assert_eq!(candles[1].open, Decimal::from(51000));
    }

    #[test]
    fn test_duplicate_trade_ignored() {
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        let t = trade(1, 50000, "1.5", nanos(0));

        assert!(matches!(agg.apply(&t), CandleUpdate::Applied { .. }));
        assert_eq!(agg.apply(&t), CandleUpdate::Duplicate);

        let candle = agg.candle(&btc(), nanos(0)).unwrap();
        assert_eq!(candle.volume, Decimal::from_str("1.5").unwrap());
        assert_eq!(candle.trade_count, 1);
        assert_eq!(agg.duplicates_dropped(), 1);
        assert_eq!(agg.trades_applied(), 1);
    }

    #[test]
    fn test_reused_ids_are_distinct_fills() {
        // Same maker and taker ids trading twice after both were freed
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        let mut first = trade(1, 100, "1", nanos(0));
        first.maker_order_id = OrderId::new("a");
        first.taker_order_id = OrderId::new("b");
        let mut second = first.clone();
        second.sequence = 2;
        second.timestamp += 1;

        assert!(matches!(agg.apply(&first), CandleUpdate::Applied { .. }));
        assert!(matches!(agg.apply(&second), CandleUpdate::Applied { .. }));

        let candle = agg.candle(&btc(), nanos(0)).unwrap();
        assert_eq!(candle.volume, Decimal::from(2));
        assert_eq!(candle.trade_count, 2);
        assert_eq!(agg.duplicates_dropped(), 0);
    }

    #[test]
    fn test_same_sequence_on_other_pair_is_not_a_replay() {
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        let btc_fill = trade(1, 100, "1", nanos(0));
        let mut eth_fill = btc_fill.clone();
        eth_fill.pair = Pair::new("ETH/USDT");

        agg.apply(&btc_fill);
        assert!(matches!(agg.apply(&eth_fill), CandleUpdate::Applied { .. }));
        assert_eq!(agg.trades_applied(), 2);
    }

    #[test]
    fn test_dedup_window_is_bounded() {
        let mut agg = CandleAggregator::new(Timeframe::M1, 2);
        let first = trade(1, 100, "1", nanos(0));
        agg.apply(&first);
        agg.apply(&trade(2, 100, "1", nanos(0)));
        agg.apply(&trade(3, 100, "1", nanos(0)));

        // Evicted from the window, so it counts again
        assert!(matches!(agg.apply(&first), CandleUpdate::Applied { .. }));
    }

    #[test]
    fn test_late_trade_does_not_overwrite_close() {
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        agg.apply(&trade(2, 200, "1", nanos(0) + 20));
        agg.apply(&trade(1, 100, "1", nanos(0) + 10)); // arrives late

        let candle = agg.candle(&btc(), nanos(0)).unwrap();
        assert_eq!(candle.open, Decimal::from(100));
        assert_eq!(candle.close, Decimal::from(200));
        assert!(candle.is_valid());
    }

    #[test]
    fn test_same_timestamp_ordered_by_sequence() {
        // One taker sweeping two makers: both fills share its timestamp
        let mut agg = CandleAggregator::new(Timeframe::M1, 100);
        agg.apply(&trade(1, 100, "1", nanos(0)));
        agg.apply(&trade(2, 101, "1", nanos(0)));

        let candle = agg.candle(&btc(), nanos(0)).unwrap();
        assert_eq!(candle.open, Decimal::from(100));
        assert_eq!(candle.close, Decimal::from(101));
    }

    #[test]
    fn test_pairs_kept_apart() {
        let mut agg = CandleAggregator::new(Timeframe::M5, 100);
        agg.apply(&trade(1, 100, "1", nanos(0)));
        let mut eth = trade(2, 3000, "1", nanos(0));
        eth.pair = Pair::new("ETH/USDT");
        agg.apply(&eth);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.candles(&btc()).len(), 1);
        assert_eq!(agg.candles(&Pair::new("ETH/USDT"))[0].open, Decimal::from(3000));
        assert!(agg.candles(&Pair::new("SOL/USDT")).is_empty());
    }

    #[test]
    fn test_candle_integrity_validation() {
        let invalid = Candle {
            pair: btc(),
            timeframe: Timeframe::M1,
            open_time: nanos(0),
            close_time: nanos(1) - 1,
            open: Decimal::from(50000),
            high: Decimal::from(49000), // High < Open → invalid
            low: Decimal::from(48000),
            close: Decimal::from(49500),
            volume: Decimal::from(1),
            trade_count: 1,
        };
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_candle_serialization() {
        let candle = Candle::from_trade(&trade(1, 50000, "1", nanos(0)), Timeframe::M1);
        let json = serde_json::to_string(&candle).unwrap();
        let deserialized: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(candle, deserialized);
    }
}
