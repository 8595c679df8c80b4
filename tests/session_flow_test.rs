//! End-to-end chart-session flows against a real sqlite-backed annotation
//! store and a recording chart surface.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use trendwatch::chart::engine::RenderError;
use trendwatch::chart::session::{
    ChartSession, ChartSurface, DrawEvent, SessionError, SessionIssue,
};
use trendwatch::external::bar_provider::{BarProvider, BarProviderError};
use trendwatch::models::{Anchor, Bar, InstrumentKind, WatchType};
use trendwatch::services::annotation_service::SqliteAnnotationStore;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct FixedProvider {
    bars: Vec<Bar>,
    fail: bool,
}

/// Serves the series once, then fails every later fetch.
struct FirstFetchOnlyProvider {
    bars: Vec<Bar>,
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl BarProvider for FirstFetchOnlyProvider {
    async fn fetch_daily_bars(&self, _symbol: &str) -> Result<Vec<Bar>, BarProviderError> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if call == 0 {
            Ok(self.bars.clone())
        } else {
            Err(BarProviderError::Network("connection refused".into()))
        }
    }
}

#[async_trait]
impl BarProvider for FixedProvider {
    async fn fetch_daily_bars(&self, _symbol: &str) -> Result<Vec<Bar>, BarProviderError> {
        if self.fail {
            return Err(BarProviderError::Network("connection refused".into()));
        }
        Ok(self.bars.clone())
    }
}

/// Remembers the last thing drawn on each layer so tests can assert on the
/// rendered output without a charting engine.
#[derive(Default)]
struct RecordingSurface {
    candles: Vec<Bar>,
    line_values: Vec<f64>,
    marker_prices: Vec<f64>,
    provisional: Option<Anchor>,
    window: Option<(i64, i64)>,
    window_sets: usize,
}

impl ChartSurface for RecordingSurface {
    fn set_candles(&mut self, bars: &[Bar]) {
        self.candles = bars.to_vec();
    }
    fn set_line(&mut self, plan: &trendwatch::chart::engine::LinePlan) {
        self.line_values = plan.line.iter().map(|p| p.value).collect();
    }
    fn clear_line(&mut self) {
        self.line_values.clear();
    }
    fn set_markers(&mut self, markers: &[trendwatch::chart::engine::MarkerPoint]) {
        self.marker_prices = markers.iter().map(|m| m.anchor.price).collect();
    }
    fn clear_markers(&mut self) {
        self.marker_prices.clear();
    }
    fn set_provisional_marker(&mut self, anchor: Option<Anchor>) {
        self.provisional = anchor;
    }
    fn visible_range(&self) -> Option<(i64, i64)> {
        self.window
    }
    fn set_visible_range(&mut self, range: (i64, i64)) {
        self.window = Some(range);
        self.window_sets += 1;
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn anchor(d: u32, price: f64) -> Anchor {
    Anchor { date: day(d), price }
}

fn january_bars(days: &[u32]) -> Vec<Bar> {
    days.iter().map(|&d| Bar::new(day(d), 10.0, 11.0, 9.0, 10.5)).collect()
}

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn session_with(
    bars: Vec<Bar>,
    fail: bool,
) -> (ChartSession, SqlitePool) {
    let pool = memory_pool().await;
    let provider = Arc::new(FixedProvider { bars: bars.clone(), fail });
    let session = ChartSession::new(
        "SZ000001",
        InstrumentKind::Stock,
        provider.clone(),
        Arc::new(FixedProvider { bars, fail }),
        Arc::new(SqliteAnnotationStore::new(pool.clone())),
    );
    (session, pool)
}

async fn draw_line(session: &mut ChartSession, surface: &mut RecordingSurface, a: Anchor, b: Anchor) {
    session.begin_drawing().unwrap();
    assert!(session.pointer_event(DrawEvent::Click(a), surface).await.is_none());
    assert!(session.pointer_event(DrawEvent::Click(b), surface).await.is_none());
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commit_persists_line_and_derives_watch_type() {
    let (mut session, pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();

    session.refresh(&mut surface).await.unwrap();
    assert_eq!(surface.candles.len(), 5);
    assert!(surface.line_values.is_empty());

    // Anchors at index 1 (price 100) and index 3 (price 200).
    draw_line(&mut session, &mut surface, anchor(2, 100.0), anchor(4, 200.0)).await;

    assert_eq!(surface.line_values, vec![50.0, 100.0, 150.0, 200.0, 250.0]);
    assert_eq!(surface.marker_prices, vec![100.0, 200.0]);
    assert_eq!(session.watch_type(), Some(WatchType::Tracking));
    assert_eq!(surface.provisional, None, "gesture markers cleared after commit");

    let row = trendwatch::db::annotation_queries::get(&pool, "SZ000001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.point1, Some(100.0));
    assert_eq!(row.date1.as_deref(), Some("2024-01-02 00:00:00"));
    assert_eq!(row.watch_type, 0);
}

#[tokio::test]
async fn descending_click_order_confirms() {
    let (mut session, _pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();

    draw_line(&mut session, &mut surface, anchor(2, 10.0), anchor(4, 8.0)).await;
    assert_eq!(session.watch_type(), Some(WatchType::Confirmed));
}

#[tokio::test]
async fn committing_the_same_points_twice_is_idempotent() {
    let (mut session, pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();

    draw_line(&mut session, &mut surface, anchor(2, 100.0), anchor(4, 200.0)).await;
    let first_row = trendwatch::db::annotation_queries::get(&pool, "SZ000001").await.unwrap();
    let first_line = surface.line_values.clone();

    draw_line(&mut session, &mut surface, anchor(2, 100.0), anchor(4, 200.0)).await;
    let second_row = trendwatch::db::annotation_queries::get(&pool, "SZ000001").await.unwrap();

    assert_eq!(format!("{:?}", first_row), format!("{:?}", second_row));
    assert_eq!(surface.line_values, first_line);

    // Re-rendering without a new commit or fetch changes nothing either.
    session.refresh(&mut surface).await.unwrap();
    assert_eq!(surface.line_values, first_line);
}

#[tokio::test]
async fn locked_annotation_rejects_drawing_until_unlocked() {
    let (mut session, _pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();

    session.lock().await.unwrap();
    assert!(!session.drawing_enabled());
    assert!(matches!(session.begin_drawing(), Err(SessionError::DrawingLocked)));

    // Unlock re-admits drawing without requiring pre-existing points.
    session.unlock().await.unwrap();
    assert_eq!(session.watch_type(), Some(WatchType::Tracking));
    draw_line(&mut session, &mut surface, anchor(2, 100.0), anchor(4, 200.0)).await;
    assert_eq!(surface.line_values.len(), 5);
}

#[tokio::test]
async fn lock_survives_refresh_and_is_enforced_by_the_store() {
    let (mut session, pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();
    session.lock().await.unwrap();

    // A fresh session over the same store sees the lock after its refresh.
    let provider = Arc::new(FixedProvider { bars: january_bars(&[1, 2, 3, 4, 5]), fail: false });
    let mut other = ChartSession::new(
        "SZ000001",
        InstrumentKind::Stock,
        provider.clone(),
        provider,
        Arc::new(SqliteAnnotationStore::new(pool)),
    );
    other.refresh(&mut surface).await.unwrap();
    assert_eq!(other.watch_type(), Some(WatchType::Locked));
    assert!(other.begin_drawing().is_err());
}

#[tokio::test]
async fn stored_anchor_outside_loaded_series_reports_missing_date() {
    // Series covers 2024-01-01..2024-01-10; the store holds an annotation
    // anchored at 2023-12-25.
    let (mut session, pool) = session_with(january_bars(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]), false).await;
    trendwatch::db::annotation_queries::upsert_points(
        &pool,
        "SZ000001",
        5.0,
        "2023-12-25 00:00:00",
        6.0,
        "2024-01-05 00:00:00",
        WatchType::Tracking,
    )
    .await
    .unwrap();

    let mut surface = RecordingSurface::default();
    let outcome = session.refresh(&mut surface).await.unwrap();

    assert!(!outcome.line_drawn);
    assert_eq!(
        outcome.issue,
        Some(SessionIssue::Render(RenderError::MissingAnchorDate(
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
        )))
    );
    assert!(surface.line_values.is_empty(), "no line points on a missing anchor");
    assert!(surface.marker_prices.is_empty(), "no markers on a missing anchor");
    assert_eq!(surface.candles.len(), 10, "series display unaffected");
}

#[tokio::test]
async fn fetch_failure_leaves_prior_chart_contents() {
    let (mut session, _pool) = session_with(january_bars(&[1, 2, 3]), true).await;
    let mut surface = RecordingSurface::default();
    surface.candles = january_bars(&[1, 2]);

    let result = session.refresh(&mut surface).await;
    assert!(matches!(result, Err(SessionError::Fetch(_))));
    assert_eq!(surface.candles.len(), 2, "previous series still displayed");
}

#[tokio::test]
async fn visible_window_survives_a_refresh() {
    let (mut session, _pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    surface.window = Some((1_704_000_000, 1_704_400_000));

    session.refresh(&mut surface).await.unwrap();
    assert_eq!(surface.window, Some((1_704_000_000, 1_704_400_000)));
    assert_eq!(surface.window_sets, 1);
}

#[tokio::test]
async fn hover_between_clicks_only_moves_the_candidate_marker() {
    let (mut session, pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();

    session.begin_drawing().unwrap();
    session.pointer_event(DrawEvent::Click(anchor(2, 100.0)), &mut surface).await;
    session.pointer_event(DrawEvent::Hover(anchor(3, 150.0)), &mut surface).await;

    assert_eq!(surface.provisional, Some(anchor(3, 150.0)));
    let row = trendwatch::db::annotation_queries::get(&pool, "SZ000001").await.unwrap();
    assert!(row.is_none(), "hover must never touch persisted state");
}

#[tokio::test]
async fn commit_after_failed_switch_never_uses_the_old_series() {
    let pool = memory_pool().await;
    let provider = Arc::new(FirstFetchOnlyProvider {
        bars: january_bars(&[1, 2, 3, 4, 5]),
        calls: std::sync::atomic::AtomicUsize::new(0),
    });
    let mut session = ChartSession::new(
        "SZ000001",
        InstrumentKind::Stock,
        provider.clone(),
        provider,
        Arc::new(SqliteAnnotationStore::new(pool)),
    );
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();
    assert_eq!(surface.candles.len(), 5);

    // The switch fetch fails; the session must not keep SZ000001's bars.
    let result = session
        .select_instrument("SH600000", InstrumentKind::Stock, &mut surface)
        .await;
    assert!(matches!(result, Err(SessionError::Fetch(_))));

    // A commit on the new instrument can only degrade to a missing anchor,
    // never a line drawn over the previous instrument's series.
    session.begin_drawing().unwrap();
    session.pointer_event(DrawEvent::Click(anchor(2, 100.0)), &mut surface).await;
    let issue = session.pointer_event(DrawEvent::Click(anchor(4, 200.0)), &mut surface).await;

    assert_eq!(
        issue,
        Some(SessionIssue::Render(RenderError::MissingAnchorDate(day(2))))
    );
    assert!(surface.line_values.is_empty());
    assert!(surface.marker_prices.is_empty());
}

#[tokio::test]
async fn instrument_switch_resets_gesture_and_watch_cache() {
    let (mut session, _pool) = session_with(january_bars(&[1, 2, 3, 4, 5]), false).await;
    let mut surface = RecordingSurface::default();
    session.refresh(&mut surface).await.unwrap();

    session.begin_drawing().unwrap();
    session.pointer_event(DrawEvent::Click(anchor(2, 100.0)), &mut surface).await;
    session.lock().await.unwrap();

    session
        .select_instrument("SH600000", InstrumentKind::Stock, &mut surface)
        .await
        .unwrap();
    assert_eq!(session.code(), "SH600000");
    assert_eq!(session.watch_type(), None, "other instrument has no annotation");
    assert!(session.drawing_enabled());
    assert_eq!(surface.provisional, None);
}
