use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::chart::engine::{self, LinePlan, MarkerPoint, RenderError};
use crate::external::bar_provider::{BarProvider, BarProviderError};
use crate::models::{Anchor, Annotation, Bar, InstrumentKind, WatchType};

/// Persistence seam the session writes annotations through.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Annotation>, StoreError>;

    /// Persists both anchors in click order and the derived watch type,
    /// returning the stored row. Must refuse the write while locked.
    async fn commit(&self, id: &str, first: Anchor, second: Anchor)
        -> Result<Annotation, StoreError>;

    async fn set_watch_type(&self, id: &str, watch: WatchType) -> Result<(), StoreError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("annotation is locked")]
    Locked,
    #[error("storage error: {0}")]
    Backend(String),
}

/// The rendering surface the session drives. The actual charting engine is
/// out of scope; anything that can draw candles, one line series and a few
/// markers satisfies this.
pub trait ChartSurface {
    fn set_candles(&mut self, bars: &[Bar]);
    fn set_line(&mut self, plan: &LinePlan);
    fn clear_line(&mut self);
    fn set_markers(&mut self, markers: &[MarkerPoint]);
    fn clear_markers(&mut self);
    /// Transient marker shown during the drawing gesture; `None` clears it.
    fn set_provisional_marker(&mut self, anchor: Option<Anchor>);
    fn visible_range(&self) -> Option<(i64, i64)>;
    fn set_visible_range(&mut self, range: (i64, i64));
}

// ---------------------------------------------------------------------------
// Drawing gesture state machine
// ---------------------------------------------------------------------------

/// Two-click capture as an explicit state machine, independent of any UI
/// event system so the gesture is testable without a pointer device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawState {
    Idle,
    AwaitingFirst,
    AwaitingSecond { first: Anchor },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawEvent {
    Begin,
    Click(Anchor),
    Hover(Anchor),
    Cancel,
}

/// What the caller must do after a transition. Only `Commit` mutates
/// persisted state; hovering moves the transient candidate marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawEffect {
    None,
    ShowProvisional(Anchor),
    MoveCandidate(Anchor),
    Commit { first: Anchor, second: Anchor },
    ClearProvisional,
}

/// Pure transition function for the gesture.
pub fn draw_step(state: DrawState, event: DrawEvent) -> (DrawState, DrawEffect) {
    match (state, event) {
        (DrawState::Idle, DrawEvent::Begin) => (DrawState::AwaitingFirst, DrawEffect::None),
        (DrawState::AwaitingFirst, DrawEvent::Click(a)) => {
            (DrawState::AwaitingSecond { first: a }, DrawEffect::ShowProvisional(a))
        }
        (DrawState::AwaitingSecond { first }, DrawEvent::Click(second)) => {
            (DrawState::Idle, DrawEffect::Commit { first, second })
        }
        (DrawState::AwaitingSecond { first }, DrawEvent::Hover(a)) => {
            (DrawState::AwaitingSecond { first }, DrawEffect::MoveCandidate(a))
        }
        (_, DrawEvent::Cancel) => (DrawState::Idle, DrawEffect::ClearProvisional),
        // Clicks and hovers outside drawing mode, repeated Begin, and hovers
        // before the first click change nothing.
        (state, _) => (state, DrawEffect::None),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-iteration refresh report. Render problems are non-fatal: the candle
/// series stays on screen and only the line/markers are omitted.
#[derive(Debug, PartialEq)]
pub struct RefreshOutcome {
    pub bars_loaded: usize,
    pub line_drawn: bool,
    pub issue: Option<SessionIssue>,
}

#[derive(Debug, PartialEq)]
pub enum SessionIssue {
    Render(RenderError),
    Store(StoreError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] BarProviderError),
    #[error("drawing not permitted while locked")]
    DrawingLocked,
}

/// Tracks the active instrument and drives fetch → render → annotate for one
/// open view. All state here is in-memory and reset on instrument switch.
pub struct ChartSession {
    code: String,
    kind: InstrumentKind,
    watch: Option<WatchType>,
    draw: DrawState,
    bars: Vec<Bar>,
    stock_provider: Arc<dyn BarProvider>,
    fund_provider: Arc<dyn BarProvider>,
    store: Arc<dyn AnnotationStore>,
}

impl ChartSession {
    pub fn new(
        code: impl Into<String>,
        kind: InstrumentKind,
        stock_provider: Arc<dyn BarProvider>,
        fund_provider: Arc<dyn BarProvider>,
        store: Arc<dyn AnnotationStore>,
    ) -> Self {
        Self {
            code: code.into(),
            kind,
            watch: None,
            draw: DrawState::Idle,
            bars: Vec::new(),
            stock_provider,
            fund_provider,
            store,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn watch_type(&self) -> Option<WatchType> {
        self.watch
    }

    pub fn draw_state(&self) -> DrawState {
        self.draw
    }

    pub fn drawing_enabled(&self) -> bool {
        WatchType::permits_drawing(self.watch)
    }

    /// Switches the active instrument and reloads. Drawing state and the
    /// cached watch type never survive a switch.
    pub async fn select_instrument(
        &mut self,
        code: impl Into<String>,
        kind: InstrumentKind,
        surface: &mut dyn ChartSurface,
    ) -> Result<RefreshOutcome, SessionError> {
        self.code = code.into();
        self.kind = kind;
        self.watch = None;
        self.draw = DrawState::Idle;
        // The old instrument's series must not survive the switch: if the
        // fetch below fails, a later commit would otherwise render against
        // the wrong bars.
        self.bars.clear();
        surface.set_provisional_marker(None);
        self.refresh(surface).await
    }

    /// Fetch → normalize → render → annotate, sequential and awaited so the
    /// render step always sees the series loaded in this same refresh. The
    /// visible window is captured first and reapplied at the end. A fetch
    /// failure returns early, leaving prior chart contents untouched.
    pub async fn refresh(
        &mut self,
        surface: &mut dyn ChartSurface,
    ) -> Result<RefreshOutcome, SessionError> {
        let window = surface.visible_range();

        let provider = match self.kind {
            InstrumentKind::Stock => &self.stock_provider,
            InstrumentKind::Fund => &self.fund_provider,
        };
        let mut bars = provider.fetch_daily_bars(&self.code).await?;
        bars.sort_by_key(|b| b.date);
        surface.set_candles(&bars);
        self.bars = bars;
        info!("Loaded {} bars for {}", self.bars.len(), self.code);

        let (line_drawn, issue) = match self.store.load(&self.code).await {
            Ok(annotation) => {
                self.watch = annotation.as_ref().and_then(Annotation::watch_type);
                self.render_annotation(annotation.as_ref(), surface)
            }
            Err(e) => {
                warn!("Failed to load annotation for {}: {}", self.code, e);
                surface.clear_line();
                surface.clear_markers();
                (false, Some(SessionIssue::Store(e)))
            }
        };

        if let Some(window) = window {
            surface.set_visible_range(window);
        }

        Ok(RefreshOutcome { bars_loaded: self.bars.len(), line_drawn, issue })
    }

    /// Enters drawing mode. Refused while the annotation is locked.
    pub fn begin_drawing(&mut self) -> Result<(), SessionError> {
        if !self.drawing_enabled() {
            return Err(SessionError::DrawingLocked);
        }
        let (next, _) = draw_step(self.draw, DrawEvent::Begin);
        self.draw = next;
        Ok(())
    }

    /// Feeds one pointer interaction through the gesture machine and applies
    /// its effect. On the second click the commit is persisted (awaited),
    /// the watch type cache refreshed from the stored row, and the line
    /// re-rendered against the bars loaded in the last refresh.
    pub async fn pointer_event(
        &mut self,
        event: DrawEvent,
        surface: &mut dyn ChartSurface,
    ) -> Option<SessionIssue> {
        let (next, effect) = draw_step(self.draw, event);
        self.draw = next;

        match effect {
            DrawEffect::None => None,
            DrawEffect::ShowProvisional(a) | DrawEffect::MoveCandidate(a) => {
                surface.set_provisional_marker(Some(a));
                None
            }
            DrawEffect::ClearProvisional => {
                surface.set_provisional_marker(None);
                None
            }
            DrawEffect::Commit { first, second } => {
                surface.set_provisional_marker(None);
                match self.store.commit(&self.code, first, second).await {
                    Ok(stored) => {
                        self.watch = stored.watch_type();
                        self.render_annotation(Some(&stored), surface).1
                    }
                    Err(e) => {
                        // Optimistic: in-memory state is not rolled back, the
                        // next refresh reconciles with storage.
                        warn!("Failed to commit annotation for {}: {}", self.code, e);
                        Some(SessionIssue::Store(e))
                    }
                }
            }
        }
    }

    /// Flips the annotation read-only. Independent of the stored points.
    pub async fn lock(&mut self) -> Result<(), StoreError> {
        self.store.set_watch_type(&self.code, WatchType::Locked).await?;
        self.watch = Some(WatchType::Locked);
        self.draw = DrawState::Idle;
        Ok(())
    }

    /// Returns a locked annotation to tracking; existing points are kept.
    pub async fn unlock(&mut self) -> Result<(), StoreError> {
        self.store.set_watch_type(&self.code, WatchType::Tracking).await?;
        self.watch = Some(WatchType::Tracking);
        Ok(())
    }

    fn render_annotation(
        &self,
        annotation: Option<&Annotation>,
        surface: &mut dyn ChartSurface,
    ) -> (bool, Option<SessionIssue>) {
        let Some(annotation) = annotation else {
            surface.clear_line();
            surface.clear_markers();
            return (false, None);
        };
        match engine::compute_line(annotation, &self.bars) {
            Ok(Some(plan)) => {
                surface.set_line(&plan);
                surface.set_markers(&plan.markers);
                (true, None)
            }
            Ok(None) => {
                surface.clear_line();
                surface.clear_markers();
                (false, None)
            }
            Err(e) => {
                warn!("Skipping annotation render for {}: {}", self.code, e);
                surface.clear_line();
                surface.clear_markers();
                (false, Some(SessionIssue::Render(e)))
            }
        }
    }
}
