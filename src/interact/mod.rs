//! Interactive map wiring for one district component.
//!
//! `MapInteraction` owns the hover/click/navigate state machine and
//! emits `MapEvent`s to the host over a channel; the host owns actual
//! routing, styling and tooltip rendering. The click → navigate
//! transition is debounced behind a short delay and cancelled if the
//! target district changes or the component is dropped, so a stale
//! target never navigates.

mod state;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::select::select_primary;
use crate::types::{MapTheme, RegionRecord};

pub use state::InteractionState;

/// Delay between a click landing (visual feedback) and the navigation
/// request going out. A second click inside this window is ignored.
pub const NAV_DELAY: Duration = Duration::from_millis(200);

/// Everything the engine tells its host.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Re-apply styles for the current state and theme.
    Restyle { state: InteractionState, theme: MapTheme },
    TooltipShow { district: String, record_count: usize },
    TooltipMove { x: f64, y: f64 },
    TooltipHide,
    /// Navigate to the primary record's page. Emitted at most once per
    /// click, after [`NAV_DELAY`].
    Navigate { code: Arc<str> },
    /// Boundary resolution failed; render the degraded style and a
    /// non-blocking notice. Navigation keeps working without geometry.
    BoundaryMissing { district: String },
}

/// State shared with the pending-navigation task.
#[derive(Debug)]
struct Shared {
    state: InteractionState,
    theme: MapTheme,
    events: UnboundedSender<MapEvent>,
}

impl Shared {
    fn emit(&self, event: MapEvent) {
        // The host may have dropped its receiver during teardown.
        let _ = self.events.send(event);
    }
}

/// One district's interaction machine.
pub struct MapInteraction {
    territory: String,
    district: String,
    record_count: usize,
    primary: Option<RegionRecord>,
    interactive: bool,
    shared: Arc<Mutex<Shared>>,
    /// Cancels everything scoped to the current (territory, district)
    /// identity: the pending navigation, boundary resolution, marker
    /// batches. Replaced on identity change.
    token: CancellationToken,
}

impl MapInteraction {
    /// Build a machine for a district and its records. The returned
    /// receiver carries every event the host must react to.
    pub fn new(
        territory: &str,
        district: &str,
        records: &[RegionRecord],
        interactive: bool,
        theme: MapTheme,
    ) -> (Self, UnboundedReceiver<MapEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let machine = Self {
            territory: territory.trim().to_string(),
            district: district.trim().to_string(),
            record_count: records.len(),
            primary: select_primary(records).cloned(),
            interactive,
            shared: Arc::new(Mutex::new(Shared {
                state: InteractionState::Idle,
                theme,
                events,
            })),
            token: CancellationToken::new(),
        };
        (machine, receiver)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> InteractionState {
        self.lock().state
    }

    pub fn territory(&self) -> &str { &self.territory }

    pub fn district(&self) -> &str { &self.district }

    pub fn primary(&self) -> Option<&RegionRecord> {
        self.primary.as_ref()
    }

    /// Token scoping async work (boundary resolution, marker batches)
    /// to the current district identity.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Pointer entered the district's geometry.
    pub fn pointer_enter(&self) {
        let mut shared = self.lock();
        if shared.state != InteractionState::Idle {
            return;
        }
        shared.state = InteractionState::Hovering;
        shared.emit(MapEvent::Restyle { state: InteractionState::Hovering, theme: shared.theme });
        shared.emit(MapEvent::TooltipShow {
            district: self.district.clone(),
            record_count: self.record_count,
        });
    }

    /// Pointer moved while over the district; repositions the tooltip.
    pub fn pointer_move(&self, x: f64, y: f64) {
        let shared = self.lock();
        if shared.state == InteractionState::Hovering {
            shared.emit(MapEvent::TooltipMove { x, y });
        }
    }

    /// Pointer left the district's geometry.
    pub fn pointer_leave(&self) {
        let mut shared = self.lock();
        if shared.state != InteractionState::Hovering {
            return;
        }
        shared.state = InteractionState::Idle;
        shared.emit(MapEvent::TooltipHide);
        shared.emit(MapEvent::Restyle { state: InteractionState::Idle, theme: shared.theme });
    }

    /// Click on the district. Applies the clicked style immediately and
    /// schedules the navigation emission after [`NAV_DELAY`]. No-op when
    /// not interactive, when no primary record exists, or while a click
    /// is already pending (debounce).
    pub fn click(&self) {
        if !self.interactive {
            return;
        }
        let Some(primary) = &self.primary else {
            trace!(district = %self.district, "click ignored, no primary record");
            return;
        };

        {
            let mut shared = self.lock();
            if !shared.state.accepts_hover() {
                trace!(district = %self.district, "click ignored, navigation pending");
                return;
            }
            if shared.state == InteractionState::Hovering {
                shared.emit(MapEvent::TooltipHide);
            }
            shared.state = InteractionState::Clicked;
            shared.emit(MapEvent::Restyle { state: InteractionState::Clicked, theme: shared.theme });
        }

        let shared = Arc::clone(&self.shared);
        let token = self.token.clone();
        let code = primary.code.clone();
        let district = self.district.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%district, "pending navigation cancelled");
                }
                _ = tokio::time::sleep(NAV_DELAY) => {
                    let mut shared = shared.lock().unwrap_or_else(|e| e.into_inner());
                    if shared.state == InteractionState::Clicked {
                        shared.state = InteractionState::Navigating;
                        shared.emit(MapEvent::Navigate { code });
                    }
                }
            }
        });
    }

    /// Swap to a new target district. Cancels all in-flight work for the
    /// old identity and resets to `Idle`; a pending navigation for the
    /// old district will not fire.
    pub fn set_district(&mut self, district: &str, records: &[RegionRecord]) {
        self.token.cancel();
        self.token = CancellationToken::new();

        self.district = district.trim().to_string();
        self.record_count = records.len();
        self.primary = select_primary(records).cloned();

        let mut shared = self.lock();
        if shared.state == InteractionState::Hovering {
            shared.emit(MapEvent::TooltipHide);
        }
        shared.state = InteractionState::Idle;
        shared.emit(MapEvent::Restyle { state: InteractionState::Idle, theme: shared.theme });
    }

    /// Theme toggle: restyle everything, leave the state alone.
    pub fn set_theme(&self, theme: MapTheme) {
        let mut shared = self.lock();
        shared.theme = theme;
        shared.emit(MapEvent::Restyle { state: shared.state, theme });
    }

    /// Report that no boundary could be resolved for this district.
    /// The host shows the fallback notice; click-to-navigate is
    /// unaffected (it needs no geometry).
    pub fn boundary_missing(&self) {
        let shared = self.lock();
        shared.emit(MapEvent::BoundaryMissing { district: self.district.clone() });
    }
}

impl Drop for MapInteraction {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
