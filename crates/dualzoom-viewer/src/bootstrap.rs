use serde::Serialize;

use dualzoom_core::OverlayId;
use dualzoom_renderer::OverlayRenderer;

use crate::engine::{OpenOutcome, ViewerEngine};
use crate::panel::PanelSpec;
use crate::status::StatusIndicator;

/// Index of a panel in its [`Bootstrapper`].
pub type PanelId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    /// Constructed, waiting for its open outcome.
    Pending,
    Loaded,
    /// Either construction or opening failed.
    Failed,
}

pub struct Panel<H> {
    pub spec: PanelSpec,
    pub status: StatusIndicator,
    state: PanelState,
    handle: Option<H>,
    overlays: Vec<OverlayId>,
}

impl<H> Panel<H> {
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// `None` when construction failed.
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut H> {
        self.handle.as_mut()
    }

    /// Ids of the overlays registered on this panel, in spec order.
    pub fn overlays(&self) -> &[OverlayId] {
        &self.overlays
    }
}

/// Serializable snapshot of a panel, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct PanelReport {
    pub name: String,
    pub viewer: String,
    pub state: PanelState,
    pub status: StatusIndicator,
    pub overlays: Vec<OverlayId>,
}

/// Owns every viewer panel on the page and applies their lifecycle.
///
/// Panels are independent: one panel failing never changes another's
/// status or overlays.
pub struct Bootstrapper<E: ViewerEngine> {
    engine: E,
    renderer: OverlayRenderer,
    panels: Vec<Panel<E::Handle>>,
}

impl<E: ViewerEngine> Bootstrapper<E> {
    pub fn new(engine: E, renderer: OverlayRenderer) -> Self {
        Self {
            engine,
            renderer,
            panels: Vec::new(),
        }
    }

    /// Construct the panel's viewer.
    ///
    /// A construction error settles the panel immediately with its
    /// init-failure message; it is never propagated.
    pub fn add_panel(&mut self, spec: PanelSpec) -> PanelId {
        let mut status = StatusIndicator::new(&spec.status_element);
        let (state, handle) = match self.engine.construct(&spec.viewer) {
            Ok(handle) => {
                log::debug!("Constructed viewer #{}", spec.viewer.id);
                (PanelState::Pending, Some(handle))
            }
            Err(e) => {
                log::error!("{}: {}", spec.messages.init_failed, e);
                status.fail(&spec.messages.init_failed);
                (PanelState::Failed, None)
            }
        };

        self.panels.push(Panel {
            spec,
            status,
            state,
            handle,
            overlays: Vec::new(),
        });
        self.panels.len() - 1
    }

    /// Apply an open outcome to a pending panel.
    ///
    /// Returns `false` if the panel does not exist or already settled;
    /// later outcomes for a settled panel are ignored.
    pub fn deliver(&mut self, id: PanelId, outcome: OpenOutcome) -> bool {
        let renderer = self.renderer;
        let Some(panel) = self.panels.get_mut(id) else {
            log::warn!("Open outcome for unknown panel {}", id);
            return false;
        };
        if panel.state != PanelState::Pending {
            log::warn!(
                "Ignoring {:?} for panel '{}': already {:?}",
                outcome,
                panel.spec.name,
                panel.state
            );
            return false;
        }
        let Some(handle) = panel.handle.as_mut() else {
            return false;
        };

        match outcome {
            OpenOutcome::Loaded => {
                log::info!("{}", panel.spec.messages.loaded);
                panel.status.succeed(&panel.spec.messages.loaded);
                panel.state = PanelState::Loaded;
                for overlay in &panel.spec.overlays {
                    match renderer.render(&mut *handle, &overlay.polygon, &overlay.style) {
                        Ok(overlay_id) => panel.overlays.push(overlay_id),
                        Err(e) => log::error!(
                            "Overlay '{}' on panel '{}' not drawn: {}",
                            overlay.name,
                            panel.spec.name,
                            e
                        ),
                    }
                }
            }
            OpenOutcome::Failed { reason } => {
                log::error!("{} ({})", panel.spec.messages.failed, reason);
                panel.status.fail(&panel.spec.messages.failed);
                panel.state = PanelState::Failed;
            }
        }
        true
    }

    /// Resolve every pending panel through the engine.
    pub fn run(&mut self) {
        for id in 0..self.panels.len() {
            if self.panels[id].state != PanelState::Pending {
                continue;
            }
            let outcome = match self.panels[id].handle.as_mut() {
                Some(handle) => self.engine.resolve(handle),
                None => continue,
            };
            self.deliver(id, outcome);
        }
    }

    pub fn panels(&self) -> &[Panel<E::Handle>] {
        &self.panels
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel<E::Handle>> {
        self.panels.get(id)
    }

    pub fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel<E::Handle>> {
        self.panels.get_mut(id)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_settled(&self) -> bool {
        self.panels.iter().all(|p| p.state != PanelState::Pending)
    }

    pub fn report(&self) -> Vec<PanelReport> {
        self.panels
            .iter()
            .map(|p| PanelReport {
                name: p.spec.name.clone(),
                viewer: p.spec.viewer.id.clone(),
                state: p.state,
                status: p.status.clone(),
                overlays: p.overlays.clone(),
            })
            .collect()
    }
}
