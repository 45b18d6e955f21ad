//! Annotation scripts: a JSON description of a map and the gestures to draw
//! on it, replayed against the engine.
//!
//! ```json
//! {
//!   "city": "Tokyo",
//!   "zoom": 12,
//!   "engine": { "width": 800, "height": 600 },
//!   "steps": [
//!     { "op": "tool", "tool": "pen" },
//!     { "op": "color", "color": "#1e88e5" },
//!     { "op": "stroke", "points": [[100, 100], [180, 140], [260, 120]] },
//!     { "op": "tool", "tool": "shape", "shape": "circle" },
//!     { "op": "drag", "from": [400, 300], "to": [460, 300] },
//!     { "op": "tool", "tool": "text" },
//!     { "op": "text", "at": [120, 420], "text": "meet here" }
//!   ]
//! }
//! ```
//!
//! Points are screen pixels within the viewport.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use canvas::color::Color;
use canvas::engine::{Action, EngineConfig, EngineCore};
use canvas::export::Scene;
use canvas::input::Tool;
use canvas::map::{MapEvent, MapProvider, TileMap};
use canvas::view::{LatLng, MapView, Point};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CliError;

const DEFAULT_ZOOM: f64 = 12.0;

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    /// Place name; geocoded when `center` is absent and used in the file name.
    #[serde(default)]
    pub city: Option<String>,
    /// `[lat, lng]`.
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(json: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Tool(Tool),
    Color { color: Color },
    StrokeWidth { width: f32 },
    TextSize { size: f32 },
    /// Press at the first point, move through the rest, release at the last.
    Stroke { points: Vec<[f64; 2]> },
    Drag { from: [f64; 2], to: [f64; 2] },
    Click { at: [f64; 2] },
    /// Click with the text tool and answer the prompt.
    Text { at: [f64; 2], text: String },
    EditSelected { text: String },
    DeleteSelected,
    Undo,
    Redo,
    Clear,
    ZoomIn,
    ZoomOut,
    /// Recenter the map, optionally changing zoom.
    Pan { center: [f64; 2], #[serde(default)] zoom: Option<f64> },
}

fn point([x, y]: [f64; 2]) -> Point {
    Point::new(x, y)
}

/// An engine wired to a tile map, driven one step at a time.
pub struct Session {
    pub engine: EngineCore,
    pub map: TileMap,
    notices: Vec<String>,
}

impl Session {
    /// Create the engine and bring the map up at `view`.
    pub fn start(config: &EngineConfig, view: MapView) -> Result<Self, CliError> {
        let engine = EngineCore::new(config)?;
        let mut session = Self { engine, map: TileMap::new(), notices: Vec::new() };
        let ready = session.map.init(view);
        let actions = session.map_event(ready);
        session.absorb(actions);
        Ok(session)
    }

    /// Notifications the engine raised so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn run(&mut self, steps: &[Step]) -> Result<(), CliError> {
        for (index, step) in steps.iter().enumerate() {
            self.apply(index, step)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, index: usize, step: &Step) -> Result<(), CliError> {
        debug!(step = index, ?step, "applying");
        let actions = match step {
            Step::Tool(tool) => self.engine.set_tool(*tool),
            Step::Color { color } => {
                self.engine.set_color(*color);
                Vec::new()
            }
            Step::StrokeWidth { width } => {
                self.engine.set_stroke_width(*width);
                Vec::new()
            }
            Step::TextSize { size } => {
                self.engine.set_text_size(*size);
                Vec::new()
            }
            Step::Stroke { points } => {
                let Some((first, rest)) = points.split_first() else {
                    return Err(CliError::Script { step: index, message: "stroke has no points".to_owned() });
                };
                let mut actions = self.engine.on_pointer_down(point(*first));
                for p in rest {
                    actions.extend(self.engine.on_pointer_move(point(*p)));
                }
                let last = rest.last().unwrap_or(first);
                actions.extend(self.engine.on_pointer_up(point(*last)));
                actions
            }
            Step::Drag { from, to } => {
                let mut actions = self.engine.on_pointer_down(point(*from));
                actions.extend(self.engine.on_pointer_move(point(*to)));
                actions.extend(self.engine.on_pointer_up(point(*to)));
                actions
            }
            Step::Click { at } => {
                let mut actions = self.engine.on_pointer_down(point(*at));
                actions.extend(self.engine.on_pointer_up(point(*at)));
                actions
            }
            Step::Text { at, text } => {
                let prompt = self.engine.on_pointer_down(point(*at));
                if !prompt.iter().any(|a| matches!(a, Action::TextPromptRequested { .. })) {
                    return Err(CliError::Script { step: index, message: "text tool is not active".to_owned() });
                }
                let mut actions = prompt;
                actions.extend(self.engine.commit_text(text));
                actions
            }
            Step::EditSelected { text } => self.engine.edit_selected(text),
            Step::DeleteSelected => self.engine.delete_selected(),
            Step::Undo => self.engine.undo(),
            Step::Redo => self.engine.redo(),
            Step::Clear => self.engine.clear(),
            Step::ZoomIn => {
                let event = self.map.zoom_in();
                self.map_event(event)
            }
            Step::ZoomOut => {
                let event = self.map.zoom_out();
                self.map_event(event)
            }
            Step::Pan { center: [lat, lng], zoom } => {
                let Some(current) = self.map.view() else {
                    return Err(CliError::Script { step: index, message: "map is not ready".to_owned() });
                };
                let view = MapView::new(LatLng::new(*lat, *lng), zoom.unwrap_or(current.zoom));
                let event = self.map.set_view(view);
                self.map_event(event)
            }
        };
        self.absorb(actions);
        Ok(())
    }

    fn map_event(&mut self, event: Option<MapEvent>) -> Vec<Action> {
        match event {
            Some(event) => self.engine.on_map_event(event),
            None => Vec::new(),
        }
    }

    fn absorb(&mut self, actions: Vec<Action>) {
        for action in actions {
            if let Action::Notice(message) = action {
                warn!(%message, "engine notice");
                self.notices.push(message);
            }
        }
    }

    /// Export layers for the current state, with the base map composited
    /// from whatever tiles are cached.
    pub fn scene(&self) -> Scene {
        let surface = self.engine.surface();
        self.engine.scene(self.map.render_base(surface.width(), surface.height()))
    }
}
