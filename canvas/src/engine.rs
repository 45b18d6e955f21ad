use std::path::PathBuf;

use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;
use tracing::{debug, info, warn};

use crate::color::Color;
use crate::consts::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use crate::error::{ExportError, MapError, RenderError};
use crate::export::{Layer, SaveGate, SaveGuard, Scene};
use crate::history::History;
use crate::hit;
use crate::input::{InputState, ShapeKind, TextMode, Tool, ToolSettings};
use crate::map::MapEvent;
use crate::render::{self, StrokeStyle};
use crate::shapes;
use crate::surface::{Snapshot, Surface};
use crate::text::{self, TextId, TextLayer, TextObject};
use crate::view::{OverlayTransform, Point, ViewState, ViewTracker};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Surface, text layer, or chrome pixels changed.
    RenderNeeded,
    /// The event belongs to the map (Move tool); forward it unchanged.
    PassThrough,
    /// Whether the overlay should intercept pointer events.
    SetPointerCapture(bool),
    /// Re-apply the overlay's CSS-style transform.
    SetOverlayTransform(OverlayTransform),
    /// Ask the user for text to place at `at` (surface space).
    TextPromptRequested { at: Point },
    HistoryChanged { can_undo: bool, can_redo: bool },
    SelectionChanged(Option<TextId>),
    /// Transient, user-visible message. The operation that produced it had no
    /// effect on the surface or history.
    Notice(String),
}

/// Startup configuration for [`EngineCore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Surface width in pixels; matches the map container at startup.
    pub width: u32,
    pub height: u32,
    pub settings: ToolSettings,
    pub text_mode: TextMode,
    /// TrueType/OpenType font used for text.
    pub font_path: Option<PathBuf>,
    /// Without `font_path`, look for a common system font. When neither
    /// yields a font, text can be placed as live objects but not painted.
    pub system_font: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
            settings: ToolSettings::default(),
            text_mode: TextMode::default(),
            font_path: None,
            system_font: true,
        }
    }
}

/// Core engine state: view tracking, the drawing surface, history, and text.
///
/// Every entry point takes `&mut self` and returns the actions the host
/// should apply. Nothing here touches a window or a network.
pub struct EngineCore {
    pub settings: ToolSettings,
    pub input: InputState,
    text_mode: TextMode,
    view: ViewTracker,
    surface: Surface,
    history: History<Snapshot>,
    text: TextLayer,
    font: Option<FontArc>,
    save_gate: SaveGate,
}

impl EngineCore {
    /// Build an engine with a blank surface and a one-entry history.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the surface cannot be allocated or the
    /// configured font cannot be loaded.
    pub fn new(config: &EngineConfig) -> Result<Self, RenderError> {
        let font = match config.font_path.as_deref() {
            Some(path) => Some(text::load_font(path)?),
            None if config.system_font => text::load_system_font(),
            None => None,
        };
        if font.is_none() {
            warn!("no font available; flattened text cannot be painted");
        }
        let surface = Surface::new(config.width, config.height)?;
        let text = TextLayer::new(config.width, config.height)?;
        let history = History::new(surface.snapshot());
        info!(
            width = config.width,
            height = config.height,
            text_mode = ?config.text_mode,
            font = font.is_some(),
            "annotation engine created"
        );
        Ok(Self {
            settings: config.settings,
            input: InputState::Idle,
            text_mode: config.text_mode,
            view: ViewTracker::new(),
            surface,
            history,
            text,
            font,
            save_gate: SaveGate::new(),
        })
    }

    // --- Toolbar ---

    /// Switch tools. Abandons any gesture in progress.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.abandon_gesture();
        self.settings.tool = tool;
        actions.push(Action::SetPointerCapture(tool.captures_pointer()));
        actions
    }

    pub fn set_color(&mut self, color: Color) {
        self.settings.color = color;
    }

    /// Non-positive or non-finite widths are ignored.
    pub fn set_stroke_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.settings.stroke_width = width;
        }
    }

    /// Non-positive or non-finite sizes are ignored.
    pub fn set_text_size(&mut self, size: f32) {
        if size.is_finite() && size > 0.0 {
            self.settings.text_size = size;
        }
    }

    // --- Map ---

    /// Feed a map view notification. Moves and zooms before the ready
    /// signal are ignored.
    pub fn on_map_event(&mut self, event: MapEvent) -> Vec<Action> {
        let transform = match event {
            MapEvent::Ready(view) => {
                let t = self.view.ready(view);
                if t.is_some() {
                    info!(zoom = view.zoom, "map ready");
                }
                t
            }
            MapEvent::Moved(view) | MapEvent::Zoomed(view) => self.view.update(view),
        };
        match transform {
            Some(t) => vec![Action::SetOverlayTransform(t), Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    // --- Pointer input ---

    /// Pointer pressed at `screen` (offset within the overlay element).
    pub fn on_pointer_down(&mut self, screen: Point) -> Vec<Action> {
        if !self.view.is_ready() {
            debug!("pointer down before map ready; ignoring");
            return Vec::new();
        }
        let p = self.view.screen_to_surface(screen);
        match self.settings.tool {
            Tool::Move => vec![Action::PassThrough],
            Tool::Pen | Tool::Eraser => {
                self.input = InputState::Stroking { last: p, moved: false };
                Vec::new()
            }
            Tool::Shape(kind) => {
                self.input = InputState::PreviewingShape { kind, anchor: p };
                Vec::new()
            }
            Tool::Text => {
                self.input = InputState::AwaitingText { at: p };
                vec![Action::TextPromptRequested { at: p }]
            }
            Tool::Select => self.select_at(p),
        }
    }

    /// Pointer moved to `screen`. Only meaningful while a gesture is active.
    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        if !self.view.is_ready() {
            return Vec::new();
        }
        if self.settings.tool == Tool::Move {
            return vec![Action::PassThrough];
        }
        let p = self.view.screen_to_surface(screen);
        match self.input {
            InputState::Stroking { last, .. } => {
                let style = self.stroke_style();
                let drawn = render::stroke_segment(self.surface.pixmap_mut(), last, p, &style);
                self.input = InputState::Stroking { last: p, moved: true };
                match drawn {
                    Ok(()) => vec![Action::RenderNeeded],
                    Err(e) => vec![notice(&e)],
                }
            }
            InputState::PreviewingShape { kind, anchor } => match self.draw_shape_over_base(kind, anchor, p) {
                Ok(()) => vec![Action::RenderNeeded],
                Err(e) => vec![notice(&e)],
            },
            InputState::Idle | InputState::AwaitingText { .. } => Vec::new(),
        }
    }

    /// Pointer released at `screen`. Commits strokes and shapes to history.
    pub fn on_pointer_up(&mut self, screen: Point) -> Vec<Action> {
        if !self.view.is_ready() {
            return Vec::new();
        }
        if self.settings.tool == Tool::Move {
            return vec![Action::PassThrough];
        }
        let p = self.view.screen_to_surface(screen);
        match self.input {
            InputState::Stroking { last, moved } => {
                self.input = InputState::Idle;
                if !moved {
                    let style = self.stroke_style();
                    if let Err(e) = render::dot(self.surface.pixmap_mut(), last, &style) {
                        return vec![notice(&e)];
                    }
                }
                self.commit()
            }
            InputState::PreviewingShape { kind, anchor } => {
                self.input = InputState::Idle;
                if anchor == p {
                    self.revert_uncommitted();
                    return vec![Action::RenderNeeded];
                }
                match self.draw_shape_over_base(kind, anchor, p) {
                    Ok(()) => self.commit(),
                    Err(e) => {
                        self.revert_uncommitted();
                        vec![notice(&e), Action::RenderNeeded]
                    }
                }
            }
            InputState::Idle | InputState::AwaitingText { .. } => Vec::new(),
        }
    }

    // --- Text ---

    /// Place `text` at the pending prompt position. Empty or whitespace-only
    /// text cancels the prompt.
    pub fn commit_text(&mut self, text: &str) -> Vec<Action> {
        let InputState::AwaitingText { at } = self.input else {
            debug!("commit_text without a pending prompt; ignoring");
            return Vec::new();
        };
        self.input = InputState::Idle;
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let ToolSettings { color, text_size, .. } = self.settings;
        match self.text_mode {
            TextMode::Flatten => {
                let Some(font) = self.font.as_ref() else {
                    return vec![notice(&RenderError::FontUnavailable)];
                };
                if let Err(e) = render::draw_text(self.surface.pixmap_mut(), font, text, at, text_size, color) {
                    self.revert_uncommitted();
                    return vec![notice(&e)];
                }
                self.commit()
            }
            TextMode::LiveObjects => {
                let id = self.text.add(TextObject::new(text, at, color, text_size));
                debug!(%id, "text object added");
                self.redraw_text()
            }
        }
    }

    /// Dismiss the pending text prompt.
    pub fn cancel_text(&mut self) {
        if matches!(self.input, InputState::AwaitingText { .. }) {
            self.input = InputState::Idle;
        }
    }

    /// Delete the selected text object, if any.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let Some(removed) = self.text.remove_selected() else {
            return Vec::new();
        };
        debug!(id = %removed.id, "text object deleted");
        let mut actions = vec![Action::SelectionChanged(None)];
        actions.extend(self.redraw_text());
        actions
    }

    /// Replace the selected object's text. Empty text is ignored.
    pub fn edit_selected(&mut self, text: &str) -> Vec<Action> {
        let text = text.trim();
        if text.is_empty() || !self.text.edit_selected(text) {
            return Vec::new();
        }
        self.redraw_text()
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        let mut actions = self.abandon_gesture();
        if let Some(snapshot) = self.history.undo() {
            self.surface.restore(snapshot);
            actions.push(Action::RenderNeeded);
            actions.push(self.history_changed());
        }
        actions
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let mut actions = self.abandon_gesture();
        if let Some(snapshot) = self.history.redo() {
            self.surface.restore(snapshot);
            actions.push(Action::RenderNeeded);
            actions.push(self.history_changed());
        }
        actions
    }

    /// Erase the surface and all text, and reset history to a single blank
    /// entry.
    pub fn clear(&mut self) -> Vec<Action> {
        self.input = InputState::Idle;
        self.surface.clear();
        self.history.clear(self.surface.snapshot());
        self.text.clear();
        info!("annotations cleared");
        let mut actions = vec![Action::SelectionChanged(None)];
        actions.extend(self.redraw_text());
        actions.push(self.history_changed());
        actions
    }

    // --- Export ---

    /// Claim the save gate for one export.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::SaveInFlight`] while another save is running.
    pub fn begin_save(&self) -> Result<SaveGuard, ExportError> {
        self.save_gate.begin()
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.save_gate.is_saving()
    }

    /// Layer stack for export: the base map, then annotations and text at the
    /// overlay transform, then non-exportable selection chrome.
    #[must_use]
    pub fn scene(&self, base: Result<Pixmap, MapError>) -> Scene {
        let transform = self.view.transform().to_skia();
        let mut scene = Scene::new(self.surface.width(), self.surface.height());
        scene.push(match base {
            Ok(pixmap) => Layer::raster("map", pixmap),
            Err(e) => Layer::unavailable("map", e.to_string()),
        });
        scene.push(Layer::raster("annotations", self.surface.pixmap().clone()).with_transform(transform));
        if !self.text.objects().is_empty() {
            scene.push(Layer::raster("text", self.text.pixmap().clone()).with_transform(transform));
        }
        if self.text.selected().is_some() {
            scene.push(Layer::chrome("selection", self.text.chrome().clone()).with_transform(transform));
        }
        scene
    }

    // --- Queries ---

    #[must_use]
    pub fn view_state(&self) -> Option<ViewState> {
        self.view.state()
    }

    #[must_use]
    pub fn overlay_transform(&self) -> OverlayTransform {
        self.view.transform()
    }

    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    #[must_use]
    pub fn text_layer(&self) -> &TextLayer {
        &self.text
    }

    #[must_use]
    pub fn selection(&self) -> Option<TextId> {
        self.text.selected()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // --- Internals ---

    fn stroke_style(&self) -> StrokeStyle {
        match self.settings.tool {
            Tool::Eraser => StrokeStyle::eraser(self.settings.stroke_width),
            _ => StrokeStyle::pen(self.settings.color, self.settings.stroke_width),
        }
    }

    /// Restore the last committed snapshot, then draw the shape on top so
    /// previews never accumulate.
    fn draw_shape_over_base(
        &mut self,
        kind: ShapeKind,
        anchor: Point,
        current: Point,
    ) -> Result<(), RenderError> {
        self.revert_uncommitted();
        let geometry = shapes::geometry(kind, anchor, current);
        let style = StrokeStyle::pen(self.settings.color, self.settings.stroke_width);
        render::stroke_shape(self.surface.pixmap_mut(), &geometry, &style)
    }

    /// Repaint the surface from the snapshot history is pointing at.
    fn revert_uncommitted(&mut self) {
        if let Some(snapshot) = self.history.current() {
            self.surface.restore(snapshot);
        }
    }

    fn commit(&mut self) -> Vec<Action> {
        self.history.push(self.surface.snapshot());
        debug!(index = self.history.index(), "history push");
        vec![Action::RenderNeeded, self.history_changed()]
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }

    /// Drop an in-progress gesture, reverting any uncommitted pixels.
    fn abandon_gesture(&mut self) -> Vec<Action> {
        let previous = std::mem::take(&mut self.input);
        match previous {
            InputState::Stroking { .. } | InputState::PreviewingShape { .. } => {
                self.revert_uncommitted();
                vec![Action::RenderNeeded]
            }
            InputState::Idle | InputState::AwaitingText { .. } => Vec::new(),
        }
    }

    fn select_at(&mut self, p: Point) -> Vec<Action> {
        let hit = hit::hit_test(p, self.text.objects(), self.font.as_ref());
        if hit == self.text.selected() {
            return Vec::new();
        }
        self.text.select(hit);
        let mut actions = vec![Action::SelectionChanged(hit)];
        actions.extend(self.redraw_text());
        actions
    }

    fn redraw_text(&mut self) -> Vec<Action> {
        match self.text.redraw(self.font.as_ref()) {
            Ok(()) => vec![Action::RenderNeeded],
            Err(e) => {
                warn!(error = %e, "text layer redraw incomplete");
                vec![Action::RenderNeeded, notice(&e)]
            }
        }
    }
}

fn notice(error: &dyn std::fmt::Display) -> Action {
    Action::Notice(error.to_string())
}
