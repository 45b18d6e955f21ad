//! Input model: tools, per-tool settings, and the gesture state machine.
//!
//! `Tool` and `ToolSettings` capture what the toolbar says at the time of a
//! pointer event. `InputState` is the gesture being tracked between
//! pointer-down and pointer-up, carrying whatever context the active tool
//! needs to draw incrementally and commit on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::consts::{DEFAULT_STROKE_WIDTH, DEFAULT_TEXT_SIZE};
use crate::view::Point;

/// Shapes the shape tool can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Triangle,
    Arrow,
}

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tool", content = "shape", rename_all = "lowercase")]
pub enum Tool {
    /// Pointer events pass through to the map so it can be panned.
    #[default]
    Move,
    /// Freehand drawing.
    Pen,
    /// Freehand erasing (destination-out compositing).
    Eraser,
    /// Drag out a shape from an anchor point.
    Shape(ShapeKind),
    /// Click to place text.
    Text,
    /// Click to select a live text object.
    Select,
}

impl Tool {
    /// Whether the overlay should capture pointer events for this tool.
    ///
    /// In `Move` the overlay must let events through or the map cannot pan.
    #[must_use]
    pub fn captures_pointer(self) -> bool {
        !matches!(self, Self::Move)
    }
}

/// How committed text is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// Text is drawn into the surface and becomes part of the next snapshot.
    #[default]
    Flatten,
    /// Text stays a live object that can be selected, edited, and deleted.
    LiveObjects,
}

/// Toolbar state read on every pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub tool: Tool,
    pub color: Color,
    pub stroke_width: f32,
    pub text_size: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            color: Color::rgb(0xe5, 0x39, 0x35),
            stroke_width: DEFAULT_STROKE_WIDTH,
            text_size: DEFAULT_TEXT_SIZE,
        }
    }
}

/// Internal state for the gesture state machine.
///
/// All points are in surface space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Pen or eraser is down.
    Stroking {
        /// Position of the previous pointer event; the next segment starts here.
        last: Point,
        /// Whether any segment has been drawn since pointer-down.
        moved: bool,
    },
    /// A shape is being dragged out from `anchor`.
    PreviewingShape { kind: ShapeKind, anchor: Point },
    /// The host is showing a text prompt anchored at `at`.
    AwaitingText { at: Point },
}
