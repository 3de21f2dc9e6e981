//! Render model for the timeline widget.
//!
//! The core only computes positions; hosts implement `TimelineRenderer` with
//! whatever drawing API they have and replay a `TimelineView` into it.

use serde::{Deserialize, Serialize};

use crate::controller::TimelineController;
use crate::ids::KeyframeId;
use crate::timeline::format_time;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerView {
    pub id: KeyframeId,
    /// Pixel offset from the left edge of the view.
    pub x: f32,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RulerLabel {
    pub x: f32,
    pub text: String,
}

/// Everything needed to draw one frame of the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub pixel_length: u32,
    pub ruler: Vec<RulerLabel>,
    pub markers: Vec<MarkerView>,
    pub cursor_x: f32,
    pub hover_x: Option<f32>,
}

impl TimelineView {
    pub fn build(controller: &TimelineController, ruler_spacing_px: u32) -> Self {
        let timeline = controller.timeline();
        let pixel_length = timeline.pixel_length();
        let selected = controller.selected();

        let ruler = if ruler_spacing_px == 0 {
            Vec::new()
        } else {
            (0..=pixel_length)
                .step_by(ruler_spacing_px as usize)
                .map(|px| {
                    let x = px as f32;
                    RulerLabel {
                        x,
                        text: format_time(timeline.pixel_to_time(x)),
                    }
                })
                .collect()
        };

        let markers = controller
            .store()
            .keyframes()
            .iter()
            .map(|k| MarkerView {
                id: k.id,
                x: timeline.time_to_pixel(k.time),
                selected: selected == Some(k.id),
            })
            .collect();

        Self {
            pixel_length,
            ruler,
            markers,
            cursor_x: timeline.time_to_pixel(controller.cursor_time()),
            hover_x: controller.hover_x(),
        }
    }

    /// Replay into a renderer: ruler, markers, hover line, then the cursor on top.
    pub fn draw(&self, renderer: &mut dyn TimelineRenderer) {
        for label in &self.ruler {
            renderer.draw_ruler_label(label.x, &label.text);
        }
        for m in &self.markers {
            renderer.draw_marker(m.id, m.x, m.selected);
        }
        if let Some(x) = self.hover_x {
            renderer.draw_hover_line(x);
        }
        renderer.draw_cursor(self.cursor_x);
    }
}

/// Drawing callbacks implemented by the host widget.
pub trait TimelineRenderer {
    fn draw_ruler_label(&mut self, x: f32, text: &str);
    fn draw_marker(&mut self, id: KeyframeId, x: f32, selected: bool);
    fn draw_cursor(&mut self, x: f32);
    fn draw_hover_line(&mut self, x: f32);
}
