//! Painter - turns a [`Session`] into canvas calls.
//!
//! The screen is split into the frame image on the left, the control panel on
//! the right and a one-row status line at the bottom. Widget coordinates are
//! panel-local; the painter offsets them by the panel's origin.

use crate::core::scene::TRANSPORT_LAYOUT;
use crate::core::Session;
use crate::data::geometry::Bounds;
use crate::data::input::PointerState;
use crate::data::layout::find_layout;
use crate::data::widget::Widget;
use crate::frontend::canvas::{Canvas, Palette};

const CORNER_RADIUS: u16 = 1;
const LOCK_MARKER: &str = "×";

/// Where each part of the screen goes, in absolute cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub image: Bounds,
    pub panel: Bounds,
    pub status: Bounds,
}

impl ScreenAreas {
    pub fn split(width: u16, height: u16, panel_width: u16) -> Self {
        let width = i32::from(width);
        let height = i32::from(height);
        let body_height = (height - 1).max(0);
        let panel_width = i32::from(panel_width).min(width);
        let image_width = width - panel_width;
        Self {
            image: Bounds::new(0, 0, image_width, body_height),
            panel: Bounds::new(image_width, 0, panel_width, body_height),
            status: Bounds::new(0, body_height, width, height.min(1)),
        }
    }
}

/// Draw one full frame of the session
pub fn paint_session(
    canvas: &mut dyn Canvas,
    session: &Session,
    palette: &Palette,
    areas: &ScreenAreas,
) {
    canvas.draw_image(session.scene().player().current_frame(), areas.image);
    paint_panel(canvas, session, palette, areas.panel);
    paint_status(canvas, session, palette, areas.status);
}

fn paint_panel(canvas: &mut dyn Canvas, session: &Session, palette: &Palette, panel: Bounds) {
    canvas.draw_rect(panel, palette.background, 0);

    let (ox, oy) = (panel.x, panel.y);
    let scene = session.scene();
    let pointer = session.pointer();

    for (index, layout) in scene.layouts().iter().enumerate() {
        if let Some(caption) = scene.model().caption(index) {
            let bounds = layout.bounds();
            let (_, first_y) = layout.widgets().first().map_or((0, bounds.y), Widget::center);
            let x = bounds.x - caption.chars().count() as i32 - 1;
            canvas.draw_text(caption, (x + ox, first_y + oy), palette.text);
        }
        for widget in layout.widgets() {
            paint_widget(canvas, widget, pointer, palette, (ox, oy));
        }
    }

    if let Some(summary) = scene.summary() {
        let y = find_layout(scene.layouts(), TRANSPORT_LAYOUT)
            .map(|t| t.bounds().bottom() + 1)
            .unwrap_or(0);
        let x = (panel.width - summary.chars().count() as i32) / 2;
        canvas.draw_text(&summary, (x.max(0) + ox, y + oy), palette.text);
    }
}

fn paint_widget(
    canvas: &mut dyn Canvas,
    widget: &Widget,
    pointer: &PointerState,
    palette: &Palette,
    origin: (i32, i32),
) {
    let (ox, oy) = origin;
    let shadow = widget.rest_bounds().offset(ox + 1, oy + 1);
    canvas.draw_rect(shadow, palette.shadow, CORNER_RADIUS);

    let body = widget.layout_geometry(pointer).offset(ox, oy);
    canvas.draw_rect(body, palette.body(widget.visual_state()), CORNER_RADIUS);

    let (cx, cy) = body.center();
    let label = widget.label();
    let x = cx - label.chars().count() as i32 / 2;
    canvas.draw_text(label, (x, cy), palette.text);

    if widget.is_locked() {
        canvas.draw_text(LOCK_MARKER, (body.right() - 2, body.y), palette.locked);
    }
}

fn paint_status(canvas: &mut dyn Canvas, session: &Session, palette: &Palette, status: Bounds) {
    if status.height <= 0 {
        return;
    }
    canvas.draw_rect(status, palette.shadow, 0);
    canvas.draw_text(&status_line(session), (status.x + 1, status.y), palette.text);
}

/// Text of the bottom status row
pub fn status_line(session: &Session) -> String {
    let field = session.jump_field();
    if field.is_active() {
        return format!("Jump to frame: {}_", field.text());
    }

    let scene = session.scene();
    let player = scene.player();
    let mut line = format!(
        "{} | {} | frame {}/{} | {}",
        scene.name(),
        player.key(),
        player.index() + 1,
        player.len(),
        if player.is_playing() { "playing" } else { "paused" }
    );
    if let Some(status) = session.status() {
        line.push_str(" | ");
        line.push_str(status);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Frame;
    use crate::config::{ColorConfig, Config};
    use crate::core::scene::tests::{click, sampling_scene};
    use crate::core::scene::{build_models, Scene};
    use crate::data::input::InputEvent;
    use crossterm::event::KeyCode;
    use ratatui::style::Color;
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Rect(Bounds, Color),
        Text(String, (i32, i32), Color),
        Image(u32, u32, Bounds),
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
    }

    impl RecordingCanvas {
        fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(text, _, _) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Canvas for RecordingCanvas {
        fn area(&self) -> Bounds {
            Bounds::new(0, 0, 100, 30)
        }

        fn draw_rect(&mut self, bounds: Bounds, color: Color, _corner_radius: u16) {
            self.ops.push(Op::Rect(bounds, color));
        }

        fn draw_text(&mut self, text: &str, position: (i32, i32), color: Color) {
            self.ops.push(Op::Text(text.to_string(), position, color));
        }

        fn draw_image(&mut self, frame: &Frame, area: Bounds) {
            self.ops.push(Op::Image(frame.width, frame.height, area));
        }
    }

    fn palette() -> Palette {
        Palette::from_config(&ColorConfig::default()).unwrap()
    }

    fn session_with(scene: Scene) -> Session {
        Session::new(vec![scene], 0).unwrap()
    }

    #[test]
    fn test_split_screen() {
        let areas = ScreenAreas::split(100, 30, 44);
        assert_eq!(areas.image, Bounds::new(0, 0, 56, 29));
        assert_eq!(areas.panel, Bounds::new(56, 0, 44, 29));
        assert_eq!(areas.status, Bounds::new(0, 29, 100, 1));

        // Narrow terminal: the panel takes everything
        let areas = ScreenAreas::split(30, 10, 44);
        assert_eq!(areas.panel.width, 30);
        assert_eq!(areas.image.width, 0);
    }

    #[test]
    fn test_paints_image_widgets_and_captions() {
        let mut session = session_with(sampling_scene());
        let areas = ScreenAreas::split(100, 30, 44);
        session.set_panel_origin(areas.panel.x, areas.panel.y);
        let palette = palette();
        let mut canvas = RecordingCanvas::default();
        paint_session(&mut canvas, &session, &palette, &areas);

        assert_eq!(canvas.ops[0], Op::Image(2, 2, areas.image));

        let texts = canvas.texts();
        for expected in ["Coarse:", "Fine:", "Pos encoding", "128", "Play", "<", ">"] {
            assert!(texts.contains(&expected), "missing {}", expected);
        }
        assert!(texts.contains(&"Total number of samples: 192"));
        assert!(!texts.contains(&LOCK_MARKER));

        // Selected "128" is drawn in the active color, offset into the panel
        let fine = find_layout(session.scene().layouts(), "fine").unwrap();
        let rest = fine.by_key("128").unwrap().rest_bounds();
        let body = rest.offset(areas.panel.x, areas.panel.y);
        assert!(canvas.ops.contains(&Op::Rect(body, palette.active)));
        assert!(canvas
            .ops
            .contains(&Op::Rect(body.offset(1, 1), palette.shadow)));
    }

    #[test]
    fn test_locked_widgets_get_marker() {
        let mut scene = sampling_scene();
        click(&mut scene, "fine", "16");
        scene.rebind().unwrap();
        let session = session_with(scene);

        let mut canvas = RecordingCanvas::default();
        paint_session(&mut canvas, &session, &palette(), &ScreenAreas::split(100, 30, 44));
        let markers = canvas
            .texts()
            .iter()
            .filter(|t| **t == LOCK_MARKER)
            .count();
        assert_eq!(markers, 2);
    }

    #[test]
    fn test_status_line() {
        let config = Config::embedded().unwrap();
        let models = build_models(&config).unwrap();
        let scene = Scene::new(
            models[0].clone(),
            crate::core::scene::tests::sampling_store(),
            &config,
        )
        .unwrap();
        let mut session = session_with(scene);
        assert_eq!(
            status_line(&session),
            "Sampling | lego_pos_encoding_True_view_dirs_True_64_128 | frame 1/5 | paused"
        );

        let now = Instant::now();
        session.handle_event(&InputEvent::key_down(KeyCode::Char('g')), now);
        session.handle_event(&InputEvent::key_down(KeyCode::Char('3')), now);
        assert_eq!(status_line(&session), "Jump to frame: 3_");

        session.handle_event(&InputEvent::key_down(KeyCode::Enter), now);
        assert!(status_line(&session).ends_with("frame 3/5 | paused | Frame 3/5"));
    }
}
