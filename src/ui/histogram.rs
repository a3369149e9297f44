/// RGB histogram display
/// Draws the normalized bins produced by the GPU histogram
use iced::widget::canvas::{self, Path, Stroke};
use iced::{Color, Point, Rectangle};
use std::sync::Arc;

use crate::gpu::histogram::BINS;
use crate::gpu::HistogramResult;

/// Histogram canvas program
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bins already scaled to 0..100
    pub data: Arc<HistogramResult>,
}

impl<Message> canvas::Program<Message> for Histogram {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let width = bounds.width;
        let height = bounds.height;
        let bar_width = width / BINS as f32;

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgba(0.0, 0.0, 0.0, 0.3));

        // Draw three histogram channels (R, G, B)
        let colors = [
            Color::from_rgba(1.0, 0.0, 0.0, 0.5),
            Color::from_rgba(0.0, 1.0, 0.0, 0.5),
            Color::from_rgba(0.0, 0.0, 1.0, 0.5),
        ];

        for (channel, color) in self.data.channels().into_iter().zip(colors) {
            let mut builder = canvas::path::Builder::new();

            for (i, &percent) in channel.iter().enumerate() {
                if percent > 0.0 {
                    let bar_height = percent / 100.0 * height;
                    let x = i as f32 * bar_width;
                    builder.move_to(Point::new(x, height));
                    builder.line_to(Point::new(x, height - bar_height));
                }
            }

            let path: Path = builder.build();
            frame.stroke(
                &path,
                Stroke::default()
                    .with_color(color)
                    .with_width(bar_width.max(1.0)),
            );
        }

        vec![frame.into_geometry()]
    }
}
