// VIEW: guides, offscreen output and the preview renderer
pub mod guides;
pub mod output;
pub mod preview;

pub use guides::{fit_frame, safe_frame, Line, Rect, SafeFrame};
pub use output::{capture, encode, OutputError, OutputFormat, PixelBuffer, RenderRequest, RenderSink, Rgba8, ShotWriter};
pub use preview::PreviewSink;
