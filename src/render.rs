//! Per-frame compositing of the live video and the transformed overlay.
//!
//! The compositor only talks to the [`Surface`] and [`VideoSource`] traits so
//! it can be exercised without a browser; [`CanvasSurface`] is the 2D canvas
//! implementation used by the app.

use web_sys::{CanvasRenderingContext2d, HtmlImageElement, HtmlVideoElement};

use crate::error::OverlayError;
use crate::model::{Point, Size, TransformState};

/// Drawing target. Transform calls compose onto the current matrix, in call order.
pub trait Surface {
    type Frame: ?Sized;
    type Image: ?Sized;

    fn clear(&mut self, size: Size) -> Result<(), OverlayError>;
    fn draw_frame(&mut self, frame: &Self::Frame, size: Size) -> Result<(), OverlayError>;
    fn set_alpha(&mut self, alpha: f64);
    fn translate(&mut self, x: f64, y: f64) -> Result<(), OverlayError>;
    fn rotate(&mut self, radians: f64) -> Result<(), OverlayError>;
    fn scale(&mut self, sx: f64, sy: f64) -> Result<(), OverlayError>;
    fn shear(&mut self, kx: f64, ky: f64) -> Result<(), OverlayError>;
    fn draw_image(&mut self, image: &Self::Image, at: Point, size: Size)
    -> Result<(), OverlayError>;
    /// Back to the identity matrix.
    fn reset_transform(&mut self) -> Result<(), OverlayError>;
}

pub trait VideoSource {
    type Frame: ?Sized;

    /// `None` until the stream has a decodable frame.
    fn current_frame(&self) -> Option<&Self::Frame>;
    /// `None` until metadata has loaded.
    fn intrinsic_size(&self) -> Option<Size>;
    fn is_active(&self) -> bool;
}

pub trait OpacityControl {
    fn current_value(&self) -> f64;
}

/// A decoded overlay image and its intrinsic size.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay<I> {
    pub image: I,
    pub size: Size,
}

/// Clamp into `[0, 1]`; anything non-finite becomes `default`.
pub fn normalize_opacity(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        default.clamp(0.0, 1.0)
    }
}

/// Parse the opacity input's text.
pub fn parse_opacity(text: &str, default: f64) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) => normalize_opacity(v, default),
        Err(_) => {
            log::debug!("unparsable opacity {:?}, using {}", text, default);
            normalize_opacity(default, default)
        }
    }
}

/// Draw one frame: clear, video stretched to the surface, then the overlay.
pub fn composite<S, V>(
    surface: &mut S,
    size: Size,
    video: &V,
    overlay: Option<&Overlay<S::Image>>,
    transform: &TransformState,
    opacity: f64,
) -> Result<(), OverlayError>
where
    S: Surface,
    S::Image: Sized,
    V: VideoSource<Frame = S::Frame>,
{
    surface.clear(size)?;
    if video.is_active() {
        if let Some(frame) = video.current_frame() {
            surface.draw_frame(frame, size)?;
        }
    }
    let Some(overlay) = overlay else {
        return Ok(());
    };
    surface.set_alpha(opacity);
    let drawn = draw_transformed(surface, overlay, transform);
    surface.set_alpha(1.0);
    let reset = surface.reset_transform();
    drawn.and(reset)
}

fn draw_transformed<S: Surface>(
    surface: &mut S,
    overlay: &Overlay<S::Image>,
    t: &TransformState,
) -> Result<(), OverlayError>
where
    S::Image: Sized,
{
    surface.translate(t.translation.x, t.translation.y)?;
    surface.rotate(t.rotation)?;
    surface.scale(t.scale, t.scale)?;
    surface.shear(t.skew.x, t.skew.y)?;
    let at = Point::new(-overlay.size.width / 2.0, -overlay.size.height / 2.0);
    surface.draw_image(&overlay.image, at, overlay.size)
}

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Surface for CanvasSurface {
    type Frame = HtmlVideoElement;
    type Image = HtmlImageElement;

    fn clear(&mut self, size: Size) -> Result<(), OverlayError> {
        self.ctx
            .set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
            .map_err(OverlayError::render)?;
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn draw_frame(&mut self, frame: &HtmlVideoElement, size: Size) -> Result<(), OverlayError> {
        self.ctx
            .draw_image_with_html_video_element_and_dw_and_dh(
                frame,
                0.0,
                0.0,
                size.width,
                size.height,
            )
            .map_err(OverlayError::render)
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), OverlayError> {
        self.ctx.translate(x, y).map_err(OverlayError::render)
    }

    fn rotate(&mut self, radians: f64) -> Result<(), OverlayError> {
        self.ctx.rotate(radians).map_err(OverlayError::render)
    }

    fn scale(&mut self, sx: f64, sy: f64) -> Result<(), OverlayError> {
        self.ctx.scale(sx, sy).map_err(OverlayError::render)
    }

    fn shear(&mut self, kx: f64, ky: f64) -> Result<(), OverlayError> {
        self.ctx
            .transform(1.0, ky, kx, 1.0, 0.0, 0.0)
            .map_err(OverlayError::render)
    }

    fn draw_image(
        &mut self,
        image: &HtmlImageElement,
        at: Point,
        size: Size,
    ) -> Result<(), OverlayError> {
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                at.x,
                at.y,
                size.width,
                size.height,
            )
            .map_err(OverlayError::render)
    }

    fn reset_transform(&mut self) -> Result<(), OverlayError> {
        self.ctx
            .set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
            .map_err(OverlayError::render)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Clear(Size),
        Frame(&'static str, Size),
        Alpha(f64),
        Translate(f64, f64),
        Rotate(f64),
        Scale(f64, f64),
        Shear(f64, f64),
        Image(&'static str, Point, Size),
        Reset,
    }

    /// Records every call; optionally fails on the first image draw.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub ops: Vec<Op>,
        pub fail_image: bool,
    }

    impl Surface for RecordingSurface {
        type Frame = &'static str;
        type Image = &'static str;

        fn clear(&mut self, size: Size) -> Result<(), OverlayError> {
            self.ops.push(Op::Clear(size));
            Ok(())
        }
        fn draw_frame(&mut self, frame: &&'static str, size: Size) -> Result<(), OverlayError> {
            self.ops.push(Op::Frame(frame, size));
            Ok(())
        }
        fn set_alpha(&mut self, alpha: f64) {
            self.ops.push(Op::Alpha(alpha));
        }
        fn translate(&mut self, x: f64, y: f64) -> Result<(), OverlayError> {
            self.ops.push(Op::Translate(x, y));
            Ok(())
        }
        fn rotate(&mut self, radians: f64) -> Result<(), OverlayError> {
            self.ops.push(Op::Rotate(radians));
            Ok(())
        }
        fn scale(&mut self, sx: f64, sy: f64) -> Result<(), OverlayError> {
            self.ops.push(Op::Scale(sx, sy));
            Ok(())
        }
        fn shear(&mut self, kx: f64, ky: f64) -> Result<(), OverlayError> {
            self.ops.push(Op::Shear(kx, ky));
            Ok(())
        }
        fn draw_image(
            &mut self,
            image: &&'static str,
            at: Point,
            size: Size,
        ) -> Result<(), OverlayError> {
            if self.fail_image {
                return Err(OverlayError::Render("image not decodable".into()));
            }
            self.ops.push(Op::Image(image, at, size));
            Ok(())
        }
        fn reset_transform(&mut self) -> Result<(), OverlayError> {
            self.ops.push(Op::Reset);
            Ok(())
        }
    }

    pub struct FakeVideo {
        pub frame: Option<&'static str>,
        pub size: Option<Size>,
        pub active: bool,
    }

    impl VideoSource for FakeVideo {
        type Frame = &'static str;

        fn current_frame(&self) -> Option<&&'static str> {
            self.frame.as_ref()
        }
        fn intrinsic_size(&self) -> Option<Size> {
            self.size
        }
        fn is_active(&self) -> bool {
            self.active
        }
    }
}
