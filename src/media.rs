//! Browser-side collaborators: camera stream, image decoding and the opacity
//! slider. Everything here is a thin shell over `web-sys`.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    File, HtmlImageElement, HtmlInputElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack, MediaTrackConstraints, Url,
};
use yew::NodeRef;

use crate::error::{OverlayError, js_message};
use crate::model::Size;
use crate::render::{OpacityControl, VideoSource, parse_opacity};
use crate::settings::Facing;

/// `HTMLMediaElement.HAVE_CURRENT_DATA`
const HAVE_CURRENT_DATA: u16 = 2;

pub struct BrowserVideo<'a>(pub &'a HtmlVideoElement);

impl VideoSource for BrowserVideo<'_> {
    type Frame = HtmlVideoElement;

    fn current_frame(&self) -> Option<&HtmlVideoElement> {
        (self.0.ready_state() >= HAVE_CURRENT_DATA).then_some(self.0)
    }

    fn intrinsic_size(&self) -> Option<Size> {
        let s = Size::new(self.0.video_width() as f64, self.0.video_height() as f64);
        s.is_drawable().then_some(s)
    }

    fn is_active(&self) -> bool {
        self.0.src_object().is_some() && !self.0.paused() && !self.0.ended()
    }
}

/// Reads the range input on every call; falls back to `default` if detached.
pub struct SliderOpacity {
    pub input: NodeRef,
    pub default: f64,
}

impl OpacityControl for SliderOpacity {
    fn current_value(&self) -> f64 {
        match self.input.cast::<HtmlInputElement>() {
            Some(el) => parse_opacity(&el.value(), self.default),
            None => self.default,
        }
    }
}

/// Ask for the camera and attach it to `video`. Resolves once playback starts.
/// If `wanted` says no by the time the stream arrives, the stream is stopped
/// instead and `Ok(false)` is returned.
pub async fn start_camera(
    video: &HtmlVideoElement,
    facing: Facing,
    wanted: impl Fn() -> bool,
) -> Result<bool, OverlayError> {
    let window = web_sys::window().ok_or_else(|| OverlayError::Camera("no window".into()))?;
    let media_devices = window
        .navigator()
        .media_devices()
        .map_err(OverlayError::camera)?;

    let track = MediaTrackConstraints::new();
    track.set_facing_mode(&JsValue::from_str(facing.as_constraint()));
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&track.into());
    constraints.set_audio(&JsValue::FALSE);

    let promise = media_devices
        .get_user_media_with_constraints(&constraints)
        .map_err(OverlayError::camera)?;
    let stream: MediaStream = JsFuture::from(promise)
        .await
        .map_err(OverlayError::camera)?
        .dyn_into()
        .map_err(|_| OverlayError::Camera("getUserMedia did not return a MediaStream".into()))?;

    if !wanted() {
        stop_tracks(&stream);
        log::info!("dropped stale camera stream ({})", facing.as_constraint());
        return Ok(false);
    }

    release_stream(video);
    video.set_muted(true);
    let _ = video.set_attribute("playsinline", "");
    video.set_src_object(Some(&stream));
    let playing = video.play().map_err(OverlayError::camera)?;
    JsFuture::from(playing).await.map_err(OverlayError::camera)?;
    log::info!("camera started ({})", facing.as_constraint());
    Ok(true)
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

/// Stop every track of the attached stream and detach it.
pub fn release_stream(video: &HtmlVideoElement) {
    let Some(stream) = video.src_object() else {
        return;
    };
    stop_tracks(&stream);
    video.set_src_object(None);
    log::info!("camera released");
}

/// Decode a user-selected file into an image element with its natural size.
pub async fn load_image(file: &File) -> Result<(HtmlImageElement, Size), OverlayError> {
    let url = Url::create_object_url_with_blob(file)
        .map_err(|e| OverlayError::OverlayLoad(js_message(&e)))?;
    let result = decode(&url).await;
    let _ = Url::revoke_object_url(&url);
    let (img, size) = result?;
    log::info!("decoded {} ({}x{})", file.name(), size.width, size.height);
    Ok((img, size))
}

async fn decode(url: &str) -> Result<(HtmlImageElement, Size), OverlayError> {
    let img = HtmlImageElement::new().map_err(|e| OverlayError::OverlayLoad(js_message(&e)))?;
    let loaded = js_sys::Promise::new(&mut |resolve, reject| {
        img.set_onload(Some(&resolve));
        img.set_onerror(Some(&reject));
    });
    img.set_src(url);
    let outcome = JsFuture::from(loaded).await;
    img.set_onload(None);
    img.set_onerror(None);
    outcome.map_err(|_| OverlayError::OverlayLoad("file is not a decodable image".into()))?;
    let size = Size::new(img.natural_width() as f64, img.natural_height() as f64);
    if !size.is_drawable() {
        return Err(OverlayError::OverlayLoad("image has no pixels".into()));
    }
    Ok((img, size))
}
