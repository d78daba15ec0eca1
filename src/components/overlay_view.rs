use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    CanvasRenderingContext2d, EventTarget, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, HtmlVideoElement, MouseEvent, TouchEvent, VisibilityState,
    WheelEvent,
};
use yew::prelude::*;

use super::controls_panel::ControlsPanel;
use crate::error::OverlayError;
use crate::media::{self, BrowserVideo, SliderOpacity};
use crate::model::{OverlayConfig, Point, Size};
use crate::render::{CanvasSurface, OpacityControl, VideoSource};
use crate::settings::OverlaySettings;
use crate::state::{OverlayController, ResizeDebouncer, StreamRequests, TickOutcome};

type Controller = Rc<RefCell<OverlayController<HtmlImageElement>>>;

#[derive(Properties, PartialEq, Clone)]
pub struct OverlayViewProps {
    pub settings: OverlaySettings,
    pub on_settings: Callback<OverlaySettings>,
}

/// DOM listener removed again when dropped.
struct Listener {
    target: EventTarget,
    event: &'static str,
    cb: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn new(target: &EventTarget, event: &'static str, f: impl FnMut(web_sys::Event) + 'static) -> Self {
        let cb = Closure::wrap(Box::new(f) as Box<dyn FnMut(web_sys::Event)>);
        if let Err(e) = target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref()) {
            log::warn!("could not listen for {}: {:?}", event, e);
        }
        Self {
            target: target.clone(),
            event,
            cb,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.cb.as_ref().unchecked_ref());
    }
}

/// requestAnimationFrame handle; the callback re-arms itself through `request`.
#[derive(Clone, Default)]
struct FrameLoop {
    cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    raf_id: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    fn request(&self) {
        let Some(window) = web_sys::window() else { return };
        if let Some(cb) = self.cell.borrow().as_ref() {
            if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                self.raf_id.set(Some(id));
            }
        }
    }

    fn cancel(&self) {
        if let (Some(window), Some(id)) = (web_sys::window(), self.raf_id.take()) {
            let _ = window.cancel_animation_frame(id);
        }
        // Breaks the closure -> FrameLoop reference cycle.
        self.cell.borrow_mut().take();
    }
}

fn page_visible() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .map(|d| d.visibility_state() == VisibilityState::Visible)
        .unwrap_or(true)
}

/// Client coordinates to surface pixels (the canvas may be CSS-scaled).
fn to_surface(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> Point {
    let rect = canvas.get_bounding_client_rect();
    let sx = if rect.width() > 0.0 { canvas.width() as f64 / rect.width() } else { 1.0 };
    let sy = if rect.height() > 0.0 { canvas.height() as f64 / rect.height() } else { 1.0 };
    Point::new((client_x - rect.left()) * sx, (client_y - rect.top()) * sy)
}

fn touch_points(e: &TouchEvent, canvas: &HtmlCanvasElement) -> Vec<Point> {
    let touches = e.touches();
    (0..touches.length())
        .filter_map(|i| touches.item(i))
        .map(|t| to_surface(canvas, t.client_x() as f64, t.client_y() as f64))
        .collect()
}

#[function_component(OverlayView)]
pub fn overlay_view(props: &OverlayViewProps) -> Html {
    let canvas_ref = use_node_ref();
    let video_ref = use_node_ref();
    let opacity_ref = use_node_ref();
    let controller: Controller =
        use_mut_ref(|| OverlayController::new(OverlayConfig::default(), page_visible()));
    let status = use_state(|| None::<String>);
    let requests = use_mut_ref(StreamRequests::default);

    // Camera (re)start whenever the facing mode changes
    {
        let video_ref = video_ref.clone();
        let status = status.clone();
        use_effect_with(props.settings.facing, move |facing| {
            let facing = *facing;
            let video = video_ref.cast::<HtmlVideoElement>();
            if let Some(video) = video.clone() {
                let ticket = requests.borrow_mut().begin();
                let requests = requests.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let wanted = || requests.borrow().is_current(ticket);
                    if let Err(e) = media::start_camera(&video, facing, wanted).await {
                        log::error!("{}", e);
                        status.set(Some(e.to_string()));
                    }
                });
            }
            // Runs before the next facing and on unmount.
            move || {
                requests.borrow_mut().cancel();
                if let Some(video) = video {
                    media::release_stream(&video);
                }
            }
        });
    }

    // Main mount effect (events, render loop)
    {
        let canvas_ref = canvas_ref.clone();
        let video_ref = video_ref.clone();
        let opacity_ref = opacity_ref.clone();
        let controller = controller.clone();
        let status = status.clone();
        use_effect_with((), move |_| {
            let mounted = mount(&canvas_ref, &video_ref, opacity_ref, &controller, status);
            if let Err(e) = &mounted {
                log::error!("{}", e);
            }
            move || {
                if let Ok((listeners, frames, video)) = mounted {
                    drop(listeners);
                    frames.cancel();
                    if controller.borrow_mut().teardown() {
                        media::release_stream(&video);
                    }
                }
            }
        });
    }

    let on_file = {
        let controller = controller.clone();
        let status = status.clone();
        Callback::from(move |file: web_sys::File| {
            let controller = controller.clone();
            let status = status.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match media::load_image(&file).await {
                    Ok((img, size)) => {
                        controller
                            .borrow_mut()
                            .load_overlay_image(img, size.width, size.height);
                        status.set(None);
                    }
                    Err(e) => {
                        controller.borrow_mut().overlay_load_failed(&e);
                        status.set(Some(e.to_string()));
                    }
                }
            });
        })
    };
    let on_opacity = {
        let settings = props.settings.clone();
        let cb = props.on_settings.clone();
        let default = controller.borrow().config.default_opacity;
        Callback::from(move |raw: String| {
            let opacity = crate::render::parse_opacity(&raw, default);
            cb.emit(OverlaySettings {
                opacity,
                ..settings.clone()
            });
        })
    };
    let on_reset = {
        let controller = controller.clone();
        Callback::from(move |_| controller.borrow_mut().reset_transform())
    };
    let on_clear = {
        let controller = controller.clone();
        Callback::from(move |_| controller.borrow_mut().clear_overlay())
    };
    let on_switch_camera = {
        let settings = props.settings.clone();
        let cb = props.on_settings.clone();
        Callback::from(move |_| {
            cb.emit(OverlaySettings {
                facing: settings.facing.toggled(),
                ..settings.clone()
            })
        })
    };

    html! {
        <div id="overlay-root" style="position:relative; width:100vw; height:100vh; display:flex; flex-direction:column; align-items:center; background:#0e1116;">
            <ControlsPanel
                opacity={props.settings.opacity}
                opacity_ref={opacity_ref.clone()}
                facing={props.settings.facing}
                status={(*status).clone()}
                {on_file}
                {on_opacity}
                {on_reset}
                {on_clear}
                {on_switch_camera}
            />
            <video ref={video_ref} style="display:none;" />
            <canvas ref={canvas_ref} style="touch-action:none; max-width:100%;" />
        </div>
    }
}

type Mounted = (Vec<Listener>, FrameLoop, HtmlVideoElement);

fn mount(
    canvas_ref: &NodeRef,
    video_ref: &NodeRef,
    opacity_ref: NodeRef,
    controller: &Controller,
    status: UseStateHandle<Option<String>>,
) -> Result<Mounted, OverlayError> {
    let window = web_sys::window().ok_or_else(|| OverlayError::Render("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| OverlayError::Render("no document".into()))?;
    let canvas: HtmlCanvasElement = canvas_ref
        .cast()
        .ok_or_else(|| OverlayError::Render("canvas not mounted".into()))?;
    let video: HtmlVideoElement = video_ref
        .cast()
        .ok_or_else(|| OverlayError::Render("video not mounted".into()))?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(OverlayError::render)?
        .ok_or_else(|| OverlayError::Render("2d context unavailable".into()))?
        .dyn_into()
        .map_err(|_| OverlayError::Render("not a 2d context".into()))?;

    let apply_viewport: Rc<dyn Fn()> = {
        let canvas = canvas.clone();
        let video = video.clone();
        let controller = controller.clone();
        let document = document.clone();
        let window = window.clone();
        Rc::new(move || {
            let bar_height: f64 = document
                .get_element_by_id("controls-bar")
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                .map(|el| el.client_height() as f64)
                .unwrap_or(0.0);
            let width = window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(800.0);
            let height = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(600.0)
                - bar_height;
            let surface = controller.borrow_mut().handle_resize(
                Size::new(width, height),
                BrowserVideo(&video).intrinsic_size(),
            );
            let (w, h) = (surface.width as u32, surface.height as u32);
            if canvas.width() != w || canvas.height() != h {
                canvas.set_width(w);
                canvas.set_height(h);
            }
        })
    };
    apply_viewport();

    // RAF loop
    let frames = FrameLoop::default();
    {
        let frames_loop = frames.clone();
        let controller = controller.clone();
        let video = video.clone();
        let status = status.clone();
        let mut surface = CanvasSurface::new(ctx);
        let default = controller.borrow().config.default_opacity;
        let opacity = SliderOpacity {
            input: opacity_ref,
            default,
        };
        *frames.cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            let outcome = controller.borrow_mut().render_tick(
                &mut surface,
                &BrowserVideo(&video),
                opacity.current_value(),
            );
            match outcome {
                TickOutcome::Continue => frames_loop.request(),
                TickOutcome::Idle => {}
                TickOutcome::Stopped(e) => {
                    media::release_stream(&video);
                    status.set(Some(format!("{}. Reload the page to restart.", e)));
                }
            }
        }) as Box<dyn FnMut()>));
    }

    let mut listeners = Vec::new();
    // Stream lifecycle
    {
        let apply_viewport = apply_viewport.clone();
        listeners.push(Listener::new(&video, "loadedmetadata", move |_| apply_viewport()));
    }
    {
        // Mid-stream dimension changes, e.g. device rotation.
        let apply_viewport = apply_viewport.clone();
        listeners.push(Listener::new(&video, "resize", move |_| apply_viewport()));
    }
    {
        let controller = controller.clone();
        let frames = frames.clone();
        listeners.push(Listener::new(&video, "playing", move |_| {
            if controller.borrow_mut().handle_playing() {
                frames.request();
            }
        }));
    }
    // Visibility
    {
        let controller = controller.clone();
        let frames = frames.clone();
        listeners.push(Listener::new(&document, "visibilitychange", move |_| {
            if controller.borrow_mut().handle_visibility_change(page_visible()) {
                frames.request();
            }
        }));
    }
    // Resize, coalesced
    {
        let debouncer = Rc::new(RefCell::new(ResizeDebouncer::default()));
        let delay = controller.borrow().config.resize_debounce_ms;
        let window_cb = window.clone();
        listeners.push(Listener::new(&window, "resize", move |_| {
            let token = debouncer.borrow_mut().bump();
            let debouncer = debouncer.clone();
            let apply_viewport = apply_viewport.clone();
            let fire = Closure::once_into_js(move || {
                if debouncer.borrow().is_current(token) {
                    apply_viewport();
                }
            });
            let _ = window_cb.set_timeout_with_callback_and_timeout_and_arguments_0(
                fire.unchecked_ref(),
                delay,
            );
        }));
    }
    // Touch
    {
        let canvas_tc = canvas.clone();
        let controller = controller.clone();
        listeners.push(Listener::new(&canvas, "touchstart", move |e| {
            if let Some(e) = e.dyn_ref::<TouchEvent>() {
                e.prevent_default();
                controller
                    .borrow_mut()
                    .handle_pointer_down(&touch_points(e, &canvas_tc));
            }
        }));
    }
    {
        let canvas_tc = canvas.clone();
        let controller = controller.clone();
        listeners.push(Listener::new(&canvas, "touchmove", move |e| {
            if let Some(e) = e.dyn_ref::<TouchEvent>() {
                e.prevent_default();
                controller
                    .borrow_mut()
                    .handle_pointer_move(&touch_points(e, &canvas_tc));
            }
        }));
    }
    for event in ["touchend", "touchcancel"] {
        let canvas_tc = canvas.clone();
        let controller = controller.clone();
        listeners.push(Listener::new(&canvas, event, move |e| {
            if let Some(e) = e.dyn_ref::<TouchEvent>() {
                e.prevent_default();
                controller
                    .borrow_mut()
                    .handle_pointer_up(&touch_points(e, &canvas_tc));
            }
        }));
    }
    // Mouse acts as a single pointer
    let mouse_down = Rc::new(Cell::new(false));
    {
        let canvas_mc = canvas.clone();
        let controller = controller.clone();
        let mouse_down = mouse_down.clone();
        listeners.push(Listener::new(&canvas, "mousedown", move |e| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                if e.button() == 0 {
                    mouse_down.set(true);
                    let p = to_surface(&canvas_mc, e.client_x() as f64, e.client_y() as f64);
                    controller.borrow_mut().handle_pointer_down(&[p]);
                }
            }
        }));
    }
    {
        let canvas_mc = canvas.clone();
        let controller = controller.clone();
        let mouse_down = mouse_down.clone();
        listeners.push(Listener::new(&canvas, "mousemove", move |e| {
            if !mouse_down.get() {
                return;
            }
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                let p = to_surface(&canvas_mc, e.client_x() as f64, e.client_y() as f64);
                controller.borrow_mut().handle_pointer_move(&[p]);
            }
        }));
    }
    {
        let controller = controller.clone();
        listeners.push(Listener::new(&window, "mouseup", move |_| {
            if mouse_down.replace(false) {
                controller.borrow_mut().handle_pointer_up(&[]);
            }
        }));
    }
    // Wheel zoom
    {
        let controller = controller.clone();
        listeners.push(Listener::new(&canvas, "wheel", move |e| {
            if let Some(e) = e.dyn_ref::<WheelEvent>() {
                e.prevent_default();
                controller.borrow_mut().handle_wheel(e.delta_y());
            }
        }));
    }

    // The stream may already be playing if the camera resolved before mount.
    if !video.paused() && controller.borrow_mut().handle_playing() {
        frames.request();
    }
    log::info!("overlay view mounted");
    Ok((listeners, frames, video))
}
