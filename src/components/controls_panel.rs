use web_sys::{File, HtmlInputElement};
use yew::prelude::*;

use crate::settings::Facing;

#[derive(Properties, PartialEq, Clone)]
pub struct ControlsPanelProps {
    pub opacity: f64,
    /// The range input, read by the render loop once per frame.
    pub opacity_ref: NodeRef,
    pub facing: Facing,
    pub status: Option<String>,
    pub on_file: Callback<File>,
    pub on_opacity: Callback<String>,
    pub on_reset: Callback<()>,
    pub on_clear: Callback<()>,
    pub on_switch_camera: Callback<()>,
}

#[function_component]
pub fn ControlsPanel(props: &ControlsPanelProps) -> Html {
    let file_cb = {
        let cb = props.on_file.clone();
        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            if let Some(file) = input.files().and_then(|list| list.get(0)) {
                cb.emit(file);
            }
            // Allow picking the same file again.
            input.set_value("");
        })
    };
    let opacity_cb = {
        let cb = props.on_opacity.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                cb.emit(input.value());
            }
        })
    };
    let reset_cb = {
        let cb = props.on_reset.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let clear_cb = {
        let cb = props.on_clear.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let switch_cb = {
        let cb = props.on_switch_camera.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let camera_label = match props.facing {
        Facing::User => "Rear camera",
        Facing::Environment => "Front camera",
    };
    html! {<div id="controls-bar" style="width:100%; box-sizing:border-box; background:rgba(22,27,34,0.9); border-bottom:1px solid #30363d; padding:8px; display:flex; flex-wrap:wrap; gap:8px; align-items:center; color:#c9d1d9; font-size:13px;">
        <input type="file" accept="image/*" onchange={file_cb} />
        <label style="display:flex; align-items:center; gap:6px;">
            <span>{"Opacity"}</span>
            <input
                ref={props.opacity_ref.clone()}
                type="range"
                min="0"
                max="1"
                step="0.01"
                value={props.opacity.to_string()}
                oninput={opacity_cb}
            />
        </label>
        <button onclick={reset_cb}>{"Fit"}</button>
        <button onclick={clear_cb}>{"Clear"}</button>
        <button onclick={switch_cb}>{ camera_label }</button>
        { if let Some(txt) = &props.status { html!{ <div style="font-size:11px; line-height:1.2; background:#1c2128; border:1px solid #30363d; padding:4px 6px; border-radius:6px; color:#f85149;">{ txt.clone() }</div> } } else { html!{} } }
    </div>}
}
