mod components;
mod error;
mod media;
mod model;
mod render;
mod settings;
mod state;

use components::App;

fn main() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    let _ = console_log::init_with_level(level);
    yew::Renderer::<App>::new().render();
}
