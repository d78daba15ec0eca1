use super::overlay_view::OverlayView;
use crate::settings::OverlaySettings;
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    let settings = use_state(OverlaySettings::load);

    // Persist preference changes
    {
        let settings = settings.clone();
        use_effect_with((*settings).clone(), move |current| {
            current.save();
            || ()
        });
    }

    let on_settings = {
        let settings = settings.clone();
        Callback::from(move |next: OverlaySettings| settings.set(next))
    };

    html! { <OverlayView settings={(*settings).clone()} {on_settings} /> }
}
