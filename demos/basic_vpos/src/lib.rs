// src/lib.rs
use wasm_bindgen::prelude::*;
use yew::prelude::*;
use yew_vpos::{CheckoutVpos, ProcessIdForm, StyleMap, VposMode};

#[wasm_bindgen(start)]
pub fn start() {
    yew::Renderer::<BasicVpos>::new().render();
}

/// `?mode=production` switches endpoints; anything else stays on the sandbox.
fn mode_from_location() -> VposMode {
    web_sys::window()
        .and_then(|window| window.location().href().ok())
        .and_then(|href| url::Url::parse(&href).ok())
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "mode")
                .and_then(|(_, value)| value.parse().ok())
        })
        .unwrap_or(VposMode::Sandbox)
}

#[function_component(BasicVpos)]
fn basic_vpos() -> Html {
    let mode = use_memo((), |_| mode_from_location());
    let process_id = use_state(AttrValue::default);
    let reload = use_state(|| 0u32);
    let status = use_state(|| None::<String>);
    let styles = use_memo((), |_| {
        StyleMap::from([("form-background-color".to_owned(), "#12d431".to_owned())])
    });

    let on_load = {
        let process_id = process_id.clone();
        let reload = reload.clone();
        let status = status.clone();
        Callback::from(move |id: String| {
            status.set(None);
            process_id.set(id.into());
            reload.set(reload.wrapping_add(1));
        })
    };

    let on_success = {
        let status = status.clone();
        Callback::from(move |return_url: String| {
            tracing::info!(%return_url, "received success message");
            status.set(Some(format!("Paid, continue at {return_url}")));
        })
    };

    let on_failure = {
        let status = status.clone();
        Callback::from(move |return_url: String| {
            tracing::info!(%return_url, "received failure message");
            status.set(Some(format!("Payment failed, continue at {return_url}")));
        })
    };

    html! {
        <div style="display:flex;flex-direction:column;height:100vh;">
            <ProcessIdForm {on_load} />
            {
                if let Some(msg) = &*status {
                    html! { <p>{ msg.clone() }</p> }
                } else {
                    Html::default()
                }
            }
            <div style="flex:1;">
                <CheckoutVpos
                    process_id={(*process_id).clone()}
                    styles={(*styles).clone()}
                    mode={*mode}
                    reload={*reload}
                    {on_success}
                    {on_failure}
                />
            </div>
        </div>
    }
}
