//! Drop-in Yew components for the hosted vPOS forms.
//!
//! `CheckoutVpos` embeds the payment checkout and `CardVpos` the card
//! registration form. Each renders a full-size `<iframe>`, loads the form for
//! the given `process_id` and emits `on_success` / `on_failure` when the form
//! reports back.

use std::rc::{Rc, Weak};

use yew::functional::hook;
use yew::prelude::*;

use crate::bridge::{
    Bridge, Card, CardVposDelegate, Checkout, CheckoutVposDelegate, VposForm,
};
use crate::components::VposFrame;
use crate::interop::{use_script_messages, FrameMessage, IframeSurface};
use crate::vpos::{StyleMap, VposMode};

/// What the frame should show: the form for `process_id` in `mode`.
///
/// Used as the load effect's dependency, so bumping `reload` loads the same
/// process id again.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub mode: VposMode,
    pub process_id: AttrValue,
    pub styles: StyleMap,
    pub reload: u32,
}

impl LoadRequest {
    /// Nothing is loaded for an empty process id.
    pub fn should_load(&self) -> bool {
        !self.process_id.is_empty()
    }
}

/// Custom hook: run a [`Bridge`] for form `F` behind an `<iframe>`.
///
/// Returns the `NodeRef` to attach to the iframe. The form is (re)loaded
/// whenever `request` changes and has a process id. Only messages posted by
/// that iframe from the form's own origin reach the bridge. `delegate` is only
/// referenced weakly, so the caller must keep it alive for as long as it wants
/// outcomes.
#[hook]
pub fn use_vpos_bridge<F>(request: LoadRequest, delegate: Weak<F::Delegate>) -> NodeRef
where
    F: VposForm,
{
    let frame = use_node_ref();
    let mode = request.mode;
    let bridge = use_memo((), move |_| Bridge::<F>::new(mode));
    bridge.set_delegate(delegate);

    {
        let bridge = bridge.clone();
        let frame = frame.clone();
        use_effect_with(request, move |request| {
            bridge.set_mode(request.mode);
            if request.should_load() {
                match frame.cast::<web_sys::HtmlIFrameElement>() {
                    Some(element) => bridge.load(
                        &IframeSurface::new(element),
                        &request.process_id,
                        &request.styles,
                    ),
                    None => tracing::warn!(form = F::FORM.name, "vPOS frame is not mounted"),
                }
            }
            || ()
        });
    }

    let on_message = {
        let bridge = bridge.clone();
        use_callback((), move |event: FrameMessage, _| {
            bridge.handle_message_from(&event.origin, &event.message)
        })
    };
    use_script_messages(frame.clone(), on_message);

    frame
}

fn load_request(mode: VposMode, process_id: &AttrValue, styles: &StyleMap, reload: u32) -> LoadRequest {
    LoadRequest {
        mode,
        process_id: process_id.clone(),
        styles: styles.clone(),
        reload,
    }
}

/// Why a card could not be registered.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CardFailure {
    pub details: String,
    pub return_url: String,
}

/// Adapts component callbacks to [`CardVposDelegate`].
#[derive(Clone, PartialEq, Default)]
pub struct CardCallbacks {
    pub on_success: Callback<String>,
    pub on_failure: Callback<CardFailure>,
}

impl CardVposDelegate for CardCallbacks {
    fn card_creation_success(&self, return_url: &str) {
        self.on_success.emit(return_url.to_owned());
    }

    fn card_creation_failed(&self, details: &str, return_url: &str) {
        self.on_failure.emit(CardFailure {
            details: details.to_owned(),
            return_url: return_url.to_owned(),
        });
    }
}

/// Adapts component callbacks to [`CheckoutVposDelegate`].
#[derive(Clone, PartialEq, Default)]
pub struct CheckoutCallbacks {
    pub on_success: Callback<String>,
    pub on_failure: Callback<String>,
}

impl CheckoutVposDelegate for CheckoutCallbacks {
    fn payment_success(&self, return_url: &str) {
        self.on_success.emit(return_url.to_owned());
    }

    fn payment_failed(&self, return_url: &str) {
        self.on_failure.emit(return_url.to_owned());
    }
}

/// Properties for [`CardVpos`].
///
/// * `process_id` – The process id of your card registration; nothing loads while empty.
/// * `styles` – Custom form styles.
/// * `mode` – Sandbox or production endpoints (production by default).
/// * `reload` – Bump to load the form again for the same process id.
/// * `on_success` – Called with the return URL when the card was registered.
/// * `on_failure` – Called with [`CardFailure`] otherwise.
#[derive(Properties, PartialEq, Clone)]
pub struct CardVposProps {
    pub process_id: AttrValue,
    #[prop_or_default]
    pub styles: StyleMap,
    #[prop_or_default]
    pub mode: VposMode,
    #[prop_or_default]
    pub reload: u32,
    #[prop_or_default]
    pub on_success: Callback<String>,
    #[prop_or_default]
    pub on_failure: Callback<CardFailure>,
}

/// Embedded vPOS card registration form.
///
/// # Example
///
/// ```rust,ignore
/// use yew::prelude::*;
/// use yew_vpos::{CardFailure, CardVpos, VposMode};
///
/// #[function_component(Wallet)]
/// fn wallet() -> Html {
///     let on_success = Callback::from(|return_url: String| {
///         tracing::info!(%return_url, "card registered");
///     });
///     let on_failure = Callback::from(|failure: CardFailure| {
///         tracing::warn!(details = %failure.details, "card rejected");
///     });
///     html! {
///         <CardVpos process_id="my-process-id" mode={VposMode::Sandbox} {on_success} {on_failure} />
///     }
/// }
/// ```
#[function_component(CardVpos)]
pub fn card_vpos(props: &CardVposProps) -> Html {
    let delegate = use_memo(
        (props.on_success.clone(), props.on_failure.clone()),
        |(on_success, on_failure)| CardCallbacks {
            on_success: on_success.clone(),
            on_failure: on_failure.clone(),
        },
    );
    let weak = Rc::downgrade(&delegate);
    let weak: Weak<dyn CardVposDelegate> = weak;
    let request = load_request(props.mode, &props.process_id, &props.styles, props.reload);
    let frame = use_vpos_bridge::<Card>(request, weak);

    html! { <VposFrame {frame} title="vPOS card registration" /> }
}

/// Properties for [`CheckoutVpos`].
///
/// * `process_id` – The process id of your payment; nothing loads while empty.
/// * `styles` – Custom form styles.
/// * `mode` – Sandbox or production endpoints (production by default).
/// * `reload` – Bump to load the form again for the same process id.
/// * `on_success` – Called with the return URL when the payment went through.
/// * `on_failure` – Called with the return URL otherwise.
#[derive(Properties, PartialEq, Clone)]
pub struct CheckoutVposProps {
    pub process_id: AttrValue,
    #[prop_or_default]
    pub styles: StyleMap,
    #[prop_or_default]
    pub mode: VposMode,
    #[prop_or_default]
    pub reload: u32,
    #[prop_or_default]
    pub on_success: Callback<String>,
    #[prop_or_default]
    pub on_failure: Callback<String>,
}

/// Embedded vPOS payment checkout form.
#[function_component(CheckoutVpos)]
pub fn checkout_vpos(props: &CheckoutVposProps) -> Html {
    let delegate = use_memo(
        (props.on_success.clone(), props.on_failure.clone()),
        |(on_success, on_failure)| CheckoutCallbacks {
            on_success: on_success.clone(),
            on_failure: on_failure.clone(),
        },
    );
    let weak = Rc::downgrade(&delegate);
    let weak: Weak<dyn CheckoutVposDelegate> = weak;
    let request = load_request(props.mode, &props.process_id, &props.styles, props.reload);
    let frame = use_vpos_bridge::<Checkout>(request, weak);

    html! { <VposFrame {frame} title="vPOS checkout" /> }
}
