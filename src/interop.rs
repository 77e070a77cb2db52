//! interop.rs
//!
//! Browser plumbing between a vPOS `<iframe>` and the message bridge.
//!
//! # Overview
//! The bootstrap script running inside the frame posts every form event to the
//! parent window as
//!
//! ```js
//! window.parent.postMessage({ name: "callbackHandler", body: { payload: { ... } } }, "*");
//! ```
//!
//! `use_script_messages()` listens for those `message` events while the calling
//! component is mounted and hands over the ones sent by its own frame, together
//! with their origin.
//! `IframeSurface` is the [`WebSurface`] a bridge navigates.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_vpos::{use_script_messages, FrameMessage};
//!
//! #[function_component(Listener)]
//! fn listener() -> Html {
//!     let frame = use_node_ref();
//!     let on_message = use_callback((), |event: FrameMessage, _| {
//!         tracing::info!(origin = %event.origin, message = ?event.message, "script message");
//!     });
//!     use_script_messages(frame.clone(), on_message);
//!     html! { <iframe ref={frame} /> }
//! }
//! ```

use gloo_utils::format::JsValueSerdeExt;
use url::Url;
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::{HtmlIFrameElement, MessageEvent};
use yew::functional::hook;
use yew::prelude::*;

use crate::bridge::{ScriptMessage, WebSurface};

/// A [`WebSurface`] backed by an `<iframe>` element.
#[derive(Clone, Debug)]
pub struct IframeSurface {
    frame: HtmlIFrameElement,
}

impl IframeSurface {
    pub fn new(frame: HtmlIFrameElement) -> Self {
        Self { frame }
    }
}

impl WebSurface for IframeSurface {
    fn navigate(&self, url: &Url) {
        self.frame.set_src(url.as_str());
    }
}

/// A [`ScriptMessage`] together with the origin it was posted from.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameMessage {
    pub origin: String,
    pub message: ScriptMessage,
}

/// True only when a message's `source` is the frame's own window.
///
/// A frame that is not mounted, or an event without a source, never matches.
pub fn is_from_frame<T>(frame_window: Option<&T>, source: Option<&T>) -> bool
where
    T: PartialEq + ?Sized,
{
    matches!((frame_window, source), (Some(own), Some(source)) if own == source)
}

/// Custom hook: deliver the `message` events posted by `frame` as
/// [`FrameMessage`]s.
///
/// Events sent by any other window, including other vPOS frames on the page,
/// are skipped, as are events whose data is not a `{ name, body }` object. The
/// listener is removed when the component unmounts or an argument changes.
#[hook]
pub fn use_script_messages(frame: NodeRef, on_message: Callback<FrameMessage>) {
    use_effect_with((frame, on_message), |(frame, on_message)| {
        let frame = frame.clone();
        let on_message = on_message.clone();
        let listener = Closure::<dyn Fn(MessageEvent)>::new(move |event: MessageEvent| {
            let frame_window = frame
                .cast::<HtmlIFrameElement>()
                .and_then(|element| element.content_window())
                .map(JsValue::from);
            let source = event.source().map(JsValue::from);
            if !is_from_frame(frame_window.as_ref(), source.as_ref()) {
                tracing::debug!(origin = %event.origin(), "skipping message from another window");
                return;
            }
            match event.data().into_serde::<ScriptMessage>() {
                Ok(message) => on_message.emit(FrameMessage {
                    origin: event.origin(),
                    message,
                }),
                Err(err) => tracing::debug!(error = %err, "skipping window message"),
            }
        });

        let window = web_sys::window();
        match &window {
            Some(window) => {
                if let Err(err) = window
                    .add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
                {
                    tracing::warn!(error = ?err, "could not listen for script messages");
                }
            }
            None => tracing::warn!("no window to listen for script messages on"),
        }

        // Keeps `listener` alive until the listener is removed.
        move || {
            if let Some(window) = window {
                if let Err(err) = window
                    .remove_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
                {
                    tracing::warn!(error = ?err, "could not stop listening for script messages");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_frames_own_window_is_accepted() {
        let own = "checkout-frame";
        let other = "card-frame";
        assert!(is_from_frame(Some(own), Some(own)));
        assert!(!is_from_frame(Some(own), Some(other)));
        assert!(!is_from_frame(Some(own), None));
        assert!(!is_from_frame(None, Some(own)));
        assert!(!is_from_frame::<str>(None, None));
    }
}
