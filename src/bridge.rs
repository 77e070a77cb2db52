//! bridge.rs
//!
//! The message bridge between an embedded vPOS form and the host application.
//!
//! A [`Bridge`] owns the endpoint mode and a non-owning reference to the host's
//! delegate. It drives a [`WebSurface`] to the form URL and turns the script
//! messages posted back by the form into exactly one delegate call, or none.
//!
//! # Example Usage
//! ```rust
//! use std::rc::{Rc, Weak};
//! use yew_vpos::{CheckoutBridge, CheckoutVposDelegate, ScriptMessage, VposMode};
//!
//! struct Printer;
//!
//! impl CheckoutVposDelegate for Printer {
//!     fn payment_success(&self, return_url: &str) {
//!         println!("paid, continue at {return_url}");
//!     }
//!     fn payment_failed(&self, return_url: &str) {
//!         println!("not paid, continue at {return_url}");
//!     }
//! }
//!
//! let printer = Rc::new(Printer);
//! let delegate = Rc::downgrade(&printer);
//! let delegate: Weak<dyn CheckoutVposDelegate> = delegate;
//! let bridge = CheckoutBridge::new(VposMode::Sandbox);
//! bridge.set_delegate(delegate);
//!
//! bridge.handle_message(&ScriptMessage {
//!     name: "callbackHandler".into(),
//!     body: serde_json::json!({
//!         "payload": { "message": "payment_success", "return_url": "https://shop.example/ok" }
//!     }),
//! });
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Weak;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::FormUrlError;
use crate::vpos::{
    decode_card, decode_checkout, CardOutcome, CheckoutOutcome, FormVariant, StyleMap, VposMode,
    CALLBACK_HANDLER, CARD_FORM, CHECKOUT_FORM,
};

/// Something that can display a web page, such as an iframe.
pub trait WebSurface {
    fn navigate(&self, url: &Url);
}

/// A named message posted by the script running inside the web surface.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScriptMessage {
    /// Handler the script posted to.
    pub name: String,
    #[serde(default)]
    pub body: JsonValue,
}

/// Receives the outcome of the card registration form.
pub trait CardVposDelegate {
    fn card_creation_success(&self, return_url: &str);
    fn card_creation_failed(&self, details: &str, return_url: &str);
}

/// Receives the outcome of the payment checkout form.
pub trait CheckoutVposDelegate {
    fn payment_success(&self, return_url: &str);
    fn payment_failed(&self, return_url: &str);
}

/// Ties a [`FormVariant`] to its outcome type and delegate interface.
pub trait VposForm: 'static {
    type Delegate: ?Sized + 'static;
    type Outcome: fmt::Debug;

    const FORM: FormVariant;

    fn decode(body: &JsonValue) -> Option<Self::Outcome>;
    fn is_success(outcome: &Self::Outcome) -> bool;
    fn dispatch(delegate: &Self::Delegate, outcome: Self::Outcome);
}

/// Card registration flow.
#[derive(Debug)]
pub enum Card {}

/// Payment checkout flow.
#[derive(Debug)]
pub enum Checkout {}

impl VposForm for Card {
    type Delegate = dyn CardVposDelegate;
    type Outcome = CardOutcome;

    const FORM: FormVariant = CARD_FORM;

    fn decode(body: &JsonValue) -> Option<CardOutcome> {
        decode_card(body)
    }

    fn is_success(outcome: &CardOutcome) -> bool {
        matches!(outcome, CardOutcome::Success { .. })
    }

    fn dispatch(delegate: &dyn CardVposDelegate, outcome: CardOutcome) {
        match outcome {
            CardOutcome::Success { return_url } => delegate.card_creation_success(&return_url),
            CardOutcome::Failure {
                details,
                return_url,
            } => delegate.card_creation_failed(&details, &return_url),
        }
    }
}

impl VposForm for Checkout {
    type Delegate = dyn CheckoutVposDelegate;
    type Outcome = CheckoutOutcome;

    const FORM: FormVariant = CHECKOUT_FORM;

    fn decode(body: &JsonValue) -> Option<CheckoutOutcome> {
        decode_checkout(body)
    }

    fn is_success(outcome: &CheckoutOutcome) -> bool {
        matches!(outcome, CheckoutOutcome::Success { .. })
    }

    fn dispatch(delegate: &dyn CheckoutVposDelegate, outcome: CheckoutOutcome) {
        match outcome {
            CheckoutOutcome::Success { return_url } => delegate.payment_success(&return_url),
            CheckoutOutcome::Failure { return_url } => delegate.payment_failed(&return_url),
        }
    }
}

/// Where a bridge is in its session.
///
/// Informational only: terminal states do not stop later messages from being
/// dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BridgeState {
    #[default]
    Idle,
    Loaded,
    Succeeded,
    Failed,
}

/// Message bridge for one form session.
pub struct Bridge<F: VposForm> {
    mode: Cell<VposMode>,
    delegate: RefCell<Option<Weak<F::Delegate>>>,
    state: Cell<BridgeState>,
}

pub type CardBridge = Bridge<Card>;
pub type CheckoutBridge = Bridge<Checkout>;

impl<F: VposForm> Bridge<F> {
    pub fn new(mode: VposMode) -> Self {
        Self {
            mode: Cell::new(mode),
            delegate: RefCell::new(None),
            state: Cell::new(BridgeState::Idle),
        }
    }

    pub fn mode(&self) -> VposMode {
        self.mode.get()
    }

    /// Takes effect on the next [`Bridge::load`].
    pub fn set_mode(&self, mode: VposMode) {
        self.mode.set(mode);
    }

    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    /// Register the delegate. The bridge never keeps it alive.
    pub fn set_delegate(&self, delegate: Weak<F::Delegate>) {
        *self.delegate.borrow_mut() = Some(delegate);
    }

    pub fn clear_delegate(&self) {
        self.delegate.borrow_mut().take();
    }

    /// URL that opens this bridge's form for `process_id` in the current mode.
    pub fn form_url(&self, process_id: &str, styles: &StyleMap) -> Result<Url, FormUrlError> {
        F::FORM.form_url(self.mode(), process_id, styles)
    }

    /// Navigate `surface` to the form for `process_id`.
    ///
    /// A URL that cannot be built is logged and nothing is loaded; whether the
    /// page itself loads is only ever reported through script messages.
    pub fn load<S>(&self, surface: &S, process_id: &str, styles: &StyleMap)
    where
        S: WebSurface + ?Sized,
    {
        match self.form_url(process_id, styles) {
            Ok(url) => {
                tracing::info!(form = F::FORM.name, mode = %self.mode(), %url, "loading vPOS form");
                surface.navigate(&url);
                self.state.set(BridgeState::Loaded);
            }
            Err(err) => {
                tracing::warn!(form = F::FORM.name, error = %err, "not loading vPOS form");
            }
        }
    }

    /// Whether `origin` is where this bridge's form is served from in the
    /// current mode.
    pub fn accepts_origin(&self, origin: &str) -> bool {
        F::FORM.origin(self.mode()).is_some_and(|own| own == origin)
    }

    /// [`Bridge::handle_message`] for a message posted from `origin`.
    ///
    /// Messages from any origin other than the form's own are dropped.
    pub fn handle_message_from(&self, origin: &str, message: &ScriptMessage) {
        if !self.accepts_origin(origin) {
            tracing::debug!(form = F::FORM.name, %origin, "ignoring message from a foreign origin");
            return;
        }
        self.handle_message(message);
    }

    /// Decode a script message and notify the delegate.
    ///
    /// Messages for other handlers and bodies that do not decode are dropped
    /// without a trace outside the logs. Every decoded message is dispatched,
    /// repeats included.
    pub fn handle_message(&self, message: &ScriptMessage) {
        if message.name != CALLBACK_HANDLER {
            tracing::debug!(form = F::FORM.name, handler = %message.name, "ignoring message for another handler");
            return;
        }
        let Some(outcome) = F::decode(&message.body) else {
            return;
        };

        self.state.set(if F::is_success(&outcome) {
            BridgeState::Succeeded
        } else {
            BridgeState::Failed
        });

        // Released before dispatch so the delegate may re-register itself.
        let delegate = self.delegate.borrow().as_ref().and_then(Weak::upgrade);
        match delegate {
            Some(delegate) => {
                tracing::info!(form = F::FORM.name, ?outcome, "dispatching vPOS outcome");
                F::dispatch(&*delegate, outcome);
            }
            None => {
                tracing::warn!(form = F::FORM.name, ?outcome, "vPOS outcome has no live delegate");
            }
        }
    }
}

impl<F: VposForm> Default for Bridge<F> {
    fn default() -> Self {
        Self::new(VposMode::default())
    }
}

impl<F: VposForm> fmt::Debug for Bridge<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("form", &F::FORM.name)
            .field("mode", &self.mode())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
