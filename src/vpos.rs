//! vpos.rs
//!
//! Fixed configuration and wire format of the vPOS forms.
//!
//! This module provides:
//! - `VposMode` to pick between the sandbox and production endpoints.
//! - `FormVariant` records for the two hosted flows (`CARD_FORM`, `CHECKOUT_FORM`).
//! - `FormVariant::form_url()` to build the URL the embedded frame navigates to.
//! - `decode_card()` / `decode_checkout()` to turn a script message body into a
//!   typed outcome, or nothing at all when the body is not understood.
//!
//! # Example Usage
//! ```rust
//! use yew_vpos::{CheckoutOutcome, StyleMap, VposMode, CHECKOUT_FORM, decode_checkout};
//!
//! let mut styles = StyleMap::new();
//! styles.insert("form-background-color".into(), "#12d431".into());
//! let url = CHECKOUT_FORM.form_url(VposMode::Sandbox, "1234", &styles).unwrap();
//! assert_eq!(url.port(), Some(8888));
//!
//! let body = serde_json::json!({
//!     "payload": { "message": "payment_success", "return_url": "https://shop.example/ok" }
//! });
//! assert_eq!(
//!     decode_checkout(&body),
//!     Some(CheckoutOutcome::Success { return_url: "https://shop.example/ok".into() })
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::{FormUrlError, ParseModeError};

/// Name of the script message handler the bootstrap script posts to.
pub const CALLBACK_HANDLER: &str = "callbackHandler";

/// Keys used on the wire, in both directions.
pub mod keys {
    pub const PAYLOAD: &str = "payload";
    pub const MESSAGE: &str = "message";
    pub const RETURN_URL: &str = "return_url";
    pub const RETURN_URL_ALIAS: &str = "returnURL";
    pub const DETAILS: &str = "details";
    pub const PROCESS_ID: &str = "process_id";
    pub const STYLES: &str = "styles";
    pub const PAYMENT_SUCCESS: &str = "payment_success";
    pub const CREATION_SUCCESS: &str = "add_new_card_success";
}

/// Custom form styles, e.g. `"form-background-color" -> "#12d431"`.
pub type StyleMap = BTreeMap<String, String>;

/// Endpoint selection for a vPOS form.
///
/// Only the consumed services change between modes; the form behaves the same.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VposMode {
    /// Uses the sandbox base URLs.
    Sandbox,
    /// Uses the production base URLs.
    #[default]
    Production,
}

impl VposMode {
    pub fn as_str(self) -> &'static str {
        match self {
            VposMode::Sandbox => "sandbox",
            VposMode::Production => "production",
        }
    }
}

impl fmt::Display for VposMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VposMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(VposMode::Sandbox),
            "production" => Ok(VposMode::Production),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

/// One of the two hosted vPOS flows: its endpoints and its success tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormVariant {
    /// Short name used in logs.
    pub name: &'static str,
    pub production_base_url: &'static str,
    pub sandbox_base_url: &'static str,
    /// The only `payload.message` value treated as a success.
    pub success_tag: &'static str,
}

/// Card registration form.
pub const CARD_FORM: FormVariant = FormVariant {
    name: "card",
    production_base_url: "https://vpos.infonet.com.py/checkout/register_card/new?",
    sandbox_base_url: "https://vpos.infonet.com.py:8888/checkout/register_card/new?",
    success_tag: keys::CREATION_SUCCESS,
};

/// Payment checkout form.
pub const CHECKOUT_FORM: FormVariant = FormVariant {
    name: "checkout",
    production_base_url: "https://vpos.infonet.com.py/checkout/new?",
    sandbox_base_url: "https://vpos.infonet.com.py:8888/checkout/new?",
    success_tag: keys::PAYMENT_SUCCESS,
};

impl FormVariant {
    /// Base URL for the given mode.
    pub fn base_url(&self, mode: VposMode) -> &'static str {
        match mode {
            VposMode::Production => self.production_base_url,
            VposMode::Sandbox => self.sandbox_base_url,
        }
    }

    /// Origin (`scheme://host[:port]`) the form is served from in `mode`.
    pub fn origin(&self, mode: VposMode) -> Option<String> {
        Url::parse(self.base_url(mode))
            .ok()
            .map(|url| url.origin().ascii_serialization())
    }

    /// Build the URL that opens this form for `process_id`.
    ///
    /// The id and the pretty-printed styles are sent as percent-encoded
    /// `process_id` and `styles` query parameters. If the styles cannot be
    /// serialized only the `styles` parameter is left out.
    ///
    /// # Errors
    ///
    /// Returns `FormUrlError::InvalidBaseUrl` if the base URL does not parse.
    pub fn form_url(
        &self,
        mode: VposMode,
        process_id: &str,
        styles: &StyleMap,
    ) -> Result<Url, FormUrlError> {
        let base = self.base_url(mode);
        let mut url = Url::parse(base)
            .map_err(|source| FormUrlError::InvalidBaseUrl { url: base, source })?;
        url.set_query(None);

        let styles = serialize_styles(styles);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(keys::PROCESS_ID, process_id);
            match &styles {
                Ok(styles) => {
                    query.append_pair(keys::STYLES, styles);
                }
                Err(err) => {
                    tracing::warn!(form = self.name, error = %err, "omitting styles from form URL");
                }
            }
        }
        Ok(url)
    }
}

/// Pretty-printed JSON object of the styles.
pub fn serialize_styles(styles: &StyleMap) -> Result<String, FormUrlError> {
    Ok(serde_json::to_string_pretty(styles)?)
}

/// Result of the card registration form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardOutcome {
    Success { return_url: String },
    Failure { details: String, return_url: String },
}

/// Result of the payment checkout form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Success { return_url: String },
    Failure { return_url: String },
}

struct Payload<'a> {
    message: &'a str,
    return_url: &'a str,
    details: Option<&'a str>,
}

/// Pull the payload fields out of a message body.
///
/// Both the body and `payload` must be JSON objects holding string `message`
/// and `return_url` fields; `returnURL` is read only when `return_url` is absent.
fn decode_payload<'a>(form: &FormVariant, body: &'a JsonValue) -> Option<Payload<'a>> {
    let payload = body
        .as_object()
        .and_then(|body| body.get(keys::PAYLOAD))
        .and_then(JsonValue::as_object);
    let Some(payload) = payload else {
        tracing::debug!(form = form.name, "dropping vPOS message without a payload object");
        return None;
    };

    let message = payload.get(keys::MESSAGE).and_then(JsonValue::as_str);
    let return_url = payload
        .get(keys::RETURN_URL)
        .or_else(|| payload.get(keys::RETURN_URL_ALIAS))
        .and_then(JsonValue::as_str);
    match (message, return_url) {
        (Some(message), Some(return_url)) => Some(Payload {
            message,
            return_url,
            details: payload.get(keys::DETAILS).and_then(JsonValue::as_str),
        }),
        _ => {
            tracing::debug!(form = form.name, "dropping vPOS message without message or return_url");
            None
        }
    }
}

/// Decode a card registration message body.
///
/// Anything other than the success tag is a failure; `details` falls back to
/// an empty string when missing or not a string.
pub fn decode_card(body: &JsonValue) -> Option<CardOutcome> {
    let payload = decode_payload(&CARD_FORM, body)?;
    let return_url = payload.return_url.to_owned();
    if payload.message == CARD_FORM.success_tag {
        return Some(CardOutcome::Success { return_url });
    }
    Some(CardOutcome::Failure {
        details: payload.details.unwrap_or_default().to_owned(),
        return_url,
    })
}

/// Decode a payment checkout message body.
pub fn decode_checkout(body: &JsonValue) -> Option<CheckoutOutcome> {
    let payload = decode_payload(&CHECKOUT_FORM, body)?;
    let return_url = payload.return_url.to_owned();
    if payload.message == CHECKOUT_FORM.success_tag {
        Some(CheckoutOutcome::Success { return_url })
    } else {
        Some(CheckoutOutcome::Failure { return_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn query_param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn base_url_follows_mode() {
        for form in [CARD_FORM, CHECKOUT_FORM] {
            assert_eq!(form.base_url(VposMode::Sandbox), form.sandbox_base_url);
            assert_eq!(form.base_url(VposMode::Production), form.production_base_url);

            let sandbox = form.form_url(VposMode::Sandbox, "1", &StyleMap::new()).unwrap();
            let production = form.form_url(VposMode::Production, "1", &StyleMap::new()).unwrap();
            assert_eq!(sandbox.host_str(), Some("vpos.infonet.com.py"));
            assert_eq!(sandbox.port(), Some(8888));
            assert_eq!(production.host_str(), Some("vpos.infonet.com.py"));
            assert_eq!(production.port(), None);
        }
    }

    #[test]
    fn origin_follows_mode() {
        for form in [CARD_FORM, CHECKOUT_FORM] {
            assert_eq!(
                form.origin(VposMode::Sandbox).as_deref(),
                Some("https://vpos.infonet.com.py:8888")
            );
            assert_eq!(
                form.origin(VposMode::Production).as_deref(),
                Some("https://vpos.infonet.com.py")
            );
        }
    }

    #[test]
    fn form_urls_keep_their_paths() {
        let card = CARD_FORM.form_url(VposMode::Production, "abc", &StyleMap::new()).unwrap();
        let checkout = CHECKOUT_FORM.form_url(VposMode::Production, "abc", &StyleMap::new()).unwrap();
        assert_eq!(card.path(), "/checkout/register_card/new");
        assert_eq!(checkout.path(), "/checkout/new");
    }

    #[test]
    fn empty_styles_still_sent() {
        let url = CHECKOUT_FORM.form_url(VposMode::Sandbox, "42", &StyleMap::new()).unwrap();
        assert_eq!(query_param(&url, keys::PROCESS_ID).as_deref(), Some("42"));
        assert_eq!(query_param(&url, keys::STYLES).as_deref(), Some("{}"));
    }

    #[test]
    fn process_id_is_escaped() {
        let url = CARD_FORM
            .form_url(VposMode::Production, "a&styles=x y#frag", &StyleMap::new())
            .unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(
            query_param(&url, keys::PROCESS_ID).as_deref(),
            Some("a&styles=x y#frag")
        );
        assert_eq!(url.query_pairs().filter(|(k, _)| k == keys::STYLES).count(), 1);
    }

    #[test]
    fn styles_are_pretty_printed() {
        let mut styles = StyleMap::new();
        styles.insert("form-background-color".into(), "#12d431".into());
        let serialized = serialize_styles(&styles).unwrap();
        assert!(serialized.contains('\n'));
        assert_eq!(
            serde_json::from_str::<StyleMap>(&serialized).unwrap(),
            styles
        );
    }

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("sandbox".parse::<VposMode>(), Ok(VposMode::Sandbox));
        assert_eq!(" Production ".parse::<VposMode>(), Ok(VposMode::Production));
        assert!("staging".parse::<VposMode>().is_err());
        assert_eq!(VposMode::default(), VposMode::Production);
        assert_eq!(
            serde_json::from_value::<VposMode>(json!("sandbox")).unwrap(),
            VposMode::Sandbox
        );
        assert_eq!(VposMode::Sandbox.to_string(), "sandbox");
    }

    #[test]
    fn card_success() {
        let body = json!({ "payload": { "message": "add_new_card_success", "return_url": "X" } });
        assert_eq!(
            decode_card(&body),
            Some(CardOutcome::Success { return_url: "X".into() })
        );
    }

    #[test]
    fn card_failure_carries_details() {
        let body = json!({ "payload": { "message": "bogus", "return_url": "X", "details": "D" } });
        assert_eq!(
            decode_card(&body),
            Some(CardOutcome::Failure { details: "D".into(), return_url: "X".into() })
        );
    }

    #[test]
    fn card_failure_details_default_to_empty() {
        let missing = json!({ "payload": { "message": "bogus", "return_url": "X" } });
        let mistyped = json!({ "payload": { "message": "bogus", "return_url": "X", "details": 7 } });
        let expected = Some(CardOutcome::Failure { details: String::new(), return_url: "X".into() });
        assert_eq!(decode_card(&missing), expected);
        assert_eq!(decode_card(&mistyped), expected);
    }

    #[test]
    fn checkout_success_tag_is_the_only_success() {
        let ok = json!({ "payload": { "message": "payment_success", "return_url": "X" } });
        assert_eq!(
            decode_checkout(&ok),
            Some(CheckoutOutcome::Success { return_url: "X".into() })
        );

        // The card success tag means nothing to the checkout form.
        for message in ["payment_failed", "", "add_new_card_success", "PAYMENT_SUCCESS"] {
            let body = json!({ "payload": { "message": message, "return_url": "X" } });
            assert_eq!(
                decode_checkout(&body),
                Some(CheckoutOutcome::Failure { return_url: "X".into() })
            );
        }
    }

    #[test]
    fn return_url_alias_is_accepted() {
        let body = json!({ "payload": { "message": "payment_success", "returnURL": "X" } });
        assert_eq!(
            decode_checkout(&body),
            Some(CheckoutOutcome::Success { return_url: "X".into() })
        );
    }

    #[test]
    fn return_url_wins_over_alias() {
        let body = json!({
            "payload": { "message": "payment_success", "return_url": "X", "returnURL": "Y" }
        });
        assert_eq!(
            decode_checkout(&body),
            Some(CheckoutOutcome::Success { return_url: "X".into() })
        );

        let card = json!({
            "payload": { "message": "bogus", "return_url": "X", "returnURL": "Y", "details": "D" }
        });
        assert_eq!(
            decode_card(&card),
            Some(CardOutcome::Failure { details: "D".into(), return_url: "X".into() })
        );
    }

    #[test]
    fn sequence_shaped_bodies_are_dropped() {
        let bodies = [
            json!([["payment_success", "X"]]),
            json!([["add_new_card_success", "X"]]),
            json!([["bogus", "X", "D"]]),
            json!({ "payload": ["payment_success", "X"] }),
            json!({ "payload": ["bogus", "X", "D"] }),
            json!([{ "message": "payment_success", "return_url": "X" }]),
        ];
        for body in &bodies {
            assert_eq!(decode_card(body), None, "{body}");
            assert_eq!(decode_checkout(body), None, "{body}");
        }
    }

    #[test]
    fn malformed_bodies_are_dropped() {
        let bodies = [
            json!(null),
            json!("payment_success"),
            json!({}),
            json!({ "payload": "payment_success" }),
            json!({ "payload": { "return_url": "X" } }),
            json!({ "payload": { "message": "payment_success" } }),
            json!({ "payload": { "message": 1, "return_url": "X" } }),
            json!({ "payload": { "message": "payment_success", "return_url": null } }),
        ];
        for body in &bodies {
            assert_eq!(decode_card(body), None, "{body}");
            assert_eq!(decode_checkout(body), None, "{body}");
        }
    }

    proptest! {
        #[test]
        fn form_url_round_trips(
            process_id in ".*",
            styles in proptest::collection::btree_map(".*", ".*", 0..6),
        ) {
            for form in [CARD_FORM, CHECKOUT_FORM] {
                let url = form.form_url(VposMode::Sandbox, &process_id, &styles).unwrap();
                prop_assert_eq!(query_param(&url, keys::PROCESS_ID), Some(process_id.clone()));
                let sent = query_param(&url, keys::STYLES).unwrap();
                prop_assert_eq!(serde_json::from_str::<StyleMap>(&sent).unwrap(), styles.clone());
            }
        }
    }
}
