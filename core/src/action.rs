//! Action type naming and the wire record of a dispatched action
//!
//! Remote operations follow a three-phase protocol: a `*_REQUEST` action when
//! the call starts, then `*_SUCCESS` or `*_FAILURE` when it settles.
//! [`RequestTypes`] derives the three names from one base so every operation
//! spells them the same way.
//!
//! Every action can also be rendered as an [`ActionRecord`], the
//! `{type, payload, error, subType}` shape used for logging and for anything
//! that inspects the dispatch stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The request/success/failure names of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestTypes {
    /// `BASE_REQUEST`
    pub request: String,
    /// `BASE_SUCCESS`
    pub success: String,
    /// `BASE_FAILURE`
    pub failure: String,
}

impl RequestTypes {
    /// Derive the three names for `base`.
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            request: format!("{base}_REQUEST"),
            success: format!("{base}_SUCCESS"),
            failure: format!("{base}_FAILURE"),
        }
    }

    /// All three names in protocol order.
    #[must_use]
    pub fn names(&self) -> [&str; 3] {
        [&self.request, &self.success, &self.failure]
    }
}

/// A dispatched action in wire form.
///
/// `error` is omitted when false and `subType` only appears on actions that
/// target one of several sub-slices (for example `MY` or `OTHER` profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Action type string
    #[serde(rename = "type")]
    pub action_type: String,

    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Marks a failure action
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,

    /// Optional sub-slice discriminator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl ActionRecord {
    /// A record with only a type.
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            error: false,
            sub_type: None,
        }
    }

    /// A failure record carrying the error message as payload.
    #[must_use]
    pub fn failure(action_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Some(Value::String(message.into())),
            error: true,
            sub_type: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach a sub-type.
    #[must_use]
    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn request_types_append_suffixes() {
        let types = RequestTypes::new("GET_APPS");
        assert_eq!(types.request, "GET_APPS_REQUEST");
        assert_eq!(types.success, "GET_APPS_SUCCESS");
        assert_eq!(types.failure, "GET_APPS_FAILURE");
        assert_eq!(types, RequestTypes::new("GET_APPS"));
    }

    #[test]
    fn record_omits_defaults() {
        let record = ActionRecord::new("SET_APPS").with_payload(json!([{"id": 1}]));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"type": "SET_APPS", "payload": [{"id": 1}]}));
    }

    #[test]
    fn failure_record_sets_error_flag() {
        let record = ActionRecord::failure("GET_FEED_FAILURE", "timeout");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"type": "GET_FEED_FAILURE", "payload": "timeout", "error": true})
        );
    }

    #[test]
    fn sub_type_is_camel_cased() {
        let record = ActionRecord::new("user/SET_USER_PROFILE").with_sub_type("OTHER");
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.contains("\"subType\":\"OTHER\""));

        let back: ActionRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn names_are_distinct_and_keep_the_base(base in "[A-Z][A-Z_]{0,20}") {
                let types = RequestTypes::new(&base);
                let [request, success, failure] = types.names();

                prop_assert!(request.starts_with(&base));
                prop_assert!(success.starts_with(&base));
                prop_assert!(failure.starts_with(&base));
                prop_assert_ne!(request, success);
                prop_assert_ne!(success, failure);
                prop_assert_ne!(request, failure);
            }

            #[test]
            fn different_bases_never_collide(a in "[A-Z]{1,12}", b in "[A-Z]{1,12}") {
                prop_assume!(a != b);
                let (ta, tb) = (RequestTypes::new(&a), RequestTypes::new(&b));
                for name in ta.names() {
                    prop_assert!(!tb.names().contains(&name));
                }
            }
        }
    }
}
