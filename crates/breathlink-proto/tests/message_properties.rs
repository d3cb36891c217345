//! Property-based tests for message encoding and validation.
//!
//! Verifies that the wire round-trip and the validator agree for ALL valid
//! inputs, not just specific examples, and that the validator never accepts
//! a test-mode command without a positive duration.

use breathlink_proto::{
    CommandRequest, Mode, ResponseMessage, validate_auth, validate_command,
};
use proptest::prelude::*;

/// Strategy for generating arbitrary valid command requests.
fn arbitrary_command() -> impl Strategy<Value = CommandRequest> {
    prop_oneof![
        (1u64..=10_000).prop_map(CommandRequest::test),
        Just(CommandRequest::rehab()),
        Just(CommandRequest::stop()),
        Just(CommandRequest::close()),
    ]
}

/// Strategy for response codes the protocol actually uses.
fn arbitrary_code() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(breathlink_proto::code::OK),
        Just(breathlink_proto::code::MODE_COMPLETED),
        Just(breathlink_proto::code::MODE_INTERRUPTED),
        Just(breathlink_proto::code::BAD_REQUEST),
        Just(breathlink_proto::code::TOKEN_NOT_FOUND),
        Just(breathlink_proto::code::NOT_READY),
        Just(breathlink_proto::code::SERVER_DOWN),
    ]
}

proptest! {
    /// Encoding a response and decoding the bytes yields an equal structure.
    #[test]
    fn response_round_trip(code in arbitrary_code(), msg in ".{0,64}") {
        let original = ResponseMessage::new(code, msg);
        let encoded = serde_json::to_vec(&original).unwrap();
        let decoded: ResponseMessage = serde_json::from_slice(&encoded).unwrap();
        prop_assert_eq!(original, decoded);
    }

    /// Every command the typed constructors can build passes validation and
    /// comes back unchanged.
    #[test]
    fn validator_accepts_all_typed_commands(cmd in arbitrary_command()) {
        let wire = serde_json::to_value(&cmd).unwrap();
        let accepted = validate_command(&wire).unwrap();
        prop_assert_eq!(cmd, accepted);
    }

    /// Test mode with a non-positive duration is always rejected.
    #[test]
    fn validator_rejects_non_positive_test_time(time in -10_000i64..=0) {
        let payload = serde_json::json!({"type": "mode", "mode": "test", "time": time});
        let err = validate_command(&payload).unwrap_err();
        prop_assert_eq!(err.field, "time");
    }

    /// Auth validation accepts any string token and returns it verbatim;
    /// matching against the session token happens elsewhere.
    #[test]
    fn validator_passes_tokens_through(token in "[A-Z0-9]{1,12}") {
        let payload = serde_json::json!({"type": "auth", "token": token.clone()});
        let req = validate_auth(&payload).unwrap();
        prop_assert_eq!(req.token, token);
    }
}

#[test]
fn rehab_time_is_optional_but_checked() {
    let ok = serde_json::json!({"type": "mode", "mode": "rehab", "time": 3});
    assert_eq!(validate_command(&ok).unwrap().mode, Some(Mode::Rehab));

    let bad = serde_json::json!({"type": "mode", "mode": "rehab", "time": 0});
    assert_eq!(validate_command(&bad).unwrap_err().field, "time");
}
