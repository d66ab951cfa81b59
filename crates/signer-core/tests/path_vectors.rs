//! Derivation path encoding vectors and properties.
//!
//! The vectors pin the 20-byte wire layout of well-known Stacks paths and the
//! error kind of every malformed input.

// Silence unused crate dependency warnings for test binary
use async_trait as _;
use k256 as _;
use thiserror as _;
use tokio as _;
use tracing as _;
use tracing_subscriber as _;

use ledger_stacks_signer_core::Error;
use ledger_stacks_signer_core::path::{DerivationPath, HARDENED, serialize_path};
use proptest::prelude::*;
use serde::Deserialize;

#[derive(Deserialize)]
struct TestVector {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Path")]
    path: String,
    #[serde(rename = "Expected")]
    expected: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::InvalidInput(_) => "InvalidInput",
        Error::MalformedPath(_) => "MalformedPath",
        Error::InvalidComponent { .. } => "InvalidComponent",
        Error::ComponentOutOfRange { .. } => "ComponentOutOfRange",
        _ => "Other",
    }
}

#[test]
fn test_path_vectors() {
    let json_data = include_str!("path_vectors.json");
    let vectors: Vec<TestVector> =
        serde_json::from_str(json_data).expect("Failed to parse test vectors JSON");

    let mut failed = 0;

    for vector in &vectors {
        let result = serialize_path(&vector.path);
        let ok = match (&result, &vector.expected, &vector.error) {
            (Ok(buf), Some(expected), None) => hex::encode(buf) == *expected,
            (Err(err), None, Some(kind)) => error_kind(err) == kind,
            _ => false,
        };

        if !ok {
            failed += 1;
            eprintln!("FAILED: {} - got {result:?}", vector.name);
        }
    }

    assert_eq!(failed, 0, "Some test vectors failed");
}

#[test]
fn invalid_component_names_token() {
    let err = serialize_path("m/44'/abc/5'/0/3").unwrap_err();
    assert!(err.to_string().contains("\"abc\""));
}

fn component() -> impl Strategy<Value = (u32, bool)> {
    (0..HARDENED, any::<bool>())
}

fn render(components: &[(u32, bool)]) -> String {
    let mut path = String::from("m");
    for (index, hardened) in components {
        path.push_str(&format!("/{index}{}", if *hardened { "'" } else { "" }));
    }
    path
}

proptest! {
    #[test]
    fn prop_encoding_recovers_components(components in prop::collection::vec(component(), 5)) {
        let text = render(&components);
        let buf = serialize_path(&text).expect("valid path must encode");

        for (chunk, (index, hardened)) in buf.chunks_exact(4).zip(&components) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            prop_assert_eq!(word & !HARDENED, *index);
            prop_assert_eq!(word & HARDENED != 0, *hardened);
        }
    }

    #[test]
    fn prop_encoding_is_deterministic(components in prop::collection::vec(component(), 5)) {
        let text = render(&components);
        prop_assert_eq!(serialize_path(&text).unwrap(), serialize_path(&text).unwrap());
    }

    #[test]
    fn prop_display_roundtrip(components in prop::collection::vec(component(), 5)) {
        let text = render(&components);
        let path: DerivationPath = text.parse().unwrap();
        prop_assert_eq!(path.to_string(), text);
        prop_assert_eq!(DerivationPath::from_encoded(&path.encode()), path);
    }

    #[test]
    fn prop_wrong_component_count_is_malformed(count in 0usize..12) {
        prop_assume!(count != 5);
        let text = render(&vec![(0, false); count]);
        let err = serialize_path(&text).unwrap_err();
        prop_assert!(matches!(err, Error::MalformedPath(_)));
    }
}
