use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use lockbox_crypto::{decrypt_json, encrypt_json, open, seal, Envelope, SecretKey};

fn record_strategy() -> impl Strategy<Value = serde_json::Value> {
    (
        "[a-zA-Z0-9 ]{1,24}",
        proptest::option::of("[a-z0-9@.]{1,24}"),
        vec("#[a-z-]{1,8}", 0..4),
        any::<bool>(),
        btree_map("[a-z]{1,6}", "[ -~]{0,12}", 0..3),
    )
        .prop_map(|(title, username, tags, favorite, extra)| {
            let mut value = serde_json::json!({
                "title": title,
                "username": username,
                "tags": tags,
                "favorite": favorite,
            });
            if let Some(object) = value.as_object_mut() {
                for (key, field) in extra {
                    object.insert(format!("x_{key}"), serde_json::Value::String(field));
                }
            }
            value
        })
}

proptest! {
    #[test]
    fn envelope_roundtrip(plaintext in vec(any::<u8>(), 0..512), aad in vec(any::<u8>(), 0..64)) {
        let key = SecretKey::generate();
        let envelope = seal(&key, &plaintext, &aad).expect("seal");
        let parsed = Envelope::from_bytes(&envelope.to_bytes()).expect("parse");
        let opened = open(&key, &parsed, &aad).expect("open");
        prop_assert_eq!(opened, plaintext);
    }

    #[test]
    fn json_roundtrip(record in record_strategy()) {
        let key = SecretKey::generate();
        let sealed = encrypt_json(&record, &key).expect("encrypt");
        let opened: serde_json::Value = decrypt_json(&sealed, &key).expect("decrypt");
        prop_assert_eq!(opened, record);
    }

    #[test]
    fn wrong_key_never_yields_the_record(record in record_strategy()) {
        let key = SecretKey::generate();
        let other = SecretKey::generate();
        let sealed = encrypt_json(&record, &key).expect("encrypt");
        let opened = decrypt_json::<serde_json::Value>(&sealed, &other);
        prop_assert!(opened.is_err());
    }
}
