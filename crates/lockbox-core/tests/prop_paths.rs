use proptest::prelude::*;
use lockbox_core::{resolve_context, secret_identifier, VaultError, VaultScope};

fn scope_strategy() -> impl Strategy<Value = VaultScope> {
    (
        "[a-z0-9-]{1,16}",
        proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.[a-z]{2,3}"),
        "[0-9]{12}",
        "[a-z]{2}-[a-z]{4,7}-[1-3]",
        proptest::option::of("[a-z]{1,12}"),
    )
        .prop_map(|(user_id, email, account_id, region, department)| VaultScope {
            user_id,
            email,
            account_id: Some(account_id),
            region: Some(region),
            department,
            ..VaultScope::default()
        })
}

proptest! {
    #[test]
    fn identifiers_are_deterministic(scope in scope_strategy(), kind in prop_oneof!["personal", "work"]) {
        let first = secret_identifier(&scope, &kind).expect("identifier");
        let second = secret_identifier(&scope.clone(), &kind).expect("identifier");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn personal_identifiers_embed_user_and_never_equal_work(scope in scope_strategy()) {
        let personal = secret_identifier(&scope, "personal").expect("personal");
        let work = secret_identifier(&scope, "work").expect("work");
        let user_segment = format!("/{}/", scope.user_id);
        prop_assert!(personal.as_str().contains(&user_segment));
        prop_assert_ne!(personal, work);
    }

    #[test]
    fn unknown_kinds_are_rejected(scope in scope_strategy(), kind in "[a-z-]{1,16}") {
        prop_assume!(kind != "personal" && kind != "work");
        let result = resolve_context(&scope, &kind);
        prop_assert_eq!(result, Err(VaultError::InvalidVaultKind(kind.clone())));
    }
}
