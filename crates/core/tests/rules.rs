//! Integration tests for rule registration and token semantics.
//!
//! Exercises contracts, mutual exclusion between tokens on one member,
//! interval boundaries, collection quantifiers and caller-supplied checks
//! through the public registrar API.

use std::sync::Arc;

use serde_json::json;
use vouch_core::{
    CustomVerifyResult, FnValidator, MemberKind, MemberSet, RangeOptions, RuleToken, TokenOps,
    TypeRegistrar, ValidationError, ValidationOptions, ValidationProvider, ValidationStrategy,
    Verifiable, VerifyResult,
};

struct Account {
    handle: String,
    age: i64,
    tags: Vec<String>,
    balance: f64,
}

impl Verifiable for Account {
    fn describe(members: &mut MemberSet<Self>) {
        members.field("balance", |a: &Account| &a.balance);
        members.property("handle", |a: &Account| &a.handle);
        members.property("age", |a: &Account| &a.age);
        members.property("tags", |a: &Account| &a.tags);
    }
}

fn account() -> Account {
    Account {
        handle: "ferris".into(),
        age: 30,
        tags: vec!["crab".into()],
        balance: 12.0,
    }
}

/// Provider with annotations and custom validators switched off, so only
/// rule sets speak.
fn rules_only() -> ValidationProvider {
    ValidationProvider::new(ValidationOptions {
        annotation_enabled: false,
        custom_validator_enabled: false,
        ..ValidationOptions::default()
    })
}

// ---------------------------------------------------------------------------
// Test: contracts
// ---------------------------------------------------------------------------

/// Resolving a contract twice yields the same contract, with properties
/// listed before fields.
#[test]
fn contracts_are_cached_and_ordered() {
    let provider = ValidationProvider::default();
    let first = provider.contracts().resolve::<Account>().unwrap();
    let second = provider.contracts().resolve::<Account>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let names: Vec<_> = first.member_names().collect();
    assert_eq!(names, vec!["handle", "age", "tags", "balance"]);
    assert_eq!(first.member("balance").unwrap().kind(), MemberKind::Field);
}

/// Rule sets report in contract order regardless of registration order.
#[test]
fn failures_follow_contract_order() {
    let provider = rules_only();
    let registrar = provider.registrar();
    let rules = registrar.for_type::<Account>().unwrap();
    rules.for_member("balance").unwrap().greater_than(100);
    rules.for_member("handle").unwrap().max_length(3);
    registrar.build();

    let result = provider.resolve::<Account>().unwrap().verify(&account());
    let names: Vec<_> = result.member_names().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["handle", "balance"]);
}

// ---------------------------------------------------------------------------
// Test: mutual exclusion
// ---------------------------------------------------------------------------

/// A later token of the same exclusion group replaces the earlier one.
#[test]
fn second_exclusive_token_wins() {
    let provider = rules_only();
    let registrar = provider.registrar();
    let age = registrar
        .for_type::<Account>()
        .unwrap()
        .for_member("age")
        .unwrap();
    age.greater_than(50).greater_than_or_equal(18);
    registrar.build();

    let project = provider
        .projects()
        .try_resolve(&vouch_core::TypeKey::of::<Account>(), None)
        .unwrap();
    let ops: Vec<_> = project.rule_sets()[0].tokens().iter().map(RuleToken::ops).collect();
    assert_eq!(ops, vec![TokenOps::GreaterThanOrEqual]);

    assert!(provider.resolve::<Account>().unwrap().verify(&account()).is_valid());
}

/// A range occupies both bound groups and evicts a lone lower bound.
#[test]
fn range_replaces_single_bounds() {
    let provider = rules_only();
    let registrar = provider.registrar();
    registrar
        .for_type::<Account>()
        .unwrap()
        .for_member("age")
        .unwrap()
        .not_null()
        .greater_than(0)
        .less_than(10)
        .range(18, 65, RangeOptions::CloseInterval);
    registrar.build();

    let project = provider
        .projects()
        .try_resolve(&vouch_core::TypeKey::of::<Account>(), None)
        .unwrap();
    let ops: Vec<_> = project.rule_sets()[0].tokens().iter().map(RuleToken::ops).collect();
    assert_eq!(ops, vec![TokenOps::NotNull, TokenOps::Range]);
}

/// Tokens outside every exclusion group simply accumulate.
#[test]
fn non_exclusive_tokens_accumulate() {
    let provider = rules_only();
    let registrar = provider.registrar();
    registrar
        .for_type::<Account>()
        .unwrap()
        .for_member("handle")
        .unwrap()
        .must(|v| v.as_str().is_some_and(|s| !s.contains(' ')), "no spaces")
        .must(|v| v.as_str().is_some_and(|s| s.is_ascii()), "ascii only");
    registrar.build();

    let mut spaced = account();
    spaced.handle = "fé rris".into();
    let result = provider.resolve::<Account>().unwrap().verify(&spaced);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].details.len(), 2);
}

// ---------------------------------------------------------------------------
// Test: interval boundaries
// ---------------------------------------------------------------------------

/// Open intervals reject both bounds; closed ones accept them.
#[test]
fn interval_boundaries() {
    let open = RuleToken::range(0, 10, RangeOptions::OpenInterval);
    let closed = RuleToken::range(0, 10, RangeOptions::CloseInterval);

    for bound in [0, 10] {
        assert!(!open.verify(&json!(bound)).is_valid(), "open {bound}");
        assert!(closed.verify(&json!(bound)).is_valid(), "closed {bound}");
    }
    assert!(open.verify(&json!(5)).is_valid());
    assert!(!closed.verify(&json!(11)).is_valid());
}

/// Values that cannot be compared with the bounds fail with their own message.
#[test]
fn incomparable_values_fail() {
    let token = RuleToken::range(0, 10, RangeOptions::CloseInterval);
    let outcome = token.evaluate(&json!("five"));
    assert!(!outcome.is_success);
    let message = outcome.error_message.unwrap_or_default();
    assert!(message.contains("compared"), "{message}");
}

// ---------------------------------------------------------------------------
// Test: quantifiers and caller-supplied checks
// ---------------------------------------------------------------------------

/// `any` fails on an empty collection; `all` passes.
#[test]
fn quantifiers_over_empty_collections() {
    let empty = json!([]);
    assert!(!RuleToken::any(|_| true).verify(&empty).is_valid());
    assert!(RuleToken::all(|_| false).verify(&empty).is_valid());

    let tags = json!(["crab", "rust"]);
    assert!(RuleToken::any(|v| v == "rust").verify(&tags).is_valid());
    assert!(!RuleToken::all(|v| v == "rust").verify(&tags).is_valid());
}

/// A panicking predicate is reported as a failure and does not unwind into
/// the caller.
#[test]
fn panicking_predicate_becomes_a_failure() {
    let provider = rules_only();
    let registrar = provider.registrar();
    registrar
        .for_type::<Account>()
        .unwrap()
        .for_member("tags")
        .unwrap()
        .all(|_| panic!("tag check exploded"));
    registrar.build();

    let result = provider.resolve::<Account>().unwrap().verify(&account());
    assert!(!result.is_valid());
    let message = &result.errors()[0].details[0].error_message;
    assert!(message.contains("tag check exploded"), "{message}");
}

/// Func tokens report their own message under the custom tier.
#[test]
fn func_tokens_carry_their_message() {
    let token = RuleToken::func(|v| {
        if v.as_f64().is_some_and(|n| n >= 0.0) {
            CustomVerifyResult::success()
        } else {
            CustomVerifyResult::failure("balance is overdrawn")
        }
    });
    let result = token.verify(&json!(-3.5));
    assert_eq!(result.errors()[0].details[0].error_message, "balance is overdrawn");
    assert_eq!(result.errors()[0].details[0].tier, vouch_core::ValidatorTier::Custom);
}

/// Typed checks deserialize the member value before running.
#[test]
fn typed_checks_read_the_member_type() {
    let provider = rules_only();
    let registrar = provider.registrar();
    registrar
        .for_type::<Account>()
        .unwrap()
        .for_member("tags")
        .unwrap()
        .must_typed(|tags: &Vec<String>| tags.len() <= 2, "too many tags")
        .is::<Vec<String>>();
    registrar.build();

    let validator = provider.resolve::<Account>().unwrap();
    assert!(validator.verify(&account()).is_valid());

    let mut crowded = account();
    crowded.tags = vec!["a".into(), "b".into(), "c".into()];
    let result = validator.verify(&crowded);
    assert_eq!(result.errors()[0].details[0].error_message, "too many tags");
}

/// Declared-type checks compare against the member's declared type, not the
/// runtime value.
#[test]
fn required_types_use_the_declared_type() {
    let provider = rules_only();
    let registrar = provider.registrar();
    let rules = registrar.for_type::<Account>().unwrap();
    rules.for_member("age").unwrap().required_types::<(i32, i64)>();
    rules.for_member("balance").unwrap().is_not::<f64>();
    registrar.build();

    let result = provider.resolve::<Account>().unwrap().verify(&account());
    let names: Vec<_> = result.member_names().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["balance"]);
}

// ---------------------------------------------------------------------------
// Test: strategies and object-level rules
// ---------------------------------------------------------------------------

struct AdultsOnly;

impl ValidationStrategy<Account> for AdultsOnly {
    fn project_name(&self) -> Option<&str> {
        Some("Adults")
    }

    fn configure(&self, rules: &TypeRegistrar<'_>) -> Result<(), ValidationError> {
        rules.for_member("age")?.greater_than_or_equal(18);
        rules
            .for_object()
            .must(|v| v["balance"].as_f64().is_some_and(|b| b >= 0.0), "account is overdrawn");
        Ok(())
    }
}

/// Strategies configure their own project; object-level rules report under
/// the instance and come after member rules.
#[test]
fn strategies_and_object_rules() {
    let provider = rules_only();
    let registrar = provider.registrar();
    registrar.apply_strategy::<Account, _>(&AdultsOnly).unwrap();
    registrar.build();

    let validator = provider.resolve_named::<Account>("Adults").unwrap();
    let mut minor = account();
    minor.age = 12;
    minor.balance = -1.0;

    let result = validator.verify(&minor);
    let names: Vec<_> = result.member_names().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["age", "Instance"]);
    assert!(provider.resolve::<Account>().unwrap().verify(&minor).is_valid());
}

// ---------------------------------------------------------------------------
// Test: custom validator registry
// ---------------------------------------------------------------------------

/// The first validator registered under a name is kept.
#[test]
fn first_registered_custom_validator_wins() {
    let provider = ValidationProvider::default();
    assert!(provider.register_validator(FnValidator::new("Audit", |_: &Account| {
        VerifyResult::success()
    })));
    assert!(!provider.register_validator(FnValidator::new("Audit", |_: &Account| {
        VerifyResult::null_reference()
    })));

    assert_eq!(provider.custom_validators().len(), 1);
    assert!(provider.resolve::<Account>().unwrap().verify(&account()).is_valid());
    assert_eq!(provider.custom_validators().resolve("Missing").name(), "Sealed");
}
