//! Integration tests for the `validator` sink.
//!
//! Registers derive-based rules as a custom validator and checks how their
//! errors surface next to rule sets and annotations.

use serde::Serialize;
use serde_json::json;
use validator::Validate;
use vouch_core::{annotation, MemberSet, ValidationProvider, ValidatorTier, Verifiable};
use vouch_validator::ValidatorSink;

#[derive(Serialize, Validate)]
struct Address {
    #[validate(length(min = 2))]
    city: String,
}

#[derive(Validate)]
struct Signup {
    #[validate(length(min = 1, message = "name is required"))]
    name: String,
    #[validate(email)]
    email: String,
    #[validate(range(min = 18, max = 120))]
    age: u32,
    #[validate(nested)]
    address: Address,
}

impl Verifiable for Signup {
    fn describe(members: &mut MemberSet<Self>) {
        members.property("name", |s: &Signup| &s.name);
        members.property("email", |s: &Signup| &s.email);
        members
            .property("age", |s: &Signup| &s.age)
            .annotate(annotation::range(0, 150, vouch_core::RangeOptions::CloseInterval));
        members.nested("address", |s: &Signup| &s.address);
    }
}

fn signup() -> Signup {
    Signup {
        name: "Ferris".into(),
        email: "ferris@example.com".into(),
        age: 30,
        address: Address {
            city: "Berlin".into(),
        },
    }
}

fn provider() -> ValidationProvider {
    let provider = ValidationProvider::default();
    assert!(provider.register_validator(ValidatorSink::<Signup>::new()));
    provider
}

// ---------------------------------------------------------------------------
// Test: sink behaviour
// ---------------------------------------------------------------------------

/// A valid instance passes every tier.
#[test]
fn valid_instance_passes() {
    let result = provider().resolve::<Signup>().unwrap().verify(&signup());
    assert!(result.is_valid(), "{result:?}");
}

/// Field errors are reported in contract order with their messages, under
/// the custom tier.
#[test]
fn field_errors_follow_contract_order() {
    let mut bad = signup();
    bad.name = String::new();
    bad.email = "not-an-address".into();
    bad.age = 12;

    let result = provider().resolve::<Signup>().unwrap().verify(&bad);
    let names: Vec<_> = result.member_names().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["name", "email", "age"]);

    let name = &result.errors()[0];
    assert_eq!(name.details[0].error_message, "name is required");
    assert_eq!(name.details[0].validator_name, "length");
    assert_eq!(name.details[0].tier, ValidatorTier::Custom);
    assert_eq!(name.value, json!(""));

    let email = &result.errors()[1];
    assert_eq!(email.details[0].validator_name, "email");
    assert!(email.details[0].error_message.contains("email"));
}

/// Nested struct errors are flattened to dotted paths.
#[test]
fn nested_errors_use_dotted_paths() {
    let mut bad = signup();
    bad.address.city = "X".into();

    let result = provider().resolve::<Signup>().unwrap().verify(&bad);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].member_name, "address.city");
}

/// Sink failures sit after rule sets and before annotations.
#[test]
fn sink_runs_in_the_custom_tier() {
    let provider = provider();
    let registrar = provider.registrar();
    registrar
        .for_type::<Signup>()
        .unwrap()
        .for_member("age")
        .unwrap()
        .less_than(100);
    registrar.build();

    let mut old = signup();
    old.age = 200;
    let result = provider.resolve::<Signup>().unwrap().verify(&old);

    let age: Vec<_> = result
        .failures_for("age")
        .map(|f| (f.details[0].validator_name.as_str(), f.details[0].tier))
        .collect();
    assert_eq!(
        age,
        vec![
            ("less_than", ValidatorTier::BuiltIn),
            ("range", ValidatorTier::Custom),
            ("range", ValidatorTier::BuiltIn),
        ]
    );
}

/// Sinks ignore other types and one sink per type can be registered.
#[test]
fn sinks_are_scoped_to_their_type() {
    let provider = provider();
    assert!(provider.register_validator(ValidatorSink::<Address>::new()));
    assert!(!provider.register_validator(ValidatorSink::<Signup>::new()));

    let result = provider
        .resolve::<Address>()
        .unwrap()
        .verify(&Address { city: "X".into() });
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].member_name, "city");
}

impl Verifiable for Address {
    fn describe(members: &mut MemberSet<Self>) {
        members.property("city", |a: &Address| &a.city);
    }
}
