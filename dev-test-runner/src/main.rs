//! Smoke scenarios for the model engine, timed, one line per scenario.
//!
//! `cargo run -p dev-test-runner` (set `RUST_LOG=json_model=debug` for registry logs).
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Result, bail, ensure};
use colored::Colorize;
use json_model::{Field, Literal, ModelError, ModelSpec, Registry, Rule, TAG_KEY, Ty, Union, Value};
use serde_json::json;
use tracing_subscriber::EnvFilter;

type Scenario = fn(&Registry) -> Result<()>;

const SCENARIOS: &[(&str, Scenario)] = &[
    ("even default field", even_default_field),
    ("required field rejects null", required_field_rejects_null),
    ("fruit dump and validate", fruit_dump_and_validate),
    ("nested models", nested_models),
    ("discriminated union", discriminated_union),
    ("invalid default fails registration", invalid_default),
    ("canonical field order", canonical_field_order),
    ("field shortcuts", field_shortcuts),
    ("union and literal fields", union_and_literal_fields),
    ("self-tagged top level", self_tagged_top_level),
];

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut failed = 0;
    let total = Instant::now();
    for (name, scenario) in SCENARIOS {
        let registry = Registry::new();
        let started = Instant::now();
        let outcome = scenario(&registry);
        let elapsed = started.elapsed();
        match outcome {
            Ok(()) => println!("{} {name} ({elapsed:.2?})", "✅".green()),
            Err(error) => {
                failed += 1;
                println!("{} {name} ({elapsed:.2?}): {error:#}", "❌".red());
            }
        }
    }
    println!("{} scenarios, {failed} failed, {:.2?}", SCENARIOS.len(), total.elapsed());
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

// ————————————————————————————————————————————————————————————————————————————
// SCENARIOS
// ————————————————————————————————————————————————————————————————————————————

fn is_even() -> Rule {
    Rule::predicate(|v| v.as_f64().is_some_and(|x| x % 2.0 == 0.0))
        .with_message("Value must be even")
}

fn fruit() -> Result<ModelSpec> {
    Ok(ModelSpec::new("Fruit")
        .untagged()
        .field("name", Field::of(Ty::Str)?)
        .field("quantity", Field::builder(Ty::Int).default(10).build()?)
        .field("weight", Field::builder(Ty::Float).default(1.0).build()?))
}

fn expect_failures(
    outcome: json_model::Result<json_model::Model>,
    expected: &[&str],
) -> Result<()> {
    match outcome {
        Err(ModelError::Validation(v)) => {
            ensure!(v.failures == expected, "unexpected failures: {:?}", v.failures);
            Ok(())
        }
        Err(other) => bail!("unexpected error: {other}"),
        Ok(model) => bail!("expected a validation failure, got {model}"),
    }
}

fn even_default_field(registry: &Registry) -> Result<()> {
    let count = Field::builder(Ty::Int).default(0).rule(is_even()).build()?;
    let spec = ModelSpec::new("Even").field("count", count);
    let ty = registry.register(&spec)?;
    expect_failures(
        ty.construct([("count", 3.0)]),
        &["Value must be of type int", "Value must be even"],
    )?;
    expect_failures(ty.construct([("count", 3)]), &["Value must be even"])?;
    let ok = ty.construct([("count", 2)])?;
    ensure!(ok.get("count")? == &Value::Int(2));
    Ok(())
}

fn required_field_rejects_null(registry: &Registry) -> Result<()> {
    let spec = ModelSpec::new("Named").field("name", Field::of(Ty::Str)?);
    let ty = registry.register(&spec)?;
    expect_failures(ty.construct([("name", Value::Null)]), &["Value must not be null"])
}

fn fruit_dump_and_validate(registry: &Registry) -> Result<()> {
    let ty = registry.register(&fruit()?)?;
    let f = ty.construct([
        ("name", Value::from("apple")),
        ("quantity", Value::Int(5)),
        ("weight", Value::from(5.0)),
    ])?;
    ensure!(f.to_string() == "Fruit(name='apple', quantity=5, weight=5.0)", "repr was {f}");
    let expected = json!({"name": "apple", "quantity": 5, "weight": 5.0});
    ensure!(serde_json::Value::Object(f.dump()) == expected);
    let back = registry.validate_jsonb(&ty, &f.dump_jsonb()?)?;
    ensure!(back == f);
    Ok(())
}

fn nested_models(registry: &Registry) -> Result<()> {
    registry.register(&fruit()?)?;
    let salad = ModelSpec::new("FruitSalad")
        .untagged()
        .field("ingredient_1", Field::of(Ty::model("Fruit"))?)
        .field("ingredient_2", Field::of(Ty::model("Fruit"))?);
    let ty = registry.register(&salad)?;
    let apple = registry.construct(&fruit()?, [("name", "apple")])?;
    let banana = registry.construct(&fruit()?, [("name", "banana")])?;
    let bowl = ty.construct([("ingredient_1", apple), ("ingredient_2", banana)])?;
    let back = registry.validate_json(&ty, &bowl.dump_json()?)?;
    ensure!(back == bowl);
    Ok(())
}

fn register_discriminated(registry: &Registry) -> Result<()> {
    for (name, key) in [("DiscriminatedModelA", "A"), ("DiscriminatedModelB", "B")] {
        let spec = ModelSpec::new(name)
            .field("internal_key", Field::builder(Literal::of([key])).default(key).build()?)
            .field("payload", Field::builder(Ty::Str).default(key.repeat(3)).build()?);
        registry.register(&spec)?;
    }
    Ok(())
}

fn discriminated_union(registry: &Registry) -> Result<()> {
    register_discriminated(registry)?;
    let members = Union::of([Ty::model("DiscriminatedModelA"), Ty::model("DiscriminatedModelB")]);
    let nested = Field::builder(members).discriminator("internal_key").build()?;
    let holder = ModelSpec::new("ModelWithDiscriminatedUnion")
        .untagged()
        .field("nested_model", nested);
    let ty = registry.register(&holder)?;
    let input = json!({"nested_model": {"internal_key": "B", "payload": "BBB"}});
    let serde_json::Value::Object(data) = input else {
        bail!("literal is not an object");
    };
    let model = registry.validate(&ty, &data)?;
    let nested = model.get("nested_model")?;
    match nested.as_model() {
        Some(inner) => ensure!(
            inner.type_name() == "DiscriminatedModelB",
            "resolved {}",
            inner.type_name()
        ),
        None => bail!("nested_model is not a model: {nested}"),
    }
    Ok(())
}

fn invalid_default(registry: &Registry) -> Result<()> {
    let count = Field::builder(Ty::Int).default(3).rule(is_even()).build()?;
    let spec = ModelSpec::new("BadDefault").field("count", count);
    match registry.register(&spec) {
        Err(ModelError::InvalidDefault { field, .. }) => {
            ensure!(field == "count");
            ensure!(!registry.contains("BadDefault"));
            Ok(())
        }
        other => bail!("expected InvalidDefault, got {other:?}"),
    }
}

fn canonical_field_order(registry: &Registry) -> Result<()> {
    let spec = ModelSpec::new("Order")
        .field("weight", Field::builder(Ty::Float).default(1.0).build()?)
        .field("name", Field::builder(Ty::Str).default("x").build()?)
        .field("quantity", Field::builder(Ty::Int).default(1).build()?);
    let ty = registry.register(&spec)?;
    let order = ty.field_order().collect::<Vec<_>>();
    ensure!(order == ["name", "quantity", "weight"], "order was {order:?}");
    Ok(())
}

fn field_shortcuts(registry: &Registry) -> Result<()> {
    let spec = ModelSpec::new("ModelWithValidations")
        .field("positive", Field::builder(Ty::Int).default(1).min_value(0).build()?)
        .field("name", Field::builder(Ty::Str).default("ok").max_len(10).build()?)
        .field("choice", Field::builder(Ty::Int).default(1).rule(Rule::one_of([1, 2, 3])).build()?);
    let ty = registry.register(&spec)?;
    expect_failures(ty.construct([("positive", 0)]), &["Value must be greater than 0"])?;
    expect_failures(
        ty.construct([("name", "much too long for this")]),
        &["Value must have length less than or equal to 10"],
    )?;
    expect_failures(ty.construct([("choice", 4)]), &["Value must be one of [1, 2, 3]"])?;
    Ok(())
}

fn union_and_literal_fields(registry: &Registry) -> Result<()> {
    let spec = ModelSpec::new("Mixed")
        .field("number", Field::builder(Union::of([Ty::Int, Ty::Float])).default(0).build()?)
        .field("fruit", Field::builder(Literal::of(["apple", "banana"])).default("apple").build()?);
    let ty = registry.register(&spec)?;
    ty.construct([("number", 1.5)])?;
    expect_failures(ty.construct([("number", "1")]), &["Value must be of type Union[int, float]"])?;
    expect_failures(
        ty.construct([("fruit", "orange")]),
        &["Value must be of type Literal['apple', 'banana']"],
    )?;
    Ok(())
}

fn self_tagged_top_level(registry: &Registry) -> Result<()> {
    register_discriminated(registry)?;
    let holder = ModelSpec::new("ModelWithNestedUnion").field(
        "nested_model",
        Field::of(Union::of([Ty::model("DiscriminatedModelA"), Ty::model("DiscriminatedModelB")]))?,
    );
    let ty = registry.register(&holder)?;
    let b = registry.require("DiscriminatedModelB")?.construct(Vec::<(&str, Value)>::new())?;
    let outer = ty.construct([("nested_model", b)])?;
    let dumped = outer.dump();
    ensure!(dumped.get(TAG_KEY) == Some(&json!("ModelWithNestedUnion")));
    let back = registry.validate_tagged(&dumped)?;
    ensure!(back == outer);
    Ok(())
}
