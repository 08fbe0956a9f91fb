//! Ambit CLI - Rule-tree Validation
//!
//! This is a demonstration CLI for the Ambit library.

use ambit::prelude::*;
use anyhow::{bail, Context, Result};
use std::path::Path;

struct Address {
    street: Option<String>,
    city: Option<String>,
}

struct Customer {
    name: Option<String>,
    email: Option<String>,
    age: Option<u32>,
    nickname: Option<Option<String>>,
    addresses: Option<Vec<Address>>,
}

fn address_scope() -> EngineResult<ModelScope<Address>> {
    Ok(ModelScope::builder()
        .member(
            "Street",
            |a: &Address| a.street.as_ref(),
            Scope::builder()
                .must(|s: &String| s.len() >= 3, "Street is too short")
                .build()?,
        )
        .member(
            "City",
            |a: &Address| a.city.as_ref(),
            Scope::builder().required_message("City is missing").build()?,
        )
        .build())
}

fn customer_scope() -> EngineResult<ModelScope<Customer>> {
    let too_young = ValidationError::new("Must be at least {min} years old")
        .with_argument("min", 18)
        .into_shared();

    Ok(ModelScope::builder()
        .member(
            "Name",
            |c: &Customer| c.name.as_ref(),
            Scope::builder()
                .required_message("Please provide the name")
                .must(|n: &String| !n.trim().is_empty(), "Name is blank")
                .build()?,
        )
        .member(
            "Email",
            |c: &Customer| c.email.as_ref(),
            Scope::builder()
                .must(|e: &String| e.contains('@'), "Must contain '@'")
                .must(|e: &String| e.contains('.'), "Must contain a domain")
                .summary_message("Must be a valid email")
                .build()?,
        )
        .member(
            "Age",
            |c: &Customer| c.age.as_ref(),
            Scope::builder()
                .value(ValueRule::new(|a: &u32| *a >= 18).error(too_young))
                .build()?,
        )
        .member(
            "Nickname",
            |c: &Customer| c.nickname.as_ref(),
            Scope::builder()
                .optional()
                .nullable(NullableRule::new(
                    Scope::builder()
                        .must(|n: &String| n.len() <= 16, "Nickname is too long")
                        .build()?,
                ))
                .build()?,
        )
        .member(
            "Addresses",
            |c: &Customer| c.addresses.as_ref(),
            Scope::builder()
                .collection(CollectionRule::items(
                    Scope::builder().model(ModelRule::<Address>::by_type()).build()?,
                ))
                .build()?,
        )
        .build())
}

fn sample_customer() -> Customer {
    Customer {
        name: None,
        email: Some("bart".to_string()),
        age: Some(16),
        nickname: Some(None),
        addresses: Some(vec![
            Address {
                street: Some("Main Street 1".to_string()),
                city: Some("Springfield".to_string()),
            },
            Address {
                street: Some("X".to_string()),
                city: None,
            },
        ]),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    println!("🔎 Ambit - Rule-tree Validation v{}", ambit::VERSION);
    println!();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("ambit");

    let mut options_path = None;
    let mut positional = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--options" => match iter.next() {
                Some(path) => options_path = Some(path.clone()),
                None => bail!("--options requires a path"),
            },
            other => positional.push(other.to_string()),
        }
    }

    let validator = build_validator(options_path.as_deref())?;

    match positional.first().map(String::as_str) {
        None | Some("demo") => {
            let strategy = match positional.get(1).map(String::as_str) {
                None | Some("exhaustive") => Strategy::Exhaustive,
                Some("short-circuit") => Strategy::ShortCircuit,
                Some(other) => bail!("unknown strategy: {}", other),
            };
            run_demo(&validator, strategy)
        }
        Some("catalog") => run_catalog(&validator),
        Some("json") => run_json(&validator),
        Some("help") | Some("--help") | Some("-h") => {
            print_usage(program);
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            Ok(())
        }
    }
}

fn print_usage(program: &str) {
    println!("Usage: {} [--options <file.toml>] <command>", program);
    println!();
    println!("Commands:");
    println!("  demo [strategy]   Validate the sample customer (exhaustive | short-circuit)");
    println!("  catalog           List every error the customer scope can emit");
    println!("  json              Print the error tree of the sample customer as JSON");
    println!("  help              Show this help message");
}

fn build_validator(options_path: Option<&str>) -> Result<Validator> {
    let options = match options_path {
        Some(path) => load_options(Path::new(path))?,
        None => ValidationOptions::default(),
    };

    let validator = Validator::with_options(options)?;
    validator.register(customer_scope);
    validator.register(address_scope);
    Ok(validator)
}

fn load_options(path: &Path) -> Result<ValidationOptions> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options file {}", path.display()))?;
    let options = ValidationOptions::from_toml_str(&source)
        .with_context(|| format!("invalid options file {}", path.display()))?;
    log::info!("loaded options from {}", path.display());
    Ok(options)
}

fn run_demo(validator: &Validator, strategy: Strategy) -> Result<()> {
    let report = validator.report(&sample_customer(), strategy)?;

    println!("Strategy: {}", strategy);
    println!("{}", report.summary());
    if !report.is_valid() {
        println!();
        println!("{}", report.to_text());
    }
    Ok(())
}

fn run_catalog(validator: &Validator) -> Result<()> {
    let report = Report::new(validator.force::<Customer>()?);

    println!("Possible errors ({} total):", report.error_count());
    println!();
    for line in report.lines() {
        println!("  • {}", line);
    }
    Ok(())
}

fn run_json(validator: &Validator) -> Result<()> {
    let node = validator.validate(&sample_customer(), Strategy::Exhaustive)?;
    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}
