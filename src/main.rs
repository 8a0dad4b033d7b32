//! signup-guard CLI - run registration steps against a payload file.
//!
//! This is a demonstration CLI for the signup-guard library.

use anyhow::Context;
use signup_guard::prelude::*;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("signup-guard");

    if args.len() < 2 {
        print_usage(program);
        return ExitCode::from(2);
    }

    match args[1].as_str() {
        "list" => {
            list_steps();
            ExitCode::SUCCESS
        }
        "info" => {
            if args.len() < 3 {
                eprintln!("Error: Please specify a step ID");
                return ExitCode::from(2);
            }
            step_info(&args[2])
        }
        "check" => {
            if args.len() < 4 {
                eprintln!("Error: Please specify settings and payload paths");
                eprintln!(
                    "Usage: {} check <settings.toml> <payload.json> [--platform <p>] [--sso] [--filter <name>]",
                    program
                );
                return ExitCode::from(2);
            }
            match check(&args[2..]) {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    ExitCode::from(2)
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage(program);
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage(program);
            ExitCode::from(2)
        }
    }
}

fn print_usage(program: &str) {
    println!("signup-guard v{}", signup_guard::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                               List available steps");
    println!("  info <step>                        Show details about a step");
    println!("  check <settings> <payload> [opts]  Run the registration pipeline");
    println!("  help                               Show this help message");
    println!();
    println!("Check options:");
    println!("  --platform <p>   Value of the Mobile-Platform-Identifier header (default: web)");
    println!("  --sso            Simulate a registration inside an SSO flow");
    println!("  --filter <name>  Filter event to run (default: {})", REGISTRATION_REQUESTED);
    println!();
    println!("Exit codes: 0 accepted, 1 rejected, 2 usage or configuration error");
}

fn list_steps() {
    let registry = StepRegistry::with_builtins();

    println!("Available steps ({} total):", registry.len());
    println!();
    for (id, entry) in registry.entries() {
        println!("  • {} - {}", id, entry.metadata.description);
    }
}

fn step_info(step_id: &str) -> ExitCode {
    let registry = StepRegistry::with_builtins();

    match registry.get_metadata(step_id) {
        Some(metadata) => {
            println!("Step: {}", metadata.name);
            println!("ID: {}", metadata.id);
            println!();
            println!("Description:");
            println!("  {}", metadata.description);

            if !metadata.options.is_empty() {
                println!();
                println!("Options:");
                for option in &metadata.options {
                    println!("  • {}", option);
                }
            }

            if !metadata.error_codes.is_empty() {
                println!();
                println!("Error codes:");
                for code in &metadata.error_codes {
                    println!("  • {}", code);
                }
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Step not found: {}", step_id);
            eprintln!("Use 'list' command to see available steps");
            ExitCode::from(2)
        }
    }
}

fn check(args: &[String]) -> anyhow::Result<ExitCode> {
    let settings_path = &args[0];
    let payload_path = &args[1];

    let mut ctx = RequestContext::new();
    let mut filter = REGISTRATION_REQUESTED.to_string();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--platform" => {
                let platform = args.get(i + 1).context("--platform requires a value")?;
                ctx.set_header("Mobile-Platform-Identifier", platform.as_str());
                i += 2;
            }
            "--sso" => {
                ctx = ctx.with_session("partial_pipeline_token", "cli");
                i += 1;
            }
            "--filter" => {
                filter = args.get(i + 1).context("--filter requires a value")?.clone();
                i += 2;
            }
            other => anyhow::bail!("unknown option: {}", other),
        }
    }

    let settings = Settings::from_file(settings_path)?;
    let raw = std::fs::read_to_string(payload_path)
        .with_context(|| format!("failed to read payload from {}", payload_path))?;
    let payload: RegistrationPayload = serde_json::from_str(&raw).context("payload must be a JSON object")?;

    let services = StepServices::from_settings(&settings);
    let registry = StepRegistry::with_builtins();
    let pipeline = RegistrationPipeline::from_settings(&settings, &filter, &registry, &services)?;

    match pipeline.run(payload, &ctx) {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => {
            println!("{}", serde_json::to_string_pretty(&rejection)?);
            Ok(ExitCode::from(1))
        }
    }
}
