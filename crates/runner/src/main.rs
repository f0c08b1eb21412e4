use rti_runner::{ScenarioFile, ScenarioRunner};

fn print_help() {
    eprintln!(
        r#"RTI Runner - scripted federation time-management scenarios

USAGE:
    rti-runner --scenario <PATH>

OPTIONS:
    --scenario <PATH>   Run the JSON scenario at PATH and print the report
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (overrides the scenario's log_filter)

EXAMPLES:
    rti-runner --scenario crates/runner/scenarios/time_management.json
    RUST_LOG=debug rti-runner --scenario crates/runner/scenarios/float_federation.json
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut scenario_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--scenario" | "-s" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --scenario requires a path argument");
                    std::process::exit(1);
                }
                scenario_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(path) = scenario_path else {
        print_help();
        std::process::exit(1);
    };

    let scenario = ScenarioFile::from_file(&path)?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(scenario.federation.log_filter.clone()),
    )
    .init();

    log::info!("Loaded scenario from: {}", path);

    let outcome = ScenarioRunner::new(scenario).run().await?;
    println!("{}", outcome.to_json()?);

    Ok(())
}
