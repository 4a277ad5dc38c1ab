use clap::Parser;
use powergate::{operation::Arguments, upstream::Credentials, Gateway, GatewayConfig, Operation};

/// Runs one power-metering operation against the configured WebAccess server
/// and prints the JSON result.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Operation name, e.g. `get_energy_consumption_history`.
    operation: String,

    /// URL-style argument as `name=value`; repeat for each argument.
    #[clap(long = "arg", short = 'a', value_parser = parse_argument)]
    arguments: Vec<(String, String)>,

    #[clap(long, env = "WA_USER")]
    user: String,

    #[clap(long, default_value = "", env = "WA_PASSWORD", hide_env_values = true)]
    password: String,
}

fn parse_argument(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected `name=value`, got `{}`", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = GatewayConfig::from_env()?;
    let gateway = Gateway::from_config(&config)?;

    let arguments: Arguments = args.arguments.into_iter().collect();
    let operation = Operation::parse(&args.operation, &arguments)?;
    let output = gateway
        .execute(&operation, &Credentials::new(args.user, args.password))
        .await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
