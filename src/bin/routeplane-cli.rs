use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "routeplane-cli")]
#[command(about = "Management CLI for the routeplane API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ROUTEPLANE_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or replace a service
    Reconfigure {
        #[arg(long)]
        name: String,
        /// Backend port of the first destination
        #[arg(long)]
        port: Option<String>,
        /// Comma-separated path prefixes
        #[arg(long)]
        path: Option<String>,
        /// Comma-separated hostnames
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// http or tcp
        #[arg(long)]
        mode: Option<String>,
        /// Listening port for tcp services
        #[arg(long)]
        src_port: Option<u16>,
        #[arg(long)]
        https_only: bool,
    },
    /// Remove a service
    Remove {
        #[arg(long)]
        name: String,
    },
    /// Re-render and reload every known service
    Reload {
        #[arg(long)]
        recreate: bool,
    },
    /// Print the live proxy config
    Config,
    /// List stored certificates
    Certs,
    /// List known services
    Services,
    /// Check the API is up
    Ping,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/v1/proxy", cli.url.trim_end_matches('/'));

    let request = match cli.command {
        Commands::Reconfigure {
            name,
            port,
            path,
            domain,
            color,
            mode,
            src_port,
            https_only,
        } => {
            let mut query: Vec<(&str, String)> = vec![("serviceName", name)];
            let optional = [
                ("port", port),
                ("servicePath", path),
                ("serviceDomain", domain),
                ("serviceColor", color),
                ("reqMode", mode),
                ("srcPort", src_port.map(|p| p.to_string())),
            ];
            query.extend(optional.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
            if https_only {
                query.push(("httpsOnly", "true".to_string()));
            }
            client.get(format!("{}/reconfigure", base)).query(&query)
        }
        Commands::Remove { name } => client
            .get(format!("{}/remove", base))
            .query(&[("serviceName", name)]),
        Commands::Reload { recreate } => client
            .get(format!("{}/reload", base))
            .query(&[("recreate", recreate.to_string())]),
        Commands::Config => {
            let res = client.get(format!("{}/config", base)).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                print!("{}", text);
            } else {
                eprintln!("Error: API returned status {}", status);
                eprintln!("Response: {}", text);
            }
            return Ok(());
        }
        Commands::Certs => client.get(format!("{}/certs", base)),
        Commands::Services => client.get(format!("{}/services", base)),
        Commands::Ping => client.get(format!("{}/ping", base)),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
