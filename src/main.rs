use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{stdin, stdout, BufReader};
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

use sospf::console::Console;
use sospf::{Router, RouterConfig};

#[derive(Parser)]
#[command(name = "sospf", about = "Simulated link-state router")]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<String>,

    /// Simulated IP of this router
    #[arg(long)]
    router_id: Option<String>,

    #[arg(long)]
    process_ip: Option<String>,

    #[arg(long)]
    process_port: Option<u16>,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<RouterConfig> {
        let mut config = match &self.config {
            Some(path) => RouterConfig::load_from_file(path)
                .with_context(|| format!("failed to load config from {}", path))?,
            None => RouterConfig::default(),
        };

        if let Some(router_id) = self.router_id {
            config.router_id = router_id;
        }
        if let Some(process_ip) = self.process_ip {
            config.process_ip = process_ip;
        }
        if let Some(process_port) = self.process_port {
            config.process_port = process_port;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config()?;

    let rt = Builder::new_multi_thread().enable_all().build()?;

    rt.block_on(async {
        let (router, approvals) = Router::new(&config);
        let addr = router
            .bind()
            .await
            .with_context(|| format!("failed to listen on {}:{}", config.process_ip, config.process_port))?;

        println!("Router {} listening on {}", router.id(), addr);
        println!("Type help for the list of commands.");

        Console::new(router, BufReader::new(stdin()), stdout())
            .run(approvals)
            .await?;
        Ok::<_, anyhow::Error>(())
    })
}
