use clap::Parser;
use eau2_coordinator::Coordinator;
use tracing_subscriber::EnvFilter;

/// eau2 coordinator: accepts node registrations and broadcasts the cluster directory.
#[derive(Parser, Debug)]
#[command(name = "eau2-coordinator")]
struct Options {
    /// IP address to bind the registration listener on.
    #[arg(long, env = "EAU2_MASTER_IP", default_value = "127.0.0.1")]
    master_ip: String,

    /// Port to bind the registration listener on.
    #[arg(long, env = "EAU2_MASTER_PORT", default_value_t = 9000)]
    master_port: u16,

    /// Tracing filter, e.g. "info" or "eau2_coordinator=debug".
    #[arg(long, env = "EAU2_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&options.log_level))
        .init();

    let coordinator = Coordinator::new(options.master_ip, options.master_port);
    coordinator.run()?;
    Ok(())
}
