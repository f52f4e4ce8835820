use app_traverser::cli::commands::{cmd_inspect, cmd_traverse};
use app_traverser::cli::config::{
    Cli, Commands, build_explorer_config, build_inspect_config, load_config,
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    // Resolve device settings: CLI > config > defaults
    let serial = cli.serial.as_deref().or(config.device.serial.as_deref());
    let endpoint = cli.endpoint.as_deref().or(config.device.endpoint.as_deref());

    match cli.command {
        Commands::Traverse {
            app,
            out,
            max_depth,
            probe_text,
            scroll_ceiling,
        } => {
            let explorer_config = build_explorer_config(
                &app,
                max_depth,
                scroll_ceiling,
                probe_text.as_deref(),
                &config.traverse,
            );
            let out_dir = out.unwrap_or_else(|| config.traverse.out.clone());
            cmd_traverse(explorer_config, &out_dir, serial, endpoint)?;
        }
        Commands::Inspect => {
            cmd_inspect(&build_inspect_config(&config.traverse), serial, endpoint)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("app_traverser={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
