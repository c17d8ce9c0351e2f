use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

mod chunking;
mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;
mod store;

#[derive(Parser)]
#[command(name = "blobgate", version, about = "Blob store gateway for a static photo site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (default)
    Serve {
        /// Configuration file, without extension
        #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Split a JSON array of records into page documents
    Chunk {
        /// JSON file holding a single array of records
        #[arg(short, long)]
        input: PathBuf,
        /// Destination directory, usually `<store root>/<namespace>`
        #[arg(short, long)]
        out: PathBuf,
        /// File name prefix of each chunk
        #[arg(short, long, default_value = "data")]
        label: String,
        /// Records per chunk
        #[arg(short, long, default_value_t = chunking::DEFAULT_CHUNK_SIZE)]
        size: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Chunk {
            input,
            out,
            label,
            size,
        }) => {
            let written = chunking::write_chunks(&input, &out, &label, size)?;
            println!(
                "Wrote {written} chunk(s) to {} ({label}-0.json .. {label}-{}.json)",
                out.display(),
                written.saturating_sub(1)
            );
            Ok(())
        }
        Some(Command::Serve { config }) => serve(&config),
        None => serve(config::DEFAULT_CONFIG_PATH),
    }
}

fn serve(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load_from(config_path)?;
    logger::init(&cfg)?;

    // Size the runtime from the workers setting, defaulting to one thread per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::from_config(cfg));
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await;

    Ok(())
}
