use clap::Parser;
use lorem::cli::server::{run, ServerArgs};

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
