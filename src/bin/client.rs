use clap::Parser;
use lorem::cli::client::{run, ClientArgs};

#[tokio::main]
async fn main() {
    let args = ClientArgs::parse();

    // Failures after logging is up are already logged by the run itself
    match run(args).await {
        Ok(report) if report.failures.is_empty() => {}
        Ok(report) => {
            eprintln!(
                "{} of {} requests failed: {:?}",
                report.failures.len(),
                report.failures.len() + report.succeeded.len(),
                report.failed_indices()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
