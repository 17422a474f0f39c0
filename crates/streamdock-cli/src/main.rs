//! Binary entrypoint for the streamdock CLI.

#[tokio::main]
async fn main() {
    std::process::exit(streamdock_cli::run().await);
}
