use std::sync::Arc;

use sessionkeeper::config::{load_config, print_schema};
use sessionkeeper::startup::run;
use sessionkeeper::utils::logger::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        print_schema()?;
        return Ok(());
    }

    let config = Arc::new(load_config());
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    run(config).await
}
