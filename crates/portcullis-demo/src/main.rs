//! The users API server binary.

use portcullis::prelude::{Server, ServerConfig};
use portcullis_demo::{build_gateway, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = ServerConfig::from_env();
    let server = Server::new(config, build_gateway());
    server.run().await?;

    Ok(())
}
