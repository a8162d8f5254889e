//! Runs the users API on a local port.
//!
//! ```sh
//! cargo run --example basic
//! curl -X POST localhost:3000/api/v1/users \
//!   -d '{"name":"Ada","email":"ada@example.com"}'
//! curl localhost:3000/api/v1/users
//! ```

use std::sync::Arc;

use ruta::store::InMemoryUsers;
use ruta::{Dispatcher, Server, api};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Arc::new(InMemoryUsers::new());
    let dispatcher = Dispatcher::new(api::routes(store)?);

    let server = Server::bind("127.0.0.1:3000").await?;
    println!("Listening on http://{}", server.local_addr());
    server.run(dispatcher).await?;
    Ok(())
}
