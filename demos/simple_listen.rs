//! Minimal end-to-end listener
//!
//! Connects with the PG_URL / PG_USER / PG_PASSWORD environment variables
//! and prints every notification on the `demo` channel. Trigger one from
//! psql with: `NOTIFY demo, 'hello'`.

use pgnotify_rs::NotificationStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let url = std::env::var("PG_URL").unwrap_or_else(|_| "host=localhost".to_string());
    let user = std::env::var("PG_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("PG_PASSWORD").unwrap_or_default();

    let stream = NotificationStream::for_channels(&url, &user, &password, ["demo"])?;
    let mut events = stream.subscribe();

    println!("listening on channel \"demo\"...");
    loop {
        let event = events.recv().await?;
        println!(
            "[{}] {} (backend pid {})",
            event.channel, event.payload, event.backend_pid
        );
    }
}
