//! Demo mode: an in-process relay fed with sample events

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use logan_relay::{Emitter, LogType, Relay, banner};

/// Interval between periodic demo events
const TICK: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
#[error("demo job failed")]
struct DemoError(#[source] std::num::ParseIntError);

pub async fn run(port: u16, heartbeat: Duration) -> Result<()> {
    let relay = Relay::start(port, heartbeat)
        .await
        .context("Failed to start relay")?;
    println!("{}", banner(relay.addr()));
    println!("  emitting demo events every {}s, Ctrl+C to stop\n", TICK.as_secs());

    let emitter = Emitter::new(&relay.url())?.with_tracing(true);
    emit_samples(&emitter).await;

    let mut ticker = tokio::time::interval(TICK);
    let mut n: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                n += 1;
                emit_periodic(&emitter, n).await;
            }
        }
    }

    info!("demo stopped");
    Ok(())
}

/// The fixed opening set: every type, several namespaces, one error chain
/// and one event in the default namespace
async fn emit_samples(emitter: &Emitter) {
    emitter.log(LogType::Info, Some("test"), "This is an info message").await;
    emitter.log(LogType::Warning, Some("test"), "This is a warning message").await;
    emitter.log(LogType::Error, Some("app"), "This is an error message").await;
    emitter.log(LogType::Debug, Some("debug"), "This is a debug message").await;

    if let Err(e) = "not-a-number".parse::<u16>().map_err(DemoError) {
        emitter
            .exception(Some("test"), "An error occurred with exception", &e)
            .await;
    }

    emitter.info("Message with default namespace").await;
}

async fn emit_periodic(emitter: &Emitter, n: u64) {
    const NAMESPACES: [&str; 4] = ["app", "db", "cache", "worker"];
    let namespace = NAMESPACES[(n % NAMESPACES.len() as u64) as usize];
    let log_type = match n % 10 {
        0 => LogType::Error,
        3 | 7 => LogType::Warning,
        5 => LogType::Debug,
        _ => LogType::Info,
    };
    let message = match log_type {
        LogType::Error => format!("request #{n} failed\nupstream closed the connection"),
        LogType::Warning => format!("request #{n} took {}ms", 200 + (n * 37) % 800),
        LogType::Debug => format!("cache stats after #{n}: hits={} misses={}", n * 3, n),
        LogType::Info => format!("handled request #{n}"),
    };
    emitter.log(log_type, Some(namespace), message).await;
}
