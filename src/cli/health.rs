use std::error::Error;

use crate::api::MedAssistBackend;
use crate::core::health::{check_health, HealthStatus};

fn indicator(up: bool) -> &'static str {
    if up {
        "● connected"
    } else {
        "○ disconnected"
    }
}

pub fn describe_health(status: &HealthStatus, server_url: &str) -> String {
    format!(
        "Server {server_url}: {}\nVector index: {}",
        indicator(status.server_reachable),
        indicator(status.index_connected)
    )
}

pub async fn run_health(
    backend: &dyn MedAssistBackend,
    server_url: &str,
) -> Result<(), Box<dyn Error>> {
    let status = check_health(backend).await;
    println!("{}", describe_health(&status, server_url));
    if !status.server_reachable {
        std::process::exit(1);
    }
    Ok(())
}
