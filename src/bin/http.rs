#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use task_analyzer::{AnalyzerConfig, BusinessCalendar, http_api, load_holiday_table};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr: SocketAddr = std::env::var("TASK_ANALYZER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = match std::env::var("TASK_ANALYZER_CONFIG") {
        Ok(path) => AnalyzerConfig::load(path)?,
        Err(_) => AnalyzerConfig::default(),
    };

    let calendar = BusinessCalendar::from_config(&config.calendar);
    let mut workspace = http_api::Workspace::new(&config, calendar);
    if let Some(path) = &config.holiday_table {
        let table = load_holiday_table(path)?;
        tracing::info!(
            entries = table.entries.len(),
            jurisdiction = %config.jurisdiction,
            "holiday table loaded"
        );
        workspace = workspace.with_holidays(table);
    }

    tracing::info!(%addr, "task-analyzer HTTP API listening");
    http_api::serve(addr, workspace).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
