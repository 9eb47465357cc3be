use tokenwarden::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "tokenwarden=debug,warn".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!(target: "tokenwarden", "application trace log");
    debug!(target: "tokenwarden", "application debug log");
    info!(target: "tokenwarden", "application info log");
    warn!("dependency warn log");

    Ok(())
}
