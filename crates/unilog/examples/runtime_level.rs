//! Options from the environment plus a runtime threshold change.
//!
//! Run with: UNILOG_FORMAT=console UNILOG_LEVEL=info cargo run --example runtime_level

use unilog::{configure, get_active_logger, LogOptions, Severity};

fn main() -> anyhow::Result<()> {
    let options = LogOptions::from_env()?.with_name("worker");
    configure(&options);

    let logger = get_active_logger();
    logger.debug("hidden unless UNILOG_LEVEL=debug");
    logger.info("worker started");

    logger.set_level(Severity::Debug);
    logger.debug("visible after lowering the threshold");

    let sugar = logger.sugar().with(&[serde_json::json!("job"), serde_json::json!("cleanup")]);
    sugar.infof(format_args!("processed {} items", 12));
    sugar.warnw("slow batch", &[serde_json::json!("elapsed_ms"), serde_json::json!(1500)]);

    logger.sync()?;
    Ok(())
}
