//! Basic logging example: a JSON log file, then console output on stderr.
//!
//! Run with: cargo run --example basic_logging
//!
//! Writes `./a.log` in the current directory.

use unilog::{configure_simple, get_active_logger, log_info, Field, Severity};

fn main() -> anyhow::Result<()> {
    configure_simple("json", "./a.log", Severity::Debug);

    let logger = get_active_logger();
    logger.debug("a log 1");
    logger.info_with(
        "Processing request",
        &[Field::new("request_id", "abc123"), Field::new("duration_ms", 42)],
    );
    log_info!("Processing file" => {
        "path" => "/path/to/file",
        "size" => 1024,
    });
    logger.sync()?;

    configure_simple("console", "/dev/stderr", Severity::Debug);
    get_active_logger().sugar().error("b error 1");

    // Handles taken earlier keep writing to ./a.log
    logger.named("late").warn("still going to the file");
    logger.sync()?;

    Ok(())
}
