//! Convenience macros for logging through the global logger.
//!
//! Each macro fetches the active logger, so it always writes with the most
//! recent configuration.

/// Log an info message with structured fields
///
/// # Example
///
/// ```ignore
/// log_info!("Processing file" => {
///     "path" => "/path/to/file",
///     "size" => 1024,
/// });
/// ```
#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        $crate::get_active_logger().info($msg)
    };
    ($msg:expr => { $($key:expr => $value:expr),* $(,)? }) => {
        $crate::get_active_logger().info_with($msg, &[$($crate::Field::new($key, $value)),*])
    };
}

/// Log a debug message with structured fields
#[macro_export]
macro_rules! log_debug {
    ($msg:expr) => {
        $crate::get_active_logger().debug($msg)
    };
    ($msg:expr => { $($key:expr => $value:expr),* $(,)? }) => {
        $crate::get_active_logger().debug_with($msg, &[$($crate::Field::new($key, $value)),*])
    };
}

/// Log a warning message with structured fields
#[macro_export]
macro_rules! log_warn {
    ($msg:expr) => {
        $crate::get_active_logger().warn($msg)
    };
    ($msg:expr => { $($key:expr => $value:expr),* $(,)? }) => {
        $crate::get_active_logger().warn_with($msg, &[$($crate::Field::new($key, $value)),*])
    };
}

/// Log an error message with structured fields
#[macro_export]
macro_rules! log_error {
    ($msg:expr) => {
        $crate::get_active_logger().error($msg)
    };
    ($msg:expr => { $($key:expr => $value:expr),* $(,)? }) => {
        $crate::get_active_logger().error_with($msg, &[$($crate::Field::new($key, $value)),*])
    };
}
