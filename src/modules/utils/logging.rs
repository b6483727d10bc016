use env_logger::{Builder, Target, WriteStyle};
use log::{error, info, warn, LevelFilter};
use std::fs::OpenOptions;
use std::path::Path;

/// Initialize logging, appending to `log_file` when given and to stderr otherwise.
///
/// `RUST_LOG` overrides the default `info` level.
pub fn initialize_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Auto);

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;

    info!("Logging system initialized");
    Ok(())
}

/// Mask all but the edges of a value before it reaches a log line
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Structured log line for an authentication event
pub fn log_auth_event(event_type: &str, email: &str, success: bool, details: Option<&str>) {
    if success {
        info!(
            "Auth event: type={}, user={}, success=true, details={:?}",
            event_type,
            format_sensitive(email),
            details
        );
    } else {
        warn!(
            "Auth event: type={}, user={}, success=false, details={:?}",
            event_type,
            format_sensitive(email),
            details
        );
    }
}

/// Structured log line for an account store operation
pub fn log_store_operation(operation: &str, account: &str, success: bool, details: Option<&str>) {
    if success {
        info!(
            "Store operation: op={}, account={}, success=true, details={:?}",
            operation, account, details
        );
    } else {
        error!(
            "Store operation: op={}, account={}, success=false, details={:?}",
            operation, account, details
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sensitive_data_formatting() {
        assert_eq!(format_sensitive("alice@example.com"), "al***om");
        assert_eq!(format_sensitive("a@b"), "***");
        assert_eq!(format_sensitive("üser@bé"), "üs***bé");
        assert_eq!(format_sensitive(""), "");
    }

    #[test]
    fn test_logging_initialization() {
        let log_file = NamedTempFile::new().unwrap();

        // Another test may have installed the logger first
        let result = initialize_logging(Some(log_file.path()));
        assert!(
            result.is_ok()
                || result
                    .unwrap_err()
                    .to_string()
                    .contains("already initialized")
        );

        log_auth_event("login", "alice@example.com", true, None);
        log_store_operation("create_account", "abc", false, Some("store down"));
    }
}
