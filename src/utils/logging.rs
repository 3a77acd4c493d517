//! Logger bootstrap for the command line.
//!
//! The library only emits through the `log` facade; the binary decides where
//! events go. Initialization never panics: failures come back as strings and
//! the caller carries on without a logger.

/// Environment variable holding a log spec such as `debug` or `adventex=trace`.
pub const LOG_ENV: &str = "ADVENTEX_LOG";

/// Level implied by the number of `-v` flags.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Effective log spec: `-v` flags win, then the environment, then `warn`.
pub fn resolve_spec(verbose: u8, env: Option<&str>) -> String {
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) if verbose == 0 => spec.to_string(),
        _ => level_for_verbosity(verbose).to_string(),
    }
}

/// Start logging to stderr. Keep the returned handle alive for the whole run.
#[cfg(feature = "cli")]
pub fn init_logging(spec: &str) -> Result<flexi_logger::LoggerHandle, String> {
    flexi_logger::Logger::try_with_str(spec)
        .map_err(|err| format!("invalid log spec `{spec}`: {err}"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}
