//! Logging setup utilities for Irori binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled at the default level when `RUST_LOG` is unset.
const WORKSPACE_CRATES: [&str; 2] = ["irori_server", "irori_shared"];

/// Build the default filter directive for the workspace crates and the binary.
///
/// ```
/// use irori_shared::logger::default_directive;
///
/// assert_eq!(
///     default_directive("irori-server", "info"),
///     "irori_server=info,irori_shared=info,tower_http=info"
/// );
/// ```
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let mut targets: Vec<String> = WORKSPACE_CRATES.iter().map(|c| c.to_string()).collect();
    let binary_target = binary_name.replace('-', "_");
    if !targets.contains(&binary_target) {
        targets.push(binary_target);
    }
    targets.push("tower_http".to_string());

    targets
        .into_iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "irori-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use irori_shared::logger::setup_logger;
///
/// setup_logger("irori-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_for_unknown_binary() {
        // テスト項目: ワークスペース外のバイナリ名もフィルタに追加される
        // given (前提条件):
        let binary_name = "load-tester";

        // when (操作):
        let directive = default_directive(binary_name, "warn");

        // then (期待する結果):
        assert_eq!(
            directive,
            "irori_server=warn,irori_shared=warn,load_tester=warn,tower_http=warn"
        );
    }
}
