use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::LoggingConfig;

static TRACING_INIT: Once = Once::new();

impl LoggingConfig {
    /// `level` as filter directives. Level names match in any case, and
    /// `warning` means `warn`. Other text is kept as directives, such as
    /// `javelin.recovery=debug`.
    pub(crate) fn directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            return Self::default_level();
        }
        if level.eq_ignore_ascii_case("warning") {
            return LevelFilter::WARN.to_string().to_ascii_lowercase();
        }
        match level.parse::<LevelFilter>() {
            Ok(filter) => filter.to_string().to_ascii_lowercase(),
            Err(_) => level.to_owned(),
        }
    }

    /// The effective filter: `level` with `RUST_LOG` layered on top when set.
    pub fn env_filter(&self) -> EnvFilter {
        let rust_log = std::env::var("RUST_LOG").ok();
        layered_filter(&self.directives(), rust_log.as_deref())
    }
}

/// Try `base,env`, then `env` alone, then `base` alone, and settle for `info`
/// when none of them parse.
fn layered_filter(base: &str, env: Option<&str>) -> EnvFilter {
    let env = env.map(str::trim).filter(|env| !env.is_empty());
    let mut candidates = Vec::with_capacity(3);
    if let Some(env) = env {
        candidates.push(format!("{base},{env}"));
        candidates.push(env.to_owned());
    }
    candidates.push(base.to_owned());
    candidates
        .into_iter()
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
}

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        let writer = if config.stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::sink)
        };

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!(
                target: "javelin.config",
                level = %config.level,
                json = config.json,
                "tracing initialized"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directives(level: &str) -> String {
        LoggingConfig {
            level: level.to_owned(),
            ..Default::default()
        }
        .directives()
    }

    #[test]
    fn level_names_become_directives() {
        assert_eq!(directives("DEBUG"), "debug");
        assert_eq!(directives(" Warning "), "warn");
        assert_eq!(directives("off"), "off");
        assert_eq!(directives(""), "info");
        assert_eq!(directives("javelin.recovery=trace"), "javelin.recovery=trace");
    }

    #[test]
    fn rust_log_is_layered_over_the_level() {
        let filter = layered_filter("javelin.recovery=debug", Some("javelin.marker=trace")).to_string();
        assert!(filter.contains("javelin.recovery=debug"), "{filter}");
        assert!(filter.contains("javelin.marker=trace"), "{filter}");

        let filter = layered_filter("javelin.recovery=debug", Some("  ")).to_string();
        assert_eq!(filter, "javelin.recovery=debug");
    }

    #[test]
    fn unparsable_directives_fall_back() {
        let filter = layered_filter("info", Some("javelin=notalevel")).to_string();
        assert_eq!(filter, "info");

        let filter = layered_filter("javelin=notalevel", None).to_string();
        assert!(filter.contains("info"), "{filter}");
        assert!(!filter.contains("notalevel"), "{filter}");
    }

    #[test]
    fn repeated_initialization_is_harmless() {
        let logging = LoggingConfig {
            stderr: false,
            ..Default::default()
        };
        init_tracing(&logging);
        init_tracing(&logging);
    }
}
