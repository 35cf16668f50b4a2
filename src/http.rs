//! Shared blocking HTTP agent used by the catalog loader, the audio
//! fetcher and the profile client.

use std::time::Duration;

use crate::config::NetworkSettings;

/// Build a `ureq` agent from the network settings.
///
/// No timeout is applied unless `timeout_secs` is configured.
pub fn agent(settings: &NetworkSettings) -> ureq::Agent {
    let mut builder = ureq::AgentBuilder::new().user_agent(&settings.user_agent);
    if let Some(secs) = settings.timeout_secs {
        let timeout = Duration::from_secs(secs);
        builder = builder.timeout_connect(timeout).timeout_read(timeout);
    }
    builder.build()
}

/// Whether `locator` should be fetched over HTTP rather than read from disk.
pub fn is_remote(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
