//! Identification header sent by every session.
//!
//! The value names the host framework, the platform, this plugin and the
//! transport, each as `name/version`, e.g.
//! `loco/1.4.0 linux/x86_64 loco-http/0.3.0 reqwest/0.12`.

use crate::config::{PLUGIN_NAME, PLUGIN_VERSION, TRANSPORT_NAME, TRANSPORT_VERSION};

/// Builds the `User-Agent` value for the given host framework.
pub fn build_user_agent(framework_name: &str, framework_version: &str) -> String {
    format!(
        "{}/{} {}/{} {}/{} {}/{}",
        framework_name,
        framework_version,
        std::env::consts::OS,
        std::env::consts::ARCH,
        PLUGIN_NAME,
        PLUGIN_VERSION,
        TRANSPORT_NAME,
        TRANSPORT_VERSION
    )
}
