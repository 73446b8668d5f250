//! Device facts from `display version`.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// OS name reported for every VRP device.
pub const NETWORK_OS: &str = "vrp";

static VERSION_RE: Lazy<Regex> = Lazy::new(|| match Regex::new(r"Version +([\w.]+)") {
    Ok(re) => re,
    Err(err) => panic!("invalid VERSION_RE regex: {err}"),
});
// Skips the "Huawei Versatile Routing Platform" banner line.
static MODEL_RE: Lazy<Regex> =
    Lazy::new(
        || match Regex::new(r"(?mi)^huawei +(\S+) .*\b(?:switch|router)\b") {
            Ok(re) => re,
            Err(err) => panic!("invalid MODEL_RE regex: {err}"),
        },
    );
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| match Regex::new(r"(?m)^(\S+) uptime is") {
    Ok(re) => re,
    Err(err) => panic!("invalid HOSTNAME_RE regex: {err}"),
});

/// Facts parsed from `display version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceInfo {
    pub network_os: String,
    pub version: Option<String>,
    pub model: Option<String>,
    pub hostname: Option<String>,
}

fn first_capture(re: &Regex, output: &str) -> Option<String> {
    re.captures(output)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

impl DeviceInfo {
    /// Parses captured output; fields that cannot be found stay `None`.
    pub fn parse(output: &str) -> Self {
        Self {
            network_os: NETWORK_OS.to_string(),
            version: first_capture(&VERSION_RE, output)
                .map(|v| v.trim_end_matches(',').to_string()),
            model: first_capture(&MODEL_RE, output),
            hostname: first_capture(&HOSTNAME_RE, output),
        }
    }
}
