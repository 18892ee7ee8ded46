use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Services shown on the uptime panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceId {
    CiCd,
    Packages,
    Chain,
    Agent,
}

impl ServiceId {
    pub const ALL: [ServiceId; 4] = [
        ServiceId::CiCd,
        ServiceId::Packages,
        ServiceId::Chain,
        ServiceId::Agent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceId::CiCd => "CI/CD",
            ServiceId::Packages => "Packages",
            ServiceId::Chain => "Algorand Node",
            ServiceId::Agent => "Agent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeSample {
    pub service_id: ServiceId,
    pub timestamp: DateTime<Utc>,
    pub ok: bool,
    pub latency_ms: Option<u64>,
}
