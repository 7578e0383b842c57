/// SIP trunk/gateway binding for outbound call legs
use serde::{Deserialize, Serialize};

/// Transport used between the media plane and the telephony gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrunkTransport {
    Udp,
    Tcp,
    Tls,
}

impl TrunkTransport {
    pub fn as_str(&self) -> &str {
        match self {
            TrunkTransport::Udp => "udp",
            TrunkTransport::Tcp => "tcp",
            TrunkTransport::Tls => "tls",
        }
    }
}

/// Trunk configuration attached to a SIP call leg.
///
/// The gateway translates the dialed phone number into a session-joinable
/// leg; transport and codec describe how that leg is carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipTrunkConfig {
    /// Provider-side trunk identifier
    pub trunk_id: String,
    pub transport: TrunkTransport,
    pub codec: String,
    pub caller_id_number: Option<String>,
}

impl Default for SipTrunkConfig {
    fn default() -> Self {
        Self {
            trunk_id: "default".to_string(),
            transport: TrunkTransport::Udp,
            codec: "PCMU".to_string(),
            caller_id_number: None,
        }
    }
}

/// Per-call trunk overrides carried in the SIP call request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TrunkOverrides {
    pub trunk_id: Option<String>,
    pub transport: Option<TrunkTransport>,
    pub codec: Option<String>,
    pub caller_id_number: Option<String>,
}

impl SipTrunkConfig {
    /// Apply per-call overrides on top of the deployment defaults
    pub fn apply(&self, overrides: &TrunkOverrides) -> SipTrunkConfig {
        SipTrunkConfig {
            trunk_id: overrides.trunk_id.clone().unwrap_or_else(|| self.trunk_id.clone()),
            transport: overrides.transport.unwrap_or(self.transport),
            codec: overrides.codec.clone().unwrap_or_else(|| self.codec.clone()),
            caller_id_number: overrides
                .caller_id_number
                .clone()
                .or_else(|| self.caller_id_number.clone()),
        }
    }
}
