//! Response DTOs for the JSON probes.

use serde::{Deserialize, Serialize};

/// `{ "success": true, "data": ... }` wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Overall probe verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Degraded,
}

/// What the readiness probe saw of the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    Connected,
    Unreachable,
}

/// Liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ProbeStatus,
    /// Crate version.
    pub version: String,
}

/// Readiness report, including the database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: ProbeStatus,
    pub database: DatabaseState,
}

impl ReadinessResponse {
    /// Verdict for a given database reachability.
    pub fn from_database(reachable: bool) -> Self {
        if reachable {
            Self {
                status: ProbeStatus::Ok,
                database: DatabaseState::Connected,
            }
        } else {
            Self {
                status: ProbeStatus::Degraded,
                database: DatabaseState::Unreachable,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_serializes_lowercase() {
        let json = serde_json::to_value(ApiResponse::ok(ReadinessResponse::from_database(false))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "degraded");
        assert_eq!(json["data"]["database"], "unreachable");
    }
}
