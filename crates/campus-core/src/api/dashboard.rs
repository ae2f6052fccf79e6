//! Dashboard statistics
//!
//! Every dashboard endpoint answers with `{success, data, message}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use campus_http::ApiClient;

use super::lenient_count;
use crate::error::CoreError;
use crate::Result;

const DASHBOARD_ENDPOINT: &str = "/dashboard";
const LOAD_FAILED: &str = "Failed to load dashboard data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardSection {
    Overview,
    Schools,
    Users,
    Academic,
    Activities,
    SystemHealth,
}

impl DashboardSection {
    pub const ALL: [DashboardSection; 6] = [
        DashboardSection::Overview,
        DashboardSection::Schools,
        DashboardSection::Users,
        DashboardSection::Academic,
        DashboardSection::Activities,
        DashboardSection::SystemHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardSection::Overview => "overview",
            DashboardSection::Schools => "schools",
            DashboardSection::Users => "users",
            DashboardSection::Academic => "academic",
            DashboardSection::Activities => "activities",
            DashboardSection::SystemHealth => "system-health",
        }
    }
}

impl std::fmt::Display for DashboardSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DashboardSection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        DashboardSection::ALL
            .into_iter()
            .find(|section| section.as_str() == normalized)
            .ok_or_else(|| format!("Unknown dashboard section: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_schools: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_users: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_students: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_teachers: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_classes: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_subjects: u64,
}

/// Full `GET /dashboard` payload. Only the overview is typed; the other
/// sections are passed through as returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub overview: Option<OverviewStats>,
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl DashboardData {
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(CoreError::Dashboard(
                self.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| LOAD_FAILED.to_string()),
            )),
        }
    }
}

pub struct DashboardApi {
    client: ApiClient,
}

impl DashboardApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Every section at once
    pub async fn dashboard(&self) -> Result<DashboardData> {
        self.fetch(DASHBOARD_ENDPOINT).await
    }

    pub async fn section(&self, section: DashboardSection) -> Result<Value> {
        self.fetch(&format!("{}/{}", DASHBOARD_ENDPOINT, section.as_str()))
            .await
    }

    pub async fn overview(&self) -> Result<OverviewStats> {
        self.fetch(&format!(
            "{}/{}",
            DASHBOARD_ENDPOINT,
            DashboardSection::Overview.as_str()
        ))
        .await
    }

    /// Row counts and health of one database table
    pub async fn table_status(&self, table: &str) -> Result<Value> {
        let table = table.trim();
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::InvalidArgument(format!(
                "invalid table name: {:?}",
                table
            )));
        }

        self.fetch(&format!("{}/table/{}", DASHBOARD_ENDPOINT, table))
            .await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let envelope: Envelope<T> = self.client.get(path).await?;
        envelope.into_data().map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Dashboard request unsuccessful");
            e
        })
    }
}

impl Clone for DashboardApi {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_names() {
        assert_eq!(DashboardSection::SystemHealth.as_str(), "system-health");
        assert_eq!(
            "system_health".parse::<DashboardSection>().unwrap(),
            DashboardSection::SystemHealth
        );
        assert_eq!("Users".parse::<DashboardSection>().unwrap(), DashboardSection::Users);
        assert!("grades".parse::<DashboardSection>().is_err());
    }

    #[test]
    fn test_envelope_failure_message() {
        let failed: Envelope<Value> =
            serde_json::from_str(r#"{"success":false,"message":"Database offline"}"#).unwrap();
        assert_eq!(failed.into_data().unwrap_err().to_string(), "Database offline");

        let silent: Envelope<Value> = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert_eq!(silent.into_data().unwrap_err().to_string(), LOAD_FAILED);

        let empty: Envelope<Value> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(empty.into_data().is_err());
    }

    #[test]
    fn test_overview_counts_are_lenient() {
        let stats: OverviewStats = serde_json::from_str(
            r#"{"total_schools":12,"total_users":"340","total_students":null,"total_teachers":18.0}"#,
        )
        .unwrap();

        assert_eq!(stats.total_schools, 12);
        assert_eq!(stats.total_users, 340);
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.total_teachers, 18);
        assert_eq!(stats.total_subjects, 0);
    }

    #[test]
    fn test_dashboard_data_keeps_other_sections() {
        let data: DashboardData = serde_json::from_str(
            r#"{"overview":{"total_schools":3},"users":{"by_role":[]},"system_health":{"status":"ok"}}"#,
        )
        .unwrap();

        assert_eq!(data.overview.as_ref().unwrap().total_schools, 3);
        assert!(data.section("users").is_some());
        assert_eq!(data.section("system_health").unwrap()["status"], "ok");
        assert!(data.section("overview").is_none());
    }
}
