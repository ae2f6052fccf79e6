//! School management endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;

use campus_http::ApiClient;

use super::lenient_bool;
use crate::error::CoreError;
use crate::Result;

const SCHOOLS_ENDPOINT: &str = "/schools";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: bool,
    /// Storage path of the uploaded logo
    #[serde(default)]
    pub logo: Option<String>,
}

/// Fields sent on create and update. Unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchoolDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl SchoolDraft {
    pub fn is_empty(&self) -> bool {
        self == &SchoolDraft::default()
    }
}

/// List responses come wrapped in `data`; single records may be either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(inner) => inner,
        }
    }
}

pub struct SchoolsApi {
    client: ApiClient,
}

impl SchoolsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<School>> {
        let payload: Payload<Vec<School>> = self.client.get(SCHOOLS_ENDPOINT).await?;
        Ok(payload.into_inner())
    }

    pub async fn get(&self, id: u64) -> Result<School> {
        let payload: Payload<School> = self.client.get(&school_path(id)).await?;
        Ok(payload.into_inner())
    }

    pub async fn create(&self, draft: &SchoolDraft) -> Result<School> {
        if draft.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(CoreError::InvalidArgument(
                "a school needs a name".to_string(),
            ));
        }

        let payload: Payload<School> = self.client.post(SCHOOLS_ENDPOINT, draft).await?;
        let school = payload.into_inner();
        tracing::info!(school_id = school.id, name = %school.name, "School created");
        Ok(school)
    }

    pub async fn update(&self, id: u64, draft: &SchoolDraft) -> Result<School> {
        if draft.is_empty() {
            return Err(CoreError::InvalidArgument("nothing to update".to_string()));
        }

        let payload: Payload<School> = self.client.put(&school_path(id), draft).await?;
        tracing::info!(school_id = id, "School updated");
        Ok(payload.into_inner())
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        let _: Option<Value> = self.client.delete(&school_path(id)).await?;
        tracing::info!(school_id = id, "School deleted");
        Ok(())
    }
}

impl Clone for SchoolsApi {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

fn school_path(id: u64) -> String {
    format!("{}/{}", SCHOOLS_ENDPOINT, id)
}

/// Case-insensitive match on name, address or phone. A blank query keeps
/// everything.
pub fn filter_schools<'a>(schools: &'a [School], query: &str) -> Vec<&'a School> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return schools.iter().collect();
    }

    let matches = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&needle));

    schools
        .iter()
        .filter(|school| {
            matches(Some(&school.name))
                || matches(school.address.as_deref())
                || matches(school.phone.as_deref())
        })
        .collect()
}
