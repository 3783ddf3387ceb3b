use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Applications per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCounts {
    pub total: usize,
    pub in_review: usize,
    pub shortlisted: usize,
    pub interviewed: usize,
    pub rejected: usize,
    pub hired: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityCount {
    #[serde(rename = "universityID")]
    pub university_id: Uuid,
    pub university: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CompanyStatsQuery {
    #[serde(rename = "recruiterID")]
    pub recruiter_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthQuery {
    pub month: u32,
    pub year: i32,
    #[serde(rename = "recruiterID", default)]
    pub recruiter_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatedResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
