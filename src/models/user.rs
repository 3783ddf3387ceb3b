use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "superAdmin-owner")]
    Owner,
    #[serde(rename = "superAdmin-admin")]
    Admin,
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "university-admin")]
    UniAdmin,
    #[serde(rename = "university-counselor")]
    UniCounselor,
    #[serde(rename = "company-admin")]
    CompanyAdmin,
    #[serde(rename = "company-recruiter")]
    CompanyRecruiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "superAdmin-owner",
            Role::Admin => "superAdmin-admin",
            Role::Student => "student",
            Role::UniAdmin => "university-admin",
            Role::UniCounselor => "university-counselor",
            Role::CompanyAdmin => "company-admin",
            Role::CompanyRecruiter => "company-recruiter",
        }
    }

    pub fn is_company_entity(&self) -> bool {
        matches!(self, Role::CompanyAdmin | Role::CompanyRecruiter)
    }

    pub fn is_company_manager(&self) -> bool {
        matches!(self, Role::CompanyAdmin)
    }

    pub fn is_university_entity(&self) -> bool {
        matches!(self, Role::UniAdmin | Role::UniCounselor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superAdmin-owner" => Ok(Role::Owner),
            "superAdmin-admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            "university-admin" => Ok(Role::UniAdmin),
            "university-counselor" => Ok(Role::UniCounselor),
            "company-admin" => Ok(Role::CompanyAdmin),
            "company-recruiter" => Ok(Role::CompanyRecruiter),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Pending,
    Approved,
    Blocked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Approved => "approved",
            AccountStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AccountStatus::Pending),
            "approved" => Ok(AccountStatus::Approved),
            "blocked" => Ok(AccountStatus::Blocked),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

/// The already-authenticated caller of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub status: AccountStatus,
    pub company_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
}

impl Actor {
    pub fn student(user_id: Uuid, university_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role: Role::Student,
            status: AccountStatus::Approved,
            company_id: None,
            university_id,
        }
    }

    pub fn company(user_id: Uuid, role: Role, company_id: Uuid) -> Self {
        Self {
            user_id,
            role,
            status: AccountStatus::Approved,
            company_id: Some(company_id),
            university_id: None,
        }
    }

    pub fn university(user_id: Uuid, role: Role, university_id: Uuid) -> Self {
        Self {
            user_id,
            role,
            status: AccountStatus::Approved,
            company_id: None,
            university_id: Some(university_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    #[serde(rename = "universityID")]
    pub university_id: Option<Uuid>,
    #[serde(rename = "companyID")]
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct University {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}
