use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::audit::{AuditEntry, Audited};

pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStage {
    #[default]
    InReview,
    ShortListed,
    Interview,
    Rejected,
    /// Stored and counted, but no transition in this service produces it.
    Hired,
}

impl ApplicationStage {
    pub const ALL: [ApplicationStage; 5] = [
        ApplicationStage::InReview,
        ApplicationStage::ShortListed,
        ApplicationStage::Interview,
        ApplicationStage::Rejected,
        ApplicationStage::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStage::InReview => "in-review",
            ApplicationStage::ShortListed => "short-listed",
            ApplicationStage::Interview => "interview",
            ApplicationStage::Rejected => "rejected",
            ApplicationStage::Hired => "hired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStage::Rejected | ApplicationStage::Hired)
    }
}

impl fmt::Display for ApplicationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "in-review" => Ok(ApplicationStage::InReview),
            "short-listed" => Ok(ApplicationStage::ShortListed),
            "interview" => Ok(ApplicationStage::Interview),
            "rejected" => Ok(ApplicationStage::Rejected),
            "hired" => Ok(ApplicationStage::Hired),
            other => Err(format!("unknown application stage: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "jobID")]
    pub job_id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub rating: Option<f64>,
    pub stage: ApplicationStage,
    pub resume: String,
    pub shortlist_date: Option<DateTime<Utc>>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_venue: Option<String>,
    pub created_at: DateTime<Utc>,
    pub history: Vec<AuditEntry>,
    pub version: i64,
}

impl Audited for Application {
    fn history(&self) -> &[AuditEntry] {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Vec<AuditEntry> {
        &mut self.history
    }
}

pub fn validate_rating(rating: f64) -> Result<()> {
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err(Error::BadRequest(format!(
            "Rating must be between 0 and {}",
            MAX_RATING
        )));
    }
    Ok(())
}

impl Application {
    pub fn new(
        job_id: Uuid,
        user_id: Uuid,
        resume: String,
        rating: Option<f64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            user_id,
            rating,
            stage: ApplicationStage::InReview,
            resume,
            shortlist_date: None,
            interview_date: None,
            interview_venue: None,
            created_at: now,
            history: Vec::new(),
            version: 0,
        }
    }

    pub fn shortlist(&mut self, actor_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        if self.stage != ApplicationStage::InReview {
            return Err(Error::InvalidState(format!(
                "Only applications in review can be shortlisted (current stage: {})",
                self.stage
            )));
        }
        self.shortlist_date = Some(now);
        self.stage = ApplicationStage::ShortListed;
        self.record("shortlistDate", now.to_rfc3339(), actor_id, now);
        Ok(())
    }

    /// Schedules (or reschedules) the interview.
    pub fn schedule_interview(
        &mut self,
        interview_date: DateTime<Utc>,
        interview_venue: String,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.stage.is_terminal() {
            return Err(Error::InvalidState(format!(
                "Cannot schedule an interview for a {} application",
                self.stage
            )));
        }
        self.interview_date = Some(interview_date);
        self.interview_venue = Some(interview_venue);
        self.stage = ApplicationStage::Interview;
        self.record("interviewDate", interview_date.to_rfc3339(), actor_id, now);
        Ok(())
    }

    pub fn rate(&mut self, rating: f64, actor_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        validate_rating(rating)?;
        self.rating = Some(rating);
        self.record("rating", rating, actor_id, now);
        Ok(())
    }

    pub fn reject(&mut self, actor_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        if self.stage.is_terminal() {
            return Err(Error::InvalidState(format!(
                "Application is already {}",
                self.stage
            )));
        }
        self.stage = ApplicationStage::Rejected;
        self.record("stage", ApplicationStage::Rejected, actor_id, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Application {
        Application::new(Uuid::new_v4(), Uuid::new_v4(), "r.pdf".into(), None, Utc::now())
    }

    #[test]
    fn shortlist_then_interview_records_two_entries() {
        let mut app = fresh();
        let actor = Uuid::new_v4();
        app.shortlist(actor, Utc::now()).unwrap();
        assert_eq!(app.stage, ApplicationStage::ShortListed);
        assert!(app.shortlist_date.is_some());

        let when = Utc::now() + chrono::Duration::days(3);
        app.schedule_interview(when, "HQ".into(), actor, Utc::now())
            .unwrap();
        assert_eq!(app.stage, ApplicationStage::Interview);
        assert_eq!(app.interview_venue.as_deref(), Some("HQ"));
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history[1].changed_field, "interviewDate");
        assert_eq!(app.history[1].updated_value, when.to_rfc3339());
    }

    #[test]
    fn rejected_is_terminal() {
        let mut app = fresh();
        let actor = Uuid::new_v4();
        app.reject(actor, Utc::now()).unwrap();
        assert_eq!(app.history[0].updated_value, "rejected");

        let before = app.clone();
        assert_eq!(app.shortlist(actor, Utc::now()).unwrap_err().kind(), "invalid_state");
        assert_eq!(
            app.schedule_interview(Utc::now(), "x".into(), actor, Utc::now())
                .unwrap_err()
                .kind(),
            "invalid_state"
        );
        assert_eq!(app.reject(actor, Utc::now()).unwrap_err().kind(), "invalid_state");
        assert_eq!(app, before);
    }

    #[test]
    fn rating_keeps_stage_and_checks_range() {
        let mut app = fresh();
        let actor = Uuid::new_v4();
        app.rate(4.5, actor, Utc::now()).unwrap();
        assert_eq!(app.stage, ApplicationStage::InReview);
        assert_eq!(app.rating, Some(4.5));
        assert!(app.rate(7.0, actor, Utc::now()).is_err());
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn stage_strings_round_trip() {
        for stage in ApplicationStage::ALL {
            assert_eq!(stage.as_str().parse::<ApplicationStage>(), Ok(stage));
        }
    }
}
