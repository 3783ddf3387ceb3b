//! Read-only aggregations shared by the application and project engines.
//! Everything here is pure; callers fetch rows from the store first.

use chrono::{DateTime, Datelike, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::dto::stats_dto::{DayCount, MonthlyCount, StageCounts, UniversityCount};
use crate::models::application::{Application, ApplicationStage};
use crate::models::user::{University, UserProfile};
use crate::utils::time::MONTH_NAMES;

pub fn stage_counts<'a>(apps: impl IntoIterator<Item = &'a Application>) -> StageCounts {
    let mut counts = StageCounts::default();
    for app in apps {
        counts.total += 1;
        match app.stage {
            ApplicationStage::InReview => counts.in_review += 1,
            ApplicationStage::ShortListed => counts.shortlisted += 1,
            ApplicationStage::Interview => counts.interviewed += 1,
            ApplicationStage::Rejected => counts.rejected += 1,
            ApplicationStage::Hired => counts.hired += 1,
        }
    }
    counts
}

/// Groups applicants by their university, most applicants first. Users with
/// no university, or whose university is unknown, are left out.
pub fn top_universities(
    applicant_ids: &[Uuid],
    users: &[UserProfile],
    universities: &[University],
    skip: usize,
    limit: usize,
) -> Vec<UniversityCount> {
    let user_unis: HashMap<Uuid, Uuid> = users
        .iter()
        .filter_map(|u| u.university_id.map(|uni| (u.id, uni)))
        .collect();
    let names: HashMap<Uuid, &str> = universities
        .iter()
        .map(|u| (u.id, u.name.as_str()))
        .collect();

    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for uni in applicant_ids.iter().filter_map(|id| user_unis.get(id)) {
        if names.contains_key(uni) {
            *counts.entry(*uni).or_default() += 1;
        }
    }

    let mut ranked: Vec<UniversityCount> = counts
        .into_iter()
        .map(|(university_id, count)| UniversityCount {
            university_id,
            university: names.get(&university_id).copied().unwrap_or_default().to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.university.cmp(&b.university)));
    ranked.into_iter().skip(skip).take(limit).collect()
}

/// Day-of-month histogram of the timestamps falling in `[start, end)`.
pub fn per_day(
    dates: impl IntoIterator<Item = DateTime<Utc>>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<DayCount> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for date in dates.into_iter().filter(|d| *d >= start && *d < end) {
        *counts.entry(date.day()).or_default() += 1;
    }
    let mut days: Vec<DayCount> = counts
        .into_iter()
        .map(|(day, count)| DayCount { day, count })
        .collect();
    days.sort_by_key(|d| d.day);
    days
}

/// Counts per (year, month), oldest first, skipping empty months.
pub fn per_month(dates: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in dates {
        *counts.entry((date.year(), date.month0())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((year, month0), count)| MonthlyCount {
            year,
            month: MONTH_NAMES[month0 as usize].to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::utils::time::month_window;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn student(uni: Option<Uuid>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "L".into(),
            role: Role::Student,
            profile_picture: None,
            university_id: uni,
            company_id: None,
        }
    }

    #[test]
    fn stage_counts_cover_every_stage() {
        let mut apps: Vec<Application> = (0..5)
            .map(|_| Application::new(Uuid::new_v4(), Uuid::new_v4(), "r".into(), None, Utc::now()))
            .collect();
        apps[1].stage = ApplicationStage::ShortListed;
        apps[2].stage = ApplicationStage::Interview;
        apps[3].stage = ApplicationStage::Rejected;
        apps[4].stage = ApplicationStage::Hired;

        let counts = stage_counts(&apps);
        assert_eq!(counts.total, 5);
        assert_eq!(
            (counts.in_review, counts.shortlisted, counts.interviewed, counts.rejected, counts.hired),
            (1, 1, 1, 1, 1)
        );
    }

    #[test]
    fn top_universities_ranks_and_paginates() {
        let mit = University { id: Uuid::new_v4(), name: "MIT".into() };
        let eth = University { id: Uuid::new_v4(), name: "ETH".into() };
        let users = vec![
            student(Some(mit.id)),
            student(Some(mit.id)),
            student(Some(eth.id)),
            student(None),
        ];
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        let ranked = top_universities(&ids, &users, &[mit.clone(), eth.clone()], 0, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].university.as_str(), ranked[0].count), ("MIT", 2));
        assert_eq!((ranked[1].university.as_str(), ranked[1].count), ("ETH", 1));

        let second = top_universities(&ids, &users, &[mit, eth], 1, 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].university, "ETH");
    }

    #[test]
    fn per_day_only_counts_inside_window() {
        let (start, end) = month_window(2024, 3).unwrap();
        let days = per_day(
            vec![at(2024, 3, 1), at(2024, 3, 1), at(2024, 3, 15), at(2024, 4, 1), at(2024, 2, 29)],
            start,
            end,
        );
        assert_eq!(days, vec![DayCount { day: 1, count: 2 }, DayCount { day: 15, count: 1 }]);
    }

    #[test]
    fn per_month_keeps_years_apart() {
        let months = per_month(vec![
            at(2024, 11, 2),
            at(2024, 1, 5),
            at(2025, 1, 9),
            at(2024, 1, 20),
        ]);
        assert_eq!(
            months,
            vec![
                MonthlyCount { year: 2024, month: "January".into(), count: 2 },
                MonthlyCount { year: 2024, month: "November".into(), count: 1 },
                MonthlyCount { year: 2025, month: "January".into(), count: 1 },
            ]
        );
    }
}
