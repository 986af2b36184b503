//! Read-side aggregation for the supervisor dashboard.
//!
//! A learner is "present" as soon as their entry time is set; a recorded exit
//! does not remove them from the day's counts. The database work is one pass
//! per table; the shaping itself is the pure [`aggregate`] function.

use chrono::NaiveDate;
use db::models::{attendance_record, roster, session};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::ServiceResult;

/// Presence counts for one roster on the snapshot date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterPresence {
    pub roster_id: i64,
    pub label: String,
    pub site: String,
    pub count: u64,
}

/// The whole dashboard payload for one date.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub date: NaiveDate,
    pub total_present: u64,
    pub per_roster: Vec<RosterPresence>,
}

/// One present learner, already joined to their roster.
#[derive(Debug, Clone)]
pub struct PresenceRow {
    pub roster_id: i64,
    pub label: String,
    pub site: String,
    pub learner_id: i64,
}

/// Groups presence rows by roster and totals them.
///
/// Deduplicates learners within a roster, so the invariant
/// `total_present == sum(per_roster.count)` holds by construction. Rosters
/// come out ordered by label for a stable payload.
pub fn aggregate(date: NaiveDate, rows: Vec<PresenceRow>) -> DashboardSnapshot {
    let mut seen: HashSet<(i64, i64)> = HashSet::new();
    let mut grouped: BTreeMap<i64, RosterPresence> = BTreeMap::new();

    for row in rows {
        if !seen.insert((row.roster_id, row.learner_id)) {
            continue;
        }
        grouped
            .entry(row.roster_id)
            .or_insert_with(|| RosterPresence {
                roster_id: row.roster_id,
                label: row.label.clone(),
                site: row.site.clone(),
                count: 0,
            })
            .count += 1;
    }

    let mut per_roster: Vec<RosterPresence> = grouped.into_values().collect();
    per_roster.sort_by(|a, b| a.label.cmp(&b.label));
    let total_present = per_roster.iter().map(|r| r.count).sum();

    DashboardSnapshot {
        date,
        total_present,
        per_roster,
    }
}

pub struct DashboardAggregator;

impl DashboardAggregator {
    /// Builds the dashboard snapshot for `date` across all rosters.
    ///
    /// Sessions of any status count: closing a session does not erase the
    /// day's presence.
    pub async fn today(
        db: &DatabaseConnection,
        date: NaiveDate,
    ) -> ServiceResult<DashboardSnapshot> {
        let sessions = session::Entity::find()
            .filter(session::Column::Date.eq(date))
            .all(db)
            .await?;
        if sessions.is_empty() {
            return Ok(aggregate(date, Vec::new()));
        }

        let session_roster: HashMap<i64, i64> =
            sessions.iter().map(|s| (s.id, s.roster_id)).collect();

        let rosters: HashMap<i64, roster::Model> = roster::Entity::find()
            .filter(roster::Column::Id.is_in(session_roster.values().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let records = attendance_record::Entity::find()
            .filter(
                attendance_record::Column::SessionId
                    .is_in(session_roster.keys().copied().collect::<Vec<_>>()),
            )
            .filter(attendance_record::Column::EntryTime.is_not_null())
            .all(db)
            .await?;

        let rows = records
            .into_iter()
            .filter_map(|rec| {
                let roster_id = *session_roster.get(&rec.session_id)?;
                let roster = rosters.get(&roster_id)?;
                Some(PresenceRow {
                    roster_id,
                    label: roster.label.clone(),
                    site: roster.site.clone(),
                    learner_id: rec.learner_id,
                })
            })
            .collect();

        Ok(aggregate(date, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::AttendanceRecorder;
    use crate::session_manager::SessionManager;
    use chrono::Utc;
    use db::models::{learner, roster_instructor, user};
    use db::test_utils::setup_test_db;

    fn row(roster_id: i64, label: &str, learner_id: i64) -> PresenceRow {
        PresenceRow {
            roster_id,
            label: label.to_owned(),
            site: "North Campus".to_owned(),
            learner_id,
        }
    }

    #[test]
    fn total_equals_sum_of_roster_counts() {
        let date = Utc::now().date_naive();
        let snapshot = aggregate(
            date,
            vec![
                row(1, "Software Development", 10),
                row(1, "Software Development", 11),
                row(2, "Cooking", 20),
                row(2, "Cooking", 21),
                row(2, "Cooking", 22),
            ],
        );

        let sum: u64 = snapshot.per_roster.iter().map(|r| r.count).sum();
        assert_eq!(snapshot.total_present, sum);
        assert_eq!(snapshot.total_present, 5);
        assert_eq!(snapshot.per_roster.len(), 2);
    }

    #[test]
    fn duplicate_learners_count_once() {
        let date = Utc::now().date_naive();
        let snapshot = aggregate(
            date,
            vec![
                row(1, "Software Development", 10),
                row(1, "Software Development", 10),
            ],
        );
        assert_eq!(snapshot.total_present, 1);
    }

    #[test]
    fn rosters_come_out_sorted_by_label() {
        let date = Utc::now().date_naive();
        let snapshot = aggregate(
            date,
            vec![row(2, "Welding", 20), row(1, "Cooking", 10)],
        );
        let labels: Vec<&str> = snapshot
            .per_roster
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Cooking", "Welding"]);
    }

    #[test]
    fn empty_day_has_zero_totals() {
        let date = Utc::now().date_naive();
        let snapshot = aggregate(date, Vec::new());
        assert_eq!(snapshot.total_present, 0);
        assert!(snapshot.per_roster.is_empty());
    }

    #[tokio::test]
    async fn snapshot_reflects_recorded_entries_only() {
        let db = setup_test_db().await;

        let instructor = user::Model::create(&db, "dash_inst", "dash@test.com", "pw", false)
            .await
            .unwrap();
        let roster = db::models::roster::Model::create(&db, "2824601", "Software Development", "North Campus")
            .await
            .unwrap();
        roster_instructor::Model::assign(&db, roster.id, instructor.id)
            .await
            .unwrap();
        let present = learner::Model::create(&db, roster.id, "1002003001", "Ana Gomez")
            .await
            .unwrap();
        let absent = learner::Model::create(&db, roster.id, "1002003002", "Luis Prada")
            .await
            .unwrap();

        let session = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();
        AttendanceRecorder::record_entry(&db, session.id, present.id)
            .await
            .unwrap();
        // an observation-only row must not count as present
        AttendanceRecorder::set_observations(&db, session.id, absent.id, "sick leave")
            .await
            .unwrap();

        let snapshot = DashboardAggregator::today(&db, session.date).await.unwrap();
        assert_eq!(snapshot.total_present, 1);
        assert_eq!(snapshot.per_roster.len(), 1);
        assert_eq!(snapshot.per_roster[0].count, 1);
        assert_eq!(snapshot.per_roster[0].label, "Software Development");
    }

    #[tokio::test]
    async fn closed_sessions_still_count_toward_the_day() {
        let db = setup_test_db().await;

        let instructor = user::Model::create(&db, "dash_inst2", "dash2@test.com", "pw", false)
            .await
            .unwrap();
        let roster = db::models::roster::Model::create(&db, "2900100", "Cooking", "South Campus")
            .await
            .unwrap();
        roster_instructor::Model::assign(&db, roster.id, instructor.id)
            .await
            .unwrap();
        let l = learner::Model::create(&db, roster.id, "3004005006", "Mia Torres")
            .await
            .unwrap();

        let session = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();
        AttendanceRecorder::record_entry(&db, session.id, l.id)
            .await
            .unwrap();
        SessionManager::close_session(&db, session.id).await.unwrap();

        let snapshot = DashboardAggregator::today(&db, session.date).await.unwrap();
        assert_eq!(snapshot.total_present, 1);
    }
}
