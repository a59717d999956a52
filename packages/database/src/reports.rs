//! Submitted incident reports.

use galamsey_watch_report_models::{
    MiningActivityType, ReportId, ReportRecord, ReportStatus, ReportType, StoredReport, ThreatLevel,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

/// Stores a newly submitted report with status [`ReportStatus::Pending`].
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails, including when a report with
/// the same id already exists.
pub async fn insert_report(db: &dyn Database, record: &ReportRecord) -> Result<(), DbError> {
    let now = chrono::Utc::now().to_rfc3339();
    let evidence_json = serde_json::to_string(&record.evidence_files)?;

    db.exec_raw_params(
        "INSERT INTO reports (
            report_id, report_type, threat_level, mining_activity_type,
            incident_description, location_lat, location_lng,
            location_description, evidence_files, blur_faces, strip_location,
            user_agent, status, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)",
        &[
            DatabaseValue::String(record.report_id.to_string()),
            DatabaseValue::String(record.report_type.as_ref().to_string()),
            DatabaseValue::Int32(i32::from(record.threat_level.value())),
            record
                .mining_activity_type
                .map_or(DatabaseValue::Null, |t| {
                    DatabaseValue::String(t.as_ref().to_string())
                }),
            DatabaseValue::String(record.incident_description.clone()),
            record.location_lat.map_or(DatabaseValue::Null, DatabaseValue::Real64),
            record.location_lng.map_or(DatabaseValue::Null, DatabaseValue::Real64),
            DatabaseValue::String(record.location_description.clone()),
            DatabaseValue::String(evidence_json),
            DatabaseValue::Int64(i64::from(record.blur_faces)),
            DatabaseValue::Int64(i64::from(record.strip_location)),
            DatabaseValue::String(record.user_agent.clone()),
            DatabaseValue::String(ReportStatus::Pending.as_ref().to_string()),
            DatabaseValue::String(now),
        ],
    )
    .await?;

    log::debug!("Inserted report {}", record.report_id);
    Ok(())
}

/// Returns every stored report, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn get_all_reports(db: &dyn Database) -> Result<Vec<StoredReport>, DbError> {
    let rows = db
        .query_raw_params("SELECT * FROM reports ORDER BY created_at DESC", &[])
        .await?;

    rows.iter().map(report_from_row).collect()
}

/// Looks up a single report.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_report_by_id(
    db: &dyn Database,
    report_id: &str,
) -> Result<Option<StoredReport>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM reports WHERE report_id = $1",
            &[DatabaseValue::String(report_id.to_string())],
        )
        .await?;

    rows.first().map(report_from_row).transpose()
}

/// Sets the review status of a report.
///
/// Returns `false` if no report has that id.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn update_report_status(
    db: &dyn Database,
    report_id: &str,
    status: ReportStatus,
) -> Result<bool, DbError> {
    let updated = db
        .exec_raw_params(
            "UPDATE reports SET status = $1, updated_at = $2 WHERE report_id = $3",
            &[
                DatabaseValue::String(status.as_ref().to_string()),
                DatabaseValue::String(chrono::Utc::now().to_rfc3339()),
                DatabaseValue::String(report_id.to_string()),
            ],
        )
        .await?;

    Ok(updated > 0)
}

fn report_from_row(row: &Row) -> Result<StoredReport, DbError> {
    let conversion = |message: String| DbError::Conversion { message };

    let report_id: String = row.to_value("report_id").unwrap_or_default();
    let report_id = ReportId::parse(&report_id).map_err(|e| conversion(e.to_string()))?;

    let report_type: String = row.to_value("report_type").unwrap_or_default();
    let report_type = report_type
        .parse::<ReportType>()
        .map_err(|e| {
            conversion(format!("report {report_id}: bad report type {report_type:?}: {e}"))
        })?;

    let threat_level: i32 = row.to_value("threat_level").unwrap_or(2);
    let threat_level = u8::try_from(threat_level)
        .ok()
        .and_then(|v| ThreatLevel::from_value(v).ok())
        .unwrap_or_default();

    let activity: Option<String> = row.to_value("mining_activity_type").unwrap_or(None);
    let mining_activity_type = activity.and_then(|a| a.parse::<MiningActivityType>().ok());

    let evidence_json: String = row.to_value("evidence_files").unwrap_or_default();
    let evidence_files: Vec<String> = if evidence_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&evidence_json)?
    };

    let status: String = row.to_value("status").unwrap_or_default();
    let status = status.parse::<ReportStatus>().unwrap_or_default();

    let blur_faces: i64 = row.to_value("blur_faces").unwrap_or(1);
    let strip_location: i64 = row.to_value("strip_location").unwrap_or(1);

    Ok(StoredReport {
        record: ReportRecord {
            report_id,
            report_type,
            threat_level,
            mining_activity_type,
            incident_description: row.to_value("incident_description").unwrap_or_default(),
            location_lat: row.to_value("location_lat").unwrap_or(None),
            location_lng: row.to_value("location_lng").unwrap_or(None),
            location_description: row.to_value("location_description").unwrap_or_default(),
            evidence_files,
            blur_faces: blur_faces != 0,
            strip_location: strip_location != 0,
            user_agent: row.to_value("user_agent").unwrap_or_default(),
        },
        status,
        created_at: row.to_value("created_at").unwrap_or_default(),
        updated_at: row.to_value("updated_at").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;

    fn record(id: &str) -> ReportRecord {
        ReportRecord {
            report_id: ReportId::parse(id).unwrap(),
            report_type: ReportType::Citizen,
            threat_level: ThreatLevel::High,
            mining_activity_type: Some(MiningActivityType::Riverbed),
            incident_description: "Dredgers on the Ankobra".to_string(),
            location_lat: Some(5.6037),
            location_lng: Some(-0.1870),
            location_description: "Accra".to_string(),
            evidence_files: vec!["boat.jpg".to_string()],
            blur_faces: true,
            strip_location: false,
            user_agent: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn stored_report_reads_back() {
        let db = temp_db().await;
        let submitted = record("ID-AAAA1111");
        insert_report(db.as_ref(), &submitted).await.unwrap();

        let stored = get_report_by_id(db.as_ref(), "ID-AAAA1111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.record, submitted);
        assert_eq!(stored.status, ReportStatus::Pending);
        assert!(!stored.created_at.is_empty());
    }

    #[tokio::test]
    async fn missing_location_is_stored_as_null() {
        let db = temp_db().await;
        let mut submitted = record("ID-BBBB2222");
        submitted.location_lat = None;
        submitted.location_lng = None;
        submitted.mining_activity_type = None;
        submitted.evidence_files.clear();
        insert_report(db.as_ref(), &submitted).await.unwrap();

        let all = get_all_reports(db.as_ref()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record, submitted);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let db = temp_db().await;
        insert_report(db.as_ref(), &record("ID-CCCC3333")).await.unwrap();
        assert!(insert_report(db.as_ref(), &record("ID-CCCC3333")).await.is_err());
    }

    #[tokio::test]
    async fn status_update_reports_unknown_ids() {
        let db = temp_db().await;
        insert_report(db.as_ref(), &record("ID-DDDD4444")).await.unwrap();

        assert!(
            update_report_status(db.as_ref(), "ID-DDDD4444", ReportStatus::Verified)
                .await
                .unwrap()
        );
        assert!(
            !update_report_status(db.as_ref(), "ID-ZZZZ9999", ReportStatus::Verified)
                .await
                .unwrap()
        );

        let stored = get_report_by_id(db.as_ref(), "ID-DDDD4444")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ReportStatus::Verified);
        assert!(get_report_by_id(db.as_ref(), "ID-ZZZZ9999").await.unwrap().is_none());
    }
}
