//! The mining license directory.
//!
//! Seeded from `seeds/licenses.toml`, embedded at compile time.

use std::fmt::Write as _;

use galamsey_watch_license_models::{
    LicenseContact, LicenseQuery, LicenseScale, LicenseStatus, MiningLicense,
};
use moosicbox_json_utils::database::ToValue as _;
use serde::Deserialize;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

const SEED_TOML: &str = include_str!("../seeds/licenses.toml");

#[derive(Deserialize)]
struct SeedFile {
    licenses: Vec<MiningLicense>,
}

/// Parses the embedded reference licenses.
///
/// # Errors
///
/// Returns [`DbError::Seed`] if the embedded file is malformed.
pub fn seed_data() -> Result<Vec<MiningLicense>, DbError> {
    let seed: SeedFile = toml::de::from_str(SEED_TOML)?;
    Ok(seed.licenses)
}

/// Replaces the directory contents with the embedded reference licenses.
///
/// The delete and the inserts run in one transaction, so a failed insert
/// leaves the previous directory in place. Returns the number of licenses
/// inserted.
///
/// # Errors
///
/// Returns [`DbError`] if the seed file is invalid or a write fails.
pub async fn seed_licenses(db: &dyn Database) -> Result<usize, DbError> {
    let licenses = seed_data()?;

    let txn = db.begin_transaction().await?;

    if let Err(e) = replace_licenses(txn.as_ref(), &licenses).await {
        log::error!("License seeding failed, rolling back: {e}");
        txn.rollback().await?;
        return Err(e);
    }

    txn.commit().await?;

    log::info!("Seeded {} license(s)", licenses.len());
    Ok(licenses.len())
}

async fn replace_licenses(db: &dyn Database, licenses: &[MiningLicense]) -> Result<(), DbError> {
    let cleared = db.exec_raw_params("DELETE FROM mining_licenses", &[]).await?;
    log::info!("Cleared {cleared} existing license(s)");

    for license in licenses {
        insert_license(db, license).await?;
    }

    Ok(())
}

async fn insert_license(db: &dyn Database, license: &MiningLicense) -> Result<(), DbError> {
    let documents_json = serde_json::to_string(&license.document_files)?;

    db.exec_raw_params(
        "INSERT INTO mining_licenses (
            license_id, license_type, company_name, company_type, region,
            district, status, area_description, latitude, longitude, area_size,
            contact_name, contact_position, contact_email, contact_phone,
            document_files
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        &[
            DatabaseValue::String(license.license_id.clone()),
            DatabaseValue::String(license.license_type.as_ref().to_string()),
            DatabaseValue::String(license.company_name.clone()),
            DatabaseValue::String(license.company_type.clone()),
            DatabaseValue::String(license.region.clone()),
            DatabaseValue::String(license.district.clone()),
            DatabaseValue::String(license.status.as_ref().to_string()),
            DatabaseValue::String(license.area_description.clone()),
            DatabaseValue::Real64(license.latitude),
            DatabaseValue::Real64(license.longitude),
            DatabaseValue::String(license.area_size.clone()),
            DatabaseValue::String(license.contact.name.clone()),
            DatabaseValue::String(license.contact.position.clone()),
            DatabaseValue::String(license.contact.email.clone()),
            DatabaseValue::String(license.contact.phone.clone()),
            DatabaseValue::String(documents_json),
        ],
    )
    .await?;

    Ok(())
}

/// Lists licenses ordered by license id, optionally filtered by status and
/// region. The region match is case-insensitive.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn list_licenses(
    db: &dyn Database,
    query: &LicenseQuery,
) -> Result<Vec<MiningLicense>, DbError> {
    let mut sql = String::from("SELECT * FROM mining_licenses WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();

    if let Some(status) = query.status {
        params.push(DatabaseValue::String(status.as_ref().to_string()));
        let _ = write!(sql, " AND status = ${}", params.len());
    }

    if let Some(region) = query.region.as_deref().filter(|r| !r.trim().is_empty()) {
        params.push(DatabaseValue::String(region.trim().to_string()));
        let _ = write!(sql, " AND LOWER(region) = LOWER(${})", params.len());
    }

    sql.push_str(" ORDER BY license_id");

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.iter().map(license_from_row).collect()
}

fn license_from_row(row: &Row) -> Result<MiningLicense, DbError> {
    let license_id: String = row.to_value("license_id").unwrap_or_default();

    let license_type: String = row.to_value("license_type").unwrap_or_default();
    let license_type = license_type
        .parse::<LicenseScale>()
        .map_err(|e| DbError::Conversion {
            message: format!("license {license_id}: bad license type {license_type:?}: {e}"),
        })?;

    let status: String = row.to_value("status").unwrap_or_default();
    let status = status.parse::<LicenseStatus>().map_err(|e| DbError::Conversion {
        message: format!("license {license_id}: bad status {status:?}: {e}"),
    })?;

    let documents_json: String = row.to_value("document_files").unwrap_or_default();
    let document_files = if documents_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&documents_json)?
    };

    Ok(MiningLicense {
        license_id,
        license_type,
        company_name: row.to_value("company_name").unwrap_or_default(),
        company_type: row.to_value("company_type").unwrap_or_default(),
        region: row.to_value("region").unwrap_or_default(),
        district: row.to_value("district").unwrap_or_default(),
        status,
        area_description: row.to_value("area_description").unwrap_or_default(),
        latitude: row.to_value("latitude").unwrap_or(0.0),
        longitude: row.to_value("longitude").unwrap_or(0.0),
        area_size: row.to_value("area_size").unwrap_or_default(),
        contact: LicenseContact {
            name: row.to_value("contact_name").unwrap_or_default(),
            position: row.to_value("contact_position").unwrap_or_default(),
            email: row.to_value("contact_email").unwrap_or_default(),
            phone: row.to_value("contact_phone").unwrap_or_default(),
        },
        document_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;

    #[test]
    fn embedded_seed_has_eight_licenses() {
        let licenses = seed_data().unwrap();
        assert_eq!(licenses.len(), 8);
        assert_eq!(licenses[0].license_id, "ML-2025-0485");
        assert_eq!(licenses[0].company_name, "GoldFields Ghana Ltd.");
        assert_eq!(licenses[0].license_type, LicenseScale::Large);
        assert!(licenses[3].document_files.is_empty());
        assert_eq!(licenses[7].status, LicenseStatus::Expired);
    }

    #[tokio::test]
    async fn reseeding_replaces_rows() {
        let db = temp_db().await;
        assert_eq!(seed_licenses(db.as_ref()).await.unwrap(), 8);
        assert_eq!(seed_licenses(db.as_ref()).await.unwrap(), 8);

        let all = list_licenses(db.as_ref(), &LicenseQuery::default()).await.unwrap();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].license_id, "ML-2024-0478");
        assert_eq!(all, {
            let mut seed = seed_data().unwrap();
            seed.sort_by(|a, b| a.license_id.cmp(&b.license_id));
            seed
        });
    }

    #[tokio::test]
    async fn failed_reseed_keeps_existing_directory() {
        let db = temp_db().await;
        seed_licenses(db.as_ref()).await.unwrap();

        let mut duplicated = seed_data().unwrap();
        duplicated.push(duplicated[0].clone());

        let txn = db.begin_transaction().await.unwrap();
        assert!(replace_licenses(txn.as_ref(), &duplicated).await.is_err());
        txn.rollback().await.unwrap();

        let all = list_licenses(db.as_ref(), &LicenseQuery::default()).await.unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn filters_by_status_and_region() {
        let db = temp_db().await;
        seed_licenses(db.as_ref()).await.unwrap();

        let revoked = list_licenses(
            db.as_ref(),
            &LicenseQuery {
                status: Some(LicenseStatus::Revoked),
                region: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(revoked.len(), 1);
        assert_eq!(revoked[0].district, "Kibi");

        let western_active = list_licenses(
            db.as_ref(),
            &LicenseQuery {
                status: Some(LicenseStatus::Active),
                region: Some("western region".to_string()),
            },
        )
        .await
        .unwrap();
        let ids: Vec<&str> = western_active.iter().map(|l| l.license_id.as_str()).collect();
        assert_eq!(ids, ["ML-2024-0481", "ML-2025-0483", "ML-2025-0485"]);
    }
}
