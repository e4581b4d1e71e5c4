use anyhow::Result;
use front_desk::{
    DeletePolicy, DeskError, LocalStorage, Repository, ReservationService, StoreFiles,
};
use serde_json::json;
use tempfile::TempDir;

fn repository(temp_dir: &TempDir) -> Repository<LocalStorage> {
    Repository::new(LocalStorage::new(temp_dir.path()), &StoreFiles::default())
}

fn write(temp_dir: &TempDir, name: &str, content: &str) -> Result<()> {
    std::fs::write(temp_dir.path().join(name), content)?;
    Ok(())
}

/// N 筆有效紀錄加一筆損壞紀錄，應載入 N 筆並回報一筆錯誤
#[test]
fn test_one_malformed_reservation_among_valid_ones() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data = json!({
        "R001": {
            "id": "R001", "customer_id": "C1", "hotel_id": "H1", "room_number": 1,
            "start_date": "2024-01-01", "end_date": "2024-01-03", "status": "active"
        },
        "R002": {
            "id": "R002", "customer_id": "C1", "hotel_id": "H1", "room_number": 1,
            "start_date": "2024-01-09", "end_date": "2024-01-03", "status": "active"
        },
        "R003": {
            "id": "R003", "customer_id": "C2", "hotel_id": "H1", "room_number": 2,
            "start_date": "2024-01-01", "end_date": "2024-01-03", "status": "cancelled"
        }
    });
    write(&temp_dir, "reservations.json", &data.to_string())?;

    let report = repository(&temp_dir).load_reservations()?;
    assert_eq!(report.entities.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key, "R002");
    assert!(report.skipped[0].reason.contains("before end_date"));
    Ok(())
}

#[test]
fn test_wrong_types_and_missing_fields_are_skipped() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data = json!({
        "H1": {"id": "H1", "name": "Uno", "address": "Centro", "total_rooms": 3},
        "H2": {"id": "H2", "name": "Dos", "address": "Centro", "total_rooms": "three"},
        "H3": {"id": "H3", "name": "Tres", "total_rooms": 3},
        "H4": {"id": "H4", "name": "Cuatro", "address": "Centro", "total_rooms": -1}
    });
    write(&temp_dir, "hotels.json", &data.to_string())?;

    let report = repository(&temp_dir).load_hotels()?;
    assert_eq!(report.entities.keys().collect::<Vec<_>>(), vec!["H1"]);
    assert_eq!(report.skipped.len(), 3);
    Ok(())
}

#[test]
fn test_corrupted_store_reports_storage_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(&temp_dir, "hotels.json", "{ this is not valid json }")?;
    write(&temp_dir, "customers.json", "")?;

    let service = ReservationService::new(repository(&temp_dir), DeletePolicy::Reject);

    assert!(matches!(service.list_hotels(), Err(DeskError::StorageError { .. })));
    // 空檔案視為沒有資料
    assert!(service.list_customers()?.is_empty());
    // 不存在的檔案也視為沒有資料
    assert!(service.list_reservations()?.is_empty());

    let checks = service.check_stores();
    assert_eq!(checks.len(), 3);
    assert!(checks[0].error.as_deref().unwrap_or_default().contains("invalid JSON"));
    assert!(checks[1].error.is_none());
    assert!(checks[2].error.is_none());
    Ok(())
}

#[test]
fn test_non_mapping_store_is_storage_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(&temp_dir, "reservations.json", r#""R1""#)?;

    let err = repository(&temp_dir).load_reservations().unwrap_err();
    assert!(matches!(err, DeskError::StorageError { .. }));
    assert!(err.to_string().contains("expected an object keyed by id"));
    Ok(())
}

/// 舊版的陣列格式與大寫狀態仍可讀取，存檔後轉為以 id 為鍵的物件
#[test]
fn test_legacy_list_store_is_upgraded_on_save() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(
        &temp_dir,
        "customers.json",
        &json!([{"id": "C1", "name": "Cliente Uno", "contact": "c1@example.com"}]).to_string(),
    )?;
    write(
        &temp_dir,
        "hotels.json",
        &json!([{"id": "H1", "name": "Uno", "address": "Centro", "total_rooms": 2}]).to_string(),
    )?;
    write(
        &temp_dir,
        "reservations.json",
        &json!([{
            "id": "R101", "customer_id": "C1", "hotel_id": "H1", "room_number": 1,
            "start_date": "2024-01-01", "end_date": "2024-01-03", "status": "ACTIVE"
        }])
        .to_string(),
    )?;

    let service = ReservationService::new(repository(&temp_dir), DeletePolicy::Reject);
    let created = service.create_reservation("C1", "H1", 2, "2024-01-01", "2024-01-03")?;
    assert_eq!(created.id(), "R102");

    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(
        temp_dir.path().join("reservations.json"),
    )?)?;
    assert_eq!(saved["R101"]["status"], "active");
    assert_eq!(saved["R102"]["room_number"], 2);
    Ok(())
}

#[test]
fn test_service_keeps_working_after_skipping_records() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(
        &temp_dir,
        "customers.json",
        &json!({
            "C1": {"id": "C1", "name": "Cliente Uno", "contact": "c1@example.com"},
            "C2": {"id": "C2", "name": "Cliente Dos"}
        })
        .to_string(),
    )?;

    let service = ReservationService::new(repository(&temp_dir), DeletePolicy::Reject);
    assert_eq!(service.list_customers()?.len(), 1);
    assert!(matches!(service.show_customer("C2"), Err(DeskError::NotFoundError { .. })));

    // 存檔時損壞的紀錄不會被寫回
    service.delete_customer("C1")?;
    let saved = std::fs::read_to_string(temp_dir.path().join("customers.json"))?;
    assert_eq!(serde_json::from_str::<serde_json::Value>(&saved)?, json!({}));
    Ok(())
}
