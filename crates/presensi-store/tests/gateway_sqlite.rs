use chrono::{NaiveDate, NaiveTime};
use presensi_core::{
    AttendanceRecord, AttendanceStatus, CheckIn, CheckInEvent, Student, Teacher,
};
use presensi_store::{AttendanceFilter, QueryGateway, SlotFilter, SqliteGateway};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 17).unwrap()
}

fn record(student: &str, slot: i64, hour: u8, status: AttendanceStatus) -> AttendanceRecord {
    AttendanceRecord {
        student_id: student.to_string(),
        slot_id: slot,
        date: date(),
        hour,
        status,
        teacher_code: "G01".to_string(),
        class_id: "7A".to_string(),
    }
}

async fn seeded() -> SqliteGateway {
    let gw = SqliteGateway::open_in_memory().unwrap();
    gw.set_schedule_config("J1").await.unwrap();
    gw.insert_teacher(&Teacher {
        code: "G01".to_string(),
        name: "Budi Santoso".to_string(),
        phone: "0811".to_string(),
        homeroom_class: None,
    })
    .await
    .unwrap();
    gw.insert_student(&Student {
        id: "1001".to_string(),
        name: "citra".to_string(),
        class_id: "7A".to_string(),
    })
    .await
    .unwrap();
    gw.insert_student(&Student {
        id: "1002".to_string(),
        name: "Andi".to_string(),
        class_id: "7A".to_string(),
    })
    .await
    .unwrap();
    gw
}

#[tokio::test]
async fn test_open_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presensi.db");

    {
        let gw = SqliteGateway::open(&path).unwrap();
        gw.set_schedule_config("J1").await.unwrap();
    }

    let gw = SqliteGateway::open(&path).unwrap();
    assert_eq!(gw.find_schedule_config().await.unwrap().as_deref(), Some("J1"));
}

#[tokio::test]
async fn test_teacher_lookup_by_phone() {
    let gw = seeded().await;
    let teacher = gw.find_teacher_by_phone("0811").await.unwrap().unwrap();
    assert_eq!(teacher.code, "G01");
    assert!(!teacher.is_homeroom());

    assert!(gw.find_teacher_by_phone("0999").await.unwrap().is_none());
}

#[tokio::test]
async fn test_teacher_lookup_by_code() {
    let gw = seeded().await;
    let teacher = gw.find_teacher_by_code("G01").await.unwrap().unwrap();
    assert_eq!(teacher.name, "Budi Santoso");

    assert!(gw.find_teacher_by_code("G99").await.unwrap().is_none());
}

#[tokio::test]
async fn test_homeroom_teacher_maps_role() {
    let gw = SqliteGateway::open_in_memory().unwrap();
    gw.insert_teacher(&Teacher {
        code: "G02".to_string(),
        name: "Sri".to_string(),
        phone: "0822".to_string(),
        homeroom_class: Some("7A".to_string()),
    })
    .await
    .unwrap();

    let teacher = gw.find_teacher_by_phone("0822").await.unwrap().unwrap();
    assert_eq!(teacher.homeroom_class.as_deref(), Some("7A"));
}

#[tokio::test]
async fn test_schedule_config() {
    let gw = seeded().await;
    assert_eq!(gw.find_schedule_config().await.unwrap().as_deref(), Some("J1"));

    gw.set_schedule_config("J2").await.unwrap();
    assert_eq!(gw.find_schedule_config().await.unwrap().as_deref(), Some("J2"));
}

#[tokio::test]
async fn test_slots_filtered_and_ordered_by_hour() {
    let gw = seeded().await;
    gw.insert_slot("G01", "7A", "Mtk", 'A', 4, "J1").await.unwrap();
    gw.insert_slot("G01", "7A", "Mtk", 'A', 3, "J1").await.unwrap();
    gw.insert_slot("G01", "7B", "Mtk", 'A', 1, "J1").await.unwrap();
    gw.insert_slot("G01", "7A", "Mtk", 'B', 2, "J1").await.unwrap();

    let slots = gw
        .find_schedule_slots(&SlotFilter {
            teacher_code: Some("G01".to_string()),
            class_id: Some("7A".to_string()),
            day_code: Some('A'),
            config_id: Some("J1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let hours: Vec<u8> = slots.iter().map(|s| s.hour).collect();
    assert_eq!(hours, vec![3, 4]);
}

#[tokio::test]
async fn test_slots_hour_filter() {
    let gw = seeded().await;
    gw.insert_slot("G01", "7A", "Mtk", 'A', 3, "J1").await.unwrap();
    gw.insert_slot("G01", "7A", "Mtk", 'A', 4, "J1").await.unwrap();
    gw.insert_slot("G01", "7A", "Mtk", 'A', 7, "J1").await.unwrap();

    let slots = gw
        .find_schedule_slots(&SlotFilter {
            class_id: Some("7A".to_string()),
            hours: Some(vec![3, 4]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(slots.len(), 2);
}

#[tokio::test]
async fn test_roster_sorted_alphabetically() {
    let gw = seeded().await;
    let roster = gw.find_students_by_class("7A").await.unwrap();
    let names: Vec<&str> = roster.iter().map(|s| s.name.as_str()).collect();
    // Case-insensitive ordering: "Andi" before "citra".
    assert_eq!(names, vec!["Andi", "citra"]);
}

#[tokio::test]
async fn test_students_by_ids() {
    let gw = seeded().await;
    let students = gw
        .find_students_by_ids(&["1002".to_string()])
        .await
        .unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].name, "Andi");

    assert!(gw.find_students_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upsert_is_idempotent_per_key() {
    let gw = seeded().await;
    let batch = vec![record("1001", 10, 3, AttendanceStatus::Present)];

    gw.upsert_attendance(&batch).await.unwrap();
    gw.upsert_attendance(&batch).await.unwrap();

    let rows = gw
        .find_attendance(&AttendanceFilter {
            slot_ids: Some(vec![10]),
            date: Some(date()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, AttendanceStatus::Present);
}

#[tokio::test]
async fn test_upsert_overwrites_status_in_place() {
    let gw = seeded().await;
    gw.upsert_attendance(&[record("1001", 10, 3, AttendanceStatus::Present)])
        .await
        .unwrap();
    gw.upsert_attendance(&[record("1001", 10, 3, AttendanceStatus::Sick)])
        .await
        .unwrap();

    let rows = gw
        .find_attendance(&AttendanceFilter {
            slot_ids: Some(vec![10]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, AttendanceStatus::Sick);
}

#[tokio::test]
async fn test_batch_upsert_applies_every_row() {
    let gw = seeded().await;
    let batch = vec![
        record("1001", 11, 4, AttendanceStatus::Present),
        record("1002", 11, 4, AttendanceStatus::Present),
        record("1001", 12, 5, AttendanceStatus::Present),
        record("1002", 12, 5, AttendanceStatus::Present),
    ];
    gw.upsert_attendance(&batch).await.unwrap();

    let rows = gw
        .find_attendance(&AttendanceFilter {
            slot_ids: Some(vec![11, 12]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);

    // An empty batch is a no-op.
    gw.upsert_attendance(&[]).await.unwrap();
}

#[tokio::test]
async fn test_check_in_recorded_once_per_event() {
    let gw = seeded().await;
    let arrival = CheckIn {
        teacher_phone: "0811".to_string(),
        date: date(),
        time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        event: CheckInEvent::Arrival,
        latitude: -8.304,
        longitude: 114.137,
    };
    gw.insert_check_in(&arrival).await.unwrap();

    // A repeat arrival the same day leaves the original row untouched.
    let mut later = arrival.clone();
    later.time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    gw.insert_check_in(&later).await.unwrap();

    let check_ins = gw.find_check_ins("0811", date()).await.unwrap();
    assert_eq!(check_ins.len(), 1);
    assert_eq!(check_ins[0].time, NaiveTime::from_hms_opt(7, 0, 0).unwrap());

    // Departure is a distinct event type and is accepted.
    let mut departure = arrival;
    departure.event = CheckInEvent::Departure;
    gw.insert_check_in(&departure).await.unwrap();
    assert_eq!(gw.find_check_ins("0811", date()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_attendance_filter_by_teacher_and_date() {
    let gw = seeded().await;
    gw.upsert_attendance(&[
        record("1001", 20, 3, AttendanceStatus::Present),
        record("1002", 20, 3, AttendanceStatus::Absent),
    ])
    .await
    .unwrap();

    let rows = gw
        .find_attendance(&AttendanceFilter {
            teacher_code: Some("G01".to_string()),
            date: Some(date()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let none = gw
        .find_attendance(&AttendanceFilter {
            teacher_code: Some("G99".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}
