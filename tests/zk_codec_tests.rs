use attsync::core::normalize::{MapRules, normalize};
use attsync::device::zk::{checksum, decode_time, parse_attendance, parse_record};
use attsync::models::RawValue;
use chrono::NaiveDate;

/// Build one 40-byte attendance entry the way the firmware packs it.
fn entry(uid: u16, user_id: &str, status: u8, time: u32, punch: u8) -> Vec<u8> {
    let mut e = Vec::with_capacity(40);
    e.extend_from_slice(&uid.to_le_bytes());

    let mut name = [0u8; 24];
    for (i, b) in user_id.bytes().take(24).enumerate() {
        name[i] = b;
    }
    e.extend_from_slice(&name);

    e.push(status);
    e.extend_from_slice(&time.to_le_bytes());
    e.push(punch);
    e.extend_from_slice(&[0u8; 8]);
    e
}

/// Wrap packed entries in the blob framing: 4-byte total size, then entries.
fn blob(entries: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = entries.iter().map(|e| e.len()).sum();
    let mut data = Vec::with_capacity(4 + total);
    data.extend_from_slice(&(total as u32).to_le_bytes());
    for e in entries {
        data.extend_from_slice(e);
    }
    data
}

/// Seconds-since-2000 in the terminal's 31-day-month calendar.
fn device_time(year: u32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> u32 {
    ((((year - 2000) * 12 + (month - 1)) * 31 + (day - 1)) * 24 + hour) * 3600 + min * 60 + sec
}

#[test]
fn test_checksum_of_connect_payload() {
    // CMD_CONNECT (1000) with zeroed checksum, session and reply fields
    let payload = [0xE8, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    assert_eq!(checksum(&payload), 0xFC16);
}

#[test]
fn test_checksum_folds_at_word_boundary() {
    // A single full word exercises the fold below zero twice
    assert_eq!(checksum(&[0xFF, 0xFF]), 0xFFFE);
}

#[test]
fn test_checksum_of_odd_length_payload() {
    assert_eq!(checksum(&[0x01]), 0xFFFD);
}

#[test]
fn test_checksum_of_empty_payload() {
    assert_eq!(checksum(&[]), 0xFFFE);
}

#[test]
fn test_decode_time_one_day_after_epoch() {
    let expected = NaiveDate::from_ymd_opt(2000, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid datetime");
    assert_eq!(decode_time(86400), Some(expected));
}

#[test]
fn test_decode_time_recent_timestamp() {
    let expected = NaiveDate::from_ymd_opt(2025, 8, 23)
        .and_then(|d| d.and_hms_opt(14, 30, 5))
        .expect("valid datetime");
    assert_eq!(decode_time(824221805), Some(expected));
}

#[test]
fn test_decode_time_round_trips_through_packing() {
    let t = device_time(2025, 8, 23, 14, 30, 5);
    assert_eq!(t, 824221805);
}

#[test]
fn test_decode_time_rejects_padding_days() {
    // The wire calendar gives every month 31 days; February 30 is padding
    let t = device_time(2025, 2, 30, 0, 0, 0);
    assert_eq!(decode_time(t), None);
}

#[test]
fn test_parse_record_extracts_all_fields() {
    let e = entry(5, "1007", 1, device_time(2025, 8, 23, 14, 30, 5), 0);
    let record = parse_record(&e).expect("record should parse");

    assert_eq!(record.get("uid"), Some(&RawValue::Int(5)));
    assert_eq!(record.get("user_id"), Some(&RawValue::Text("1007".into())));
    assert_eq!(record.get("status"), Some(&RawValue::Int(1)));
    assert_eq!(record.get("punch"), Some(&RawValue::Int(0)));

    let expected = NaiveDate::from_ymd_opt(2025, 8, 23)
        .and_then(|d| d.and_hms_opt(14, 30, 5))
        .expect("valid datetime");
    assert_eq!(record.get("timestamp"), Some(&RawValue::Time(expected)));
}

#[test]
fn test_parse_record_blank_user_id_leaves_numeric_uid() {
    let e = entry(5, "", 1, device_time(2025, 8, 23, 8, 0, 0), 0);
    let record = parse_record(&e).expect("record should parse");

    assert!(record.get("user_id").is_none());

    // The normalizer then falls back to the numeric uid as the subject
    let ev = normalize(&record, &MapRules::default()).expect("normalizes via uid");
    assert_eq!(ev.subject_id, "5");
    assert_eq!(ev.event_time, "2025-08-23T08:00:00");
}

#[test]
fn test_parse_record_drops_undecodable_timestamp() {
    let e = entry(5, "1007", 1, device_time(2025, 2, 30, 0, 0, 0), 0);
    assert!(parse_record(&e).is_none());
}

#[test]
fn test_parse_record_rejects_short_entries() {
    assert!(parse_record(&[0u8; 39]).is_none());
}

#[test]
fn test_parse_attendance_splits_packed_entries() {
    let entries = vec![
        entry(1, "7", 0, device_time(2025, 3, 1, 8, 0, 0), 0),
        entry(2, "9", 0, device_time(2025, 3, 1, 8, 5, 0), 1),
    ];
    let records = parse_attendance(&blob(&entries));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("user_id"), Some(&RawValue::Text("7".into())));
    assert_eq!(records[1].get("user_id"), Some(&RawValue::Text("9".into())));
}

#[test]
fn test_parse_attendance_discards_misaligned_blob() {
    let mut data = blob(&[entry(1, "7", 0, device_time(2025, 3, 1, 8, 0, 0), 0)]);
    data.push(0xAB);
    assert!(parse_attendance(&data).is_empty());
}

#[test]
fn test_parse_attendance_tolerates_empty_blob() {
    assert!(parse_attendance(&[]).is_empty());
    assert!(parse_attendance(&blob(&[])).is_empty());
}
