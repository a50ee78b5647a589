use chrono::{TimeZone, Utc};
use netid_core::{
    format, generate_at, hex_to_duid, normalize, parse, validate, DuidError, DuidVariant,
    GenerateOptions, HexCase,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn duid_built_from_normalized_mac_decodes_back_to_it() {
    let mac = normalize("0050.56ab.cdef").expect("cisco form");
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    for variant in [DuidVariant::Llt, DuidVariant::Ll] {
        let duid = generate_at(variant, Some(mac), &GenerateOptions::default(), now, &mut rng)
            .expect("generate");
        let text = format(&duid, HexCase::Upper);
        let reparsed = hex_to_duid(&text).expect("uppercase hex is accepted");
        assert_eq!(reparsed, duid);
        assert_eq!(reparsed.mac_address(), Some(mac));
    }
}

#[test]
fn parse_reports_calendar_time_for_llt() {
    // 00:01 LLT, 00:01 Ethernet, 0x00000e10 = one hour after the DUID epoch.
    let bytes = [
        0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0e, 0x10, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
    ];
    let info = parse(&bytes).expect("parse");
    assert_eq!(info.variant, DuidVariant::Llt);
    assert_eq!(info.timestamp, Some(3600));
    assert_eq!(info.time.as_deref(), Some("2000-01-01T01:00:00Z"));
    assert_eq!(info.link_layer_address.as_deref(), Some("00:11:22:33:44:55"));
}

#[test]
fn five_byte_ll_is_rejected_not_truncated() {
    let err = parse(&[0x00, 0x03, 0x00, 0x01, 0xaa]).expect_err("too short");
    assert!(matches!(err, DuidError::Length { actual: 5, .. }), "{err}");
}

#[test]
fn validate_and_normalize_agree_on_canonical_form() {
    let result = validate("00-1a-2B-3c-4D-5e");
    assert!(result.valid);
    let normalized = result.normalized.expect("normalized");
    assert_eq!(normalized, "00:1A:2B:3C:4D:5E");
    assert_eq!(
        normalize(&normalized).expect("canonical").to_string(),
        normalized
    );
}
