//! End-to-end decoding of a realistic area bundle.

use std::io::Write;

use cap_parser::{open_bundle, parse_bytes, Alert, Bundle};
use flate2::write::GzEncoder;
use flate2::Compression;

fn cap_document(identifier: &str, zone: &str, area_desc: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>{identifier}</identifier>
  <sender>http://www.aemet.es</sender>
  <status>Actual</status>
  <msgType>Alert</msgType>
  <info>
    <language>es-ES</language>
    <category>Met</category>
    <event>Aviso de temperaturas máximas</event>
    <severity>Moderate</severity>
    <area>
      <areaDesc>{area_desc}</areaDesc>
      <geocode><valueName>AEMET-Meteoalerta zona</valueName><value>{zone}</value></geocode>
    </area>
  </info>
</alert>
"#
    )
}

fn gzipped_tar(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_slice()).unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_bundle_with_mixed_documents() {
    let mut latin1 = cap_document("id-latin1", "614103", "Campiña cordobesa").into_bytes();
    // Re-encode the one non-ASCII character as ISO-8859-1.
    let pos = latin1.windows(2).position(|w| w == "ñ".as_bytes()).unwrap();
    latin1.splice(pos..pos + 2, [0xf1]);

    let bytes = gzipped_tar(&[
        (
            "Z_CAP_C_LEMM_20240101120000_AFAZ614102VI.xml",
            cap_document("id-utf8", "614102", "Litoral de Cádiz").into_bytes(),
        ),
        ("Z_CAP_C_LEMM_20240101120000_AFAZ614103AT.xml", latin1),
        ("broken.xml", b"<alert><info></alert>".to_vec()),
        ("empty.xml", Vec::new()),
    ]);

    let bundle = open_bundle(&bytes, "raw");
    let entries = match &bundle {
        Bundle::Archive(entries) => entries,
        Bundle::Raw(_) => panic!("expected an archive"),
    };
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[3].size, 0);

    let results: Vec<Result<Vec<Alert>, _>> =
        entries.iter().map(|entry| parse_bytes(&entry.bytes)).collect();

    let first = results[0].as_ref().unwrap();
    assert_eq!(first[0].infos[0].areas[0].area_desc.as_deref(), Some("Litoral de Cádiz"));

    let second = results[1].as_ref().unwrap();
    assert_eq!(
        second[0].infos[0].areas[0].area_desc.as_deref(),
        Some("Campiña cordobesa")
    );

    assert!(results[2].is_err());
    assert!(results[3].is_err());
}

#[test]
fn test_alert_serializes_absent_fields_as_null() {
    let alerts = parse_bytes(cap_document("id-1", "614102", "Sierra").as_bytes()).unwrap();
    let json = serde_json::to_value(&alerts[0]).unwrap();

    assert_eq!(json["header"]["identifier"], "id-1");
    assert!(json["header"]["scope"].is_null());
    assert_eq!(json["infos"][0]["category"], serde_json::json!(["Met"]));
    assert_eq!(
        json["infos"][0]["areas"][0]["geocodes"][0]["value"],
        "614102"
    );
}
