//! CAP 1.2 element builders.
//!
//! Each builder reads one element kind from the tree into its strict record.
//! Repeating elements are always collected as lists, and name/value pairs are
//! read the same way whether they are encoded as child elements
//! (`<valueName>`/`<value>`) or as attributes.

use crate::error::ParseError;
use crate::model::{Alert, AlertArea, AlertHeader, AlertInfo, NameValue};
use crate::xml::{parse_document, Element};

/// Parse every `<alert>` root in `source`, in document order.
pub fn parse_alerts(source: &str) -> Result<Vec<Alert>, ParseError> {
    let roots = parse_document(source)?;

    let mut found = Vec::new();
    for root in &roots {
        root.find_all("alert", &mut found);
    }

    if found.is_empty() {
        return Err(ParseError::NoAlert);
    }

    Ok(found
        .into_iter()
        .map(|element| build_alert(element, source))
        .collect())
}

fn texts(element: &Element, name: &str) -> Vec<String> {
    element
        .children_named(name)
        .map(|child| child.text.clone())
        .collect()
}

fn build_name_value(element: &Element) -> NameValue {
    let name = element
        .child_text("valueName")
        .or_else(|| element.attr("valueName").map(str::to_string))
        .or_else(|| element.attr("name").map(str::to_string));

    let value = element
        .child_text("value")
        .or_else(|| element.attr("value").map(str::to_string))
        .or_else(|| (!element.text.is_empty()).then(|| element.text.clone()));

    NameValue { name, value }
}

fn name_values(element: &Element, name: &str) -> Vec<NameValue> {
    element.children_named(name).map(build_name_value).collect()
}

pub fn build_area(element: &Element) -> AlertArea {
    AlertArea {
        area_desc: element.child_text("areaDesc"),
        altitude: element.child_text("altitude"),
        ceiling: element.child_text("ceiling"),
        polygons: texts(element, "polygon"),
        circles: texts(element, "circle"),
        geocodes: name_values(element, "geocode"),
    }
}

pub fn build_info(element: &Element) -> AlertInfo {
    AlertInfo {
        language: element.child_text("language"),
        category: texts(element, "category"),
        event: element.child_text("event"),
        response_type: texts(element, "responseType"),
        urgency: element.child_text("urgency"),
        severity: element.child_text("severity"),
        certainty: element.child_text("certainty"),
        effective: element.child_text("effective"),
        onset: element.child_text("onset"),
        expires: element.child_text("expires"),
        sender_name: element.child_text("senderName"),
        headline: element.child_text("headline"),
        description: element.child_text("description"),
        instruction: element.child_text("instruction"),
        web: element.child_text("web"),
        contact: element.child_text("contact"),
        parameters: name_values(element, "parameter"),
        event_codes: name_values(element, "eventCode"),
        areas: element.children_named("area").map(build_area).collect(),
    }
}

pub fn build_header(element: &Element) -> AlertHeader {
    AlertHeader {
        identifier: element.child_text("identifier"),
        sender: element.child_text("sender"),
        sent: element.child_text("sent"),
        status: element.child_text("status"),
        msg_type: element.child_text("msgType"),
        scope: element.child_text("scope"),
        references: element.child_text("references"),
        note: element.child_text("note"),
    }
}

pub fn build_alert(element: &Element, source: &str) -> Alert {
    Alert {
        area: None,
        file: None,
        header: build_header(element),
        infos: element.children_named("info").map(build_info).collect(),
        raw_xml: element.source(source).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_INFOS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>2.49.0.0.724.0.ES.20240101120000.614102VI</identifier>
  <sender>http://www.aemet.es</sender>
  <sent>2024-01-01T12:00:00+01:00</sent>
  <status>Actual</status>
  <msgType>Alert</msgType>
  <scope>Public</scope>
  <info>
    <language>es-ES</language>
    <category>Met</category>
    <event>Aviso de vientos de nivel amarillo</event>
    <responseType>Monitor</responseType>
    <urgency>Future</urgency>
    <severity>Moderate</severity>
    <certainty>Likely</certainty>
    <headline>Aviso amarillo</headline>
    <description></description>
    <eventCode><valueName>AEMET-Meteoalerta fenomeno</valueName><value>VI;Vientos</value></eventCode>
    <parameter><valueName>AEMET-Meteoalerta nivel</valueName><value>amarillo</value></parameter>
    <parameter><valueName>AEMET-Meteoalerta probabilidad</valueName><value>40%-70%</value></parameter>
    <area>
      <areaDesc>Litoral de Cádiz</areaDesc>
      <polygon>36.5,-6.3 36.6,-6.2 36.5,-6.3</polygon>
      <geocode><valueName>AEMET-Meteoalerta zona</valueName><value>614102</value></geocode>
    </area>
  </info>
  <info>
    <language>en-GB</language>
    <category>Met</category>
    <category>Safety</category>
    <event>Yellow wind warning</event>
    <area>
      <areaDesc>Cadiz coast</areaDesc>
      <geocode><valueName>AEMET-Meteoalerta zona</valueName><value>614102</value></geocode>
    </area>
  </info>
</alert>
"#;

    #[test]
    fn test_header_fields() {
        let alerts = parse_alerts(TWO_INFOS).unwrap();
        assert_eq!(alerts.len(), 1);
        let header = &alerts[0].header;
        assert_eq!(
            header.identifier.as_deref(),
            Some("2.49.0.0.724.0.ES.20240101120000.614102VI")
        );
        assert_eq!(header.msg_type.as_deref(), Some("Alert"));
        assert_eq!(header.references, None);
    }

    #[test]
    fn test_every_info_is_kept_in_order() {
        let alert = parse_alerts(TWO_INFOS).unwrap().remove(0);
        assert_eq!(alert.infos.len(), 2);
        assert_eq!(alert.infos[0].language.as_deref(), Some("es-ES"));
        assert_eq!(alert.infos[1].language.as_deref(), Some("en-GB"));
    }

    #[test]
    fn test_single_occurrences_become_lists() {
        let alert = parse_alerts(TWO_INFOS).unwrap().remove(0);
        let es = &alert.infos[0];
        assert_eq!(es.category, vec!["Met"]);
        assert_eq!(es.response_type, vec!["Monitor"]);
        assert_eq!(es.event_codes.len(), 1);
        assert_eq!(es.areas.len(), 1);
        assert_eq!(es.areas[0].polygons.len(), 1);
        assert!(es.areas[0].circles.is_empty());

        let en = &alert.infos[1];
        assert_eq!(en.category, vec!["Met", "Safety"]);
        assert!(en.response_type.is_empty());
    }

    #[test]
    fn test_parameters_keep_order() {
        let alert = parse_alerts(TWO_INFOS).unwrap().remove(0);
        let params = &alert.infos[0].parameters;
        assert_eq!(params[0], NameValue::new("AEMET-Meteoalerta nivel", "amarillo"));
        assert_eq!(
            params[1],
            NameValue::new("AEMET-Meteoalerta probabilidad", "40%-70%")
        );
    }

    #[test]
    fn test_blank_is_distinct_from_absent() {
        let alert = parse_alerts(TWO_INFOS).unwrap().remove(0);
        assert_eq!(alert.infos[0].description.as_deref(), Some(""));
        assert_eq!(alert.infos[0].instruction, None);
        assert_eq!(alert.infos[1].headline, None);
    }

    #[test]
    fn test_attribute_encoded_pairs() {
        let xml = r#"<alert><info>
            <eventCode valueName="AEMET-Meteoalerta fenomeno" value="VI"/>
            <parameter name="nivel" value="rojo"/>
            <area><geocode valueName="AEMET-Meteoalerta zona" value="614102"/></area>
        </info></alert>"#;
        let alert = parse_alerts(xml).unwrap().remove(0);
        let info = &alert.infos[0];
        assert_eq!(info.event_codes[0], NameValue::new("AEMET-Meteoalerta fenomeno", "VI"));
        assert_eq!(info.parameters[0], NameValue::new("nivel", "rojo"));
        assert_eq!(
            info.areas[0].geocodes[0],
            NameValue::new("AEMET-Meteoalerta zona", "614102")
        );
    }

    #[test]
    fn test_prefixed_roots_and_multiple_alerts() {
        let xml = r#"<bundle xmlns:cap="urn:oasis:names:tc:emergency:cap:1.2">
            <cap:alert><cap:identifier>one</cap:identifier></cap:alert>
            <cap:alert><cap:identifier>two</cap:identifier></cap:alert>
        </bundle>"#;
        let alerts = parse_alerts(xml).unwrap();
        let ids: Vec<_> = alerts
            .iter()
            .map(|a| a.header.identifier.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["one", "two"]);
        assert!(alerts[0].infos.is_empty());
        assert_eq!(
            alerts[1].raw_xml,
            "<cap:alert><cap:identifier>two</cap:identifier></cap:alert>"
        );
    }

    #[test]
    fn test_raw_xml_is_verbatim() {
        let alert = parse_alerts(TWO_INFOS).unwrap().remove(0);
        assert!(alert.raw_xml.starts_with("<alert xmlns="));
        assert!(alert.raw_xml.ends_with("</alert>"));
        assert!(alert.raw_xml.contains("Litoral de Cádiz"));
    }

    #[test]
    fn test_document_without_alert() {
        assert!(matches!(parse_alerts("<feed/>"), Err(ParseError::NoAlert)));
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse_alerts("<alert><info></alert>").is_err());
    }
}
