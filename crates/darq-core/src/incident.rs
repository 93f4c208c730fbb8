//! Incident Record Parsing
//!
//! Turns a raw DLP incident XML document into a typed [`IncidentRecord`].
//! The document carries an envelope namespace and an incident-domain
//! namespace; elements are matched by local name so either prefix form is
//! accepted.

use crate::classify::{RuleCatalog, Severity};
use crate::error::DarqError;
use crate::region::{Region, SiteTokens};
use crate::sharemap::ShareMap;
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

/// Cap on retained matched-content samples.
const MAX_MATCHED_SAMPLES: usize = 50;

/// One DLP policy-violation incident, as parsed from the scanner's XML.
///
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct IncidentRecord {
    pub incident_id: String,
    pub detect_time: NaiveDateTime,
    /// Per-rule match counts; the maximum is the headline "matches" value.
    pub match_counts: Vec<u64>,
    /// Masked matched-content samples, capped at 50 entries.
    pub matched_samples: Vec<String>,
    /// Domain-qualified owner identifier, e.g. `NA\jsmith`.
    pub owner_id: String,
    /// Administrative share path of the offending file.
    pub file_path: String,
    pub accessed_time: NaiveDateTime,
    pub modified_time: NaiveDateTime,
    /// Only `NETWORK` (file share scan) triggers downstream processing.
    pub resource_type: String,
    pub analyzed_by: String,
    /// Policy rule ids, input order.
    pub rule_ids: Vec<String>,
}

impl IncidentRecord {
    pub fn from_xml_file(path: &Path) -> Result<Self, DarqError> {
        let xml = std::fs::read_to_string(path).map_err(|e| DarqError::io(path, e))?;
        Self::from_xml_str(&xml)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, DarqError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut incident_id = None;
        let mut detect_time = None;
        let mut owner_id = None;
        let mut file_path = None;
        let mut accessed_time = None;
        let mut modified_time = None;
        let mut resource_type = None;
        let mut analyzed_by = None;
        let mut match_counts = Vec::new();
        let mut matched_samples = Vec::new();
        let mut rule_ids = Vec::new();

        let mut current: Vec<u8> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    current = e.local_name().as_ref().to_vec();

                    match current.as_slice() {
                        b"rule" => {
                            if let Some(attr) =
                                e.try_get_attribute("id").map_err(quick_xml::Error::from)?
                            {
                                rule_ids.push(attr.unescape_value()?.into_owned());
                            }
                        }
                        b"detail" => {
                            if let Some(attr) =
                                e.try_get_attribute("value").map_err(quick_xml::Error::from)?
                            {
                                owner_id = Some(attr.unescape_value()?.into_owned());
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    match current.as_slice() {
                        b"incidentId" => incident_id = Some(text),
                        b"localDetectedTime" => {
                            detect_time = Some(parse_timestamp("localDetectedTime", &text)?)
                        }
                        b"numOfMatches" => {
                            let n = text.trim().parse::<u64>().map_err(|_| DarqError::BadField {
                                field: "numOfMatches",
                                value: text.clone(),
                            })?;
                            match_counts.push(n);
                        }
                        b"masked" => {
                            if matched_samples.len() < MAX_MATCHED_SAMPLES {
                                matched_samples.push(text);
                            }
                        }
                        b"path" => file_path = Some(text),
                        b"dateAccessed" => {
                            accessed_time = Some(parse_timestamp("dateAccessed", &text)?)
                        }
                        b"dateModified" => {
                            modified_time = Some(parse_timestamp("dateModified", &text)?)
                        }
                        b"resourceType" => resource_type = Some(text),
                        b"analyzedBy" => analyzed_by = Some(text),
                        _ => {}
                    }
                }
                Event::End(_) => current.clear(),
                Event::Eof => break,
                _ => {}
            }
        }

        if match_counts.is_empty() {
            return Err(DarqError::MissingField("numOfMatches"));
        }

        Ok(Self {
            incident_id: incident_id.ok_or(DarqError::MissingField("incidentId"))?,
            detect_time: detect_time.ok_or(DarqError::MissingField("localDetectedTime"))?,
            match_counts,
            matched_samples,
            owner_id: owner_id.ok_or(DarqError::MissingField("detail"))?,
            file_path: file_path.ok_or(DarqError::MissingField("path"))?,
            accessed_time: accessed_time.ok_or(DarqError::MissingField("dateAccessed"))?,
            modified_time: modified_time.ok_or(DarqError::MissingField("dateModified"))?,
            resource_type: resource_type.ok_or(DarqError::MissingField("resourceType"))?,
            analyzed_by: analyzed_by.ok_or(DarqError::MissingField("analyzedBy"))?,
            rule_ids,
        })
    }

    /// Headline match count.
    pub fn max_matches(&self) -> u64 {
        self.match_counts.iter().copied().max().unwrap_or(0)
    }
}

/// The scanner emits a few timestamp layouts depending on locale settings.
fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, DarqError> {
    let v = value.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(v) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%d-%b-%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Ok(dt);
        }
    }

    Err(DarqError::BadField { field, value: value.to_string() })
}

/// [`IncidentRecord`] plus the fields derived during enrichment.
#[derive(Debug, Clone)]
pub struct EnrichedIncident {
    pub record: IncidentRecord,
    pub severity: Severity,
    pub rule_names: Vec<String>,
    pub classifier_names: Vec<String>,
    pub display_folder_path: String,
    pub display_file_name: String,
    /// `today + retention`, formatted for user-facing text.
    pub deletion_date: String,
    pub region: Option<Region>,
}

impl EnrichedIncident {
    /// Apply the rule catalog and share map, compute severity and region.
    pub fn enrich(
        record: IncidentRecord,
        catalog: &RuleCatalog,
        share_map: &ShareMap,
        tokens: &SiteTokens,
        deletion_date: String,
    ) -> Self {
        let (rule_names, classifier_names) = catalog.classify(&record.rule_ids);
        let (display_folder_path, display_file_name) = share_map.translate(&record.file_path);
        let severity = Severity::from_match_count(record.max_matches());
        let region = Region::from_path(&record.file_path, tokens);

        Self {
            record,
            severity,
            rule_names,
            classifier_names,
            display_folder_path,
            display_file_name,
            deletion_date,
            region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<methodCall xmlns="http://www.portauthoritytech.com/schmea/xml-rpc/1.0">
  <incident xmlns="http://www.portauthoritytech.com/schmea/incident/1.0">
    <incidentId>4211337</incidentId>
    <localDetectedTime>2019-05-20 14:12:11</localDetectedTime>
    <resourceType>NETWORK</resourceType>
    <analyzedBy>Policy Engine KNX01</analyzedBy>
    <detail value="NA\jsmith"/>
    <file>
      <path>\\SVPKNXDATA01\K$\Knoxville\Departments\Finance\cards.xlsx</path>
      <dateAccessed>2019-05-18 09:00:00</dateAccessed>
      <dateModified>2019-04-02 16:45:30</dateModified>
    </file>
    <rule id="18794"/>
    <rule id="18487"/>
    <numOfMatches>120</numOfMatches>
    <numOfMatches>12</numOfMatches>
    <masked>XXX-XX-1234</masked>
    <masked>XXX-XX-9876</masked>
  </incident>
</methodCall>"#;

    #[test]
    fn test_parse_sample_incident() {
        let rec = IncidentRecord::from_xml_str(SAMPLE).unwrap();

        assert_eq!(rec.incident_id, "4211337");
        assert_eq!(rec.owner_id, r"NA\jsmith");
        assert_eq!(rec.resource_type, "NETWORK");
        assert_eq!(rec.rule_ids, vec!["18794", "18487"]);
        assert_eq!(rec.match_counts, vec![120, 12]);
        assert_eq!(rec.max_matches(), 120);
        assert_eq!(rec.matched_samples.len(), 2);
        assert_eq!(rec.detect_time.format("%Y-%m-%d").to_string(), "2019-05-20");
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let xml = r#"<incident><incidentId>1</incidentId></incident>"#;
        let err = IncidentRecord::from_xml_str(xml).unwrap_err();
        assert!(matches!(err, DarqError::MissingField(_)));
    }

    #[test]
    fn test_sample_cap() {
        let mut xml = String::from("<incident><incidentId>1</incidentId>");
        xml.push_str("<localDetectedTime>2019-05-20 14:12:11</localDetectedTime>");
        xml.push_str("<detail value='NA\\u'/><path>\\\\s\\f</path>");
        xml.push_str("<dateAccessed>2019-05-20 14:12:11</dateAccessed>");
        xml.push_str("<dateModified>2019-05-20 14:12:11</dateModified>");
        xml.push_str("<resourceType>NETWORK</resourceType>");
        xml.push_str("<analyzedBy>pe01</analyzedBy>");
        xml.push_str("<numOfMatches>3</numOfMatches>");
        for i in 0..80 {
            xml.push_str(&format!("<masked>sample-{i}</masked>"));
        }
        xml.push_str("</incident>");

        let rec = IncidentRecord::from_xml_str(&xml).unwrap();
        assert_eq!(rec.matched_samples.len(), 50);
    }

    #[test]
    fn test_enrich_scenario_one() {
        let rec = IncidentRecord::from_xml_str(SAMPLE).unwrap();
        let rec = IncidentRecord { rule_ids: vec!["18794".into()], ..rec };

        let enriched = EnrichedIncident::enrich(
            rec,
            &RuleCatalog::production(),
            &ShareMap::empty(),
            &SiteTokens::default(),
            "Aug 18, 2019".into(),
        );

        assert_eq!(enriched.severity, Severity::High);
        assert_eq!(enriched.rule_names, vec!["US PII: SSN Narrow"]);
        assert_eq!(enriched.classifier_names, vec!["Social Security Number"]);
        assert_eq!(enriched.region, Some(Region::NorthAmerica));
    }
}
