//! WSDL endpoint discovery.
//!
//! Garoon publishes one WSDL document listing a SOAP port per API
//! family (ScheduleService, AddressService, ...). The port name is the
//! service name the rest of the crate addresses endpoints by.

use std::collections::HashMap;

use roxmltree::Document;
use url::Url;

use crate::error::{GaroonError, GaroonResult};

/// Extracts the service-name to endpoint-URL map from a WSDL document.
///
/// The relevant shape is
/// `<service><port name="..."><soap12:address location="..."/></port></service>`;
/// everything else in the document is ignored. A document with no
/// usable ports fails with [`GaroonError::ResponseParse`].
pub fn parse_wsdl_endpoints(text: &str) -> GaroonResult<HashMap<String, Url>> {
    let doc = Document::parse(text)
        .map_err(|e| GaroonError::ResponseParse(format!("invalid WSDL: {e}")))?;

    let mut endpoints = HashMap::new();
    for port in doc
        .descendants()
        .filter(|n| n.tag_name().name() == "port")
    {
        let Some(name) = port.attribute("name") else {
            continue;
        };
        let Some(location) = port
            .children()
            .find(|c| c.tag_name().name() == "address")
            .and_then(|address| address.attribute("location"))
        else {
            continue;
        };

        let url = Url::parse(location).map_err(|e| {
            GaroonError::ResponseParse(format!("invalid endpoint location {location:?}: {e}"))
        })?;
        endpoints.insert(name.to_string(), url);
    }

    if endpoints.is_empty() {
        return Err(GaroonError::ResponseParse(
            "WSDL lists no service endpoints".to_string(),
        ));
    }
    Ok(endpoints)
}

/// Process-local endpoint cache.
///
/// A lookup miss does not answer "unknown" by itself: the caller is
/// expected to re-fetch the WSDL once and retry, since the server may
/// have published new services since the cache was filled.
#[derive(Debug, Default)]
pub struct EndpointDirectory {
    endpoints: Option<HashMap<String, Url>>,
}

impl EndpointDirectory {
    /// Whether the directory has been filled at least once.
    pub fn is_loaded(&self) -> bool {
        self.endpoints.is_some()
    }

    /// Replaces the cached map wholesale.
    pub fn replace(&mut self, endpoints: HashMap<String, Url>) {
        self.endpoints = Some(endpoints);
    }

    pub fn lookup(&self, service: &str) -> Option<&Url> {
        self.endpoints.as_ref().and_then(|map| map.get(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
             xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
             targetNamespace="http://wsdl.cybozu.co.jp/api/2008">
  <service name="GaroonServices">
    <port name="ScheduleService">
      <soap12:address location="https://garoon.example.com/cgi-bin/cbgrn/grn.cgi/cbpapi/schedule/api?"/>
    </port>
    <port name="AddressService">
      <soap12:address location="https://garoon.example.com/cgi-bin/cbgrn/grn.cgi/cbpapi/address/api?"/>
    </port>
  </service>
</definitions>"#;

    #[test]
    fn test_parse_extracts_every_port() {
        let endpoints = parse_wsdl_endpoints(WSDL).expect("should parse");
        assert_eq!(endpoints.len(), 2);
        assert_eq!(
            endpoints
                .get("ScheduleService")
                .expect("should contain ScheduleService")
                .as_str(),
            "https://garoon.example.com/cgi-bin/cbgrn/grn.cgi/cbpapi/schedule/api?"
        );
        assert!(endpoints.contains_key("AddressService"));
    }

    #[test]
    fn test_ports_without_name_or_address_are_skipped() {
        let wsdl = r#"<definitions xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/">
          <service>
            <port><soap12:address location="https://a.example.com/api"/></port>
            <port name="Orphan"/>
            <port name="ScheduleService">
              <soap12:address location="https://b.example.com/api"/>
            </port>
          </service>
        </definitions>"#;

        let endpoints = parse_wsdl_endpoints(wsdl).expect("should parse");
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints.contains_key("ScheduleService"));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        assert!(matches!(
            parse_wsdl_endpoints("<definitions><service>"),
            Err(GaroonError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_wsdl_without_endpoints_is_rejected() {
        assert!(matches!(
            parse_wsdl_endpoints("<definitions><service/></definitions>"),
            Err(GaroonError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_invalid_endpoint_location_is_rejected() {
        let wsdl = r#"<definitions>
          <service>
            <port name="ScheduleService"><address location="not a url"/></port>
          </service>
        </definitions>"#;

        assert!(matches!(
            parse_wsdl_endpoints(wsdl),
            Err(GaroonError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_directory_lookup_and_replace() {
        let mut directory = EndpointDirectory::default();
        assert!(!directory.is_loaded());
        assert!(directory.lookup("ScheduleService").is_none());

        directory.replace(parse_wsdl_endpoints(WSDL).expect("should parse"));
        assert!(directory.is_loaded());
        assert!(directory.lookup("ScheduleService").is_some());
        assert!(directory.lookup("MessageService").is_none());
    }
}
