//! SOAP envelope rendering and response parsing.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use indoc::formatdoc;
use roxmltree::{Document, Node};

use crate::error::{GaroonError, GaroonResult};

/// Renders a SOAP 1.2 request envelope for a Garoon action.
///
/// Credentials go into a WS-Security `UsernameToken` header and the
/// request is stamped as valid for 24 hours from `created`. Each
/// `params` entry becomes an attribute of the `<parameters>` element,
/// which is how the Garoon API passes simple arguments.
pub fn render_soap_request(
    action: &str,
    user: &str,
    password: &str,
    language: &str,
    params: &[(&str, String)],
    created: DateTime<Utc>,
) -> String {
    let expires = created + Duration::hours(24);
    let attributes: String = params
        .iter()
        .map(|(name, value)| format!(" {name}=\"{}\"", escape_xml(value)))
        .collect();

    formatdoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
          <soap:Header>
            <Action>{action}</Action>
            <Security xmlns:wsu="http://schemas.xmlsoap.org/ws/2002/07/utility" xmlns="http://schemas.xmlsoap.org/ws/2002/12/secext" soap:mustUnderstand="1">
              <UsernameToken wsu:Id="id">
                <Username>{user}</Username>
                <Password>{password}</Password>
              </UsernameToken>
            </Security>
            <Timestamp xmlns="http://schemas.xmlsoap.org/ws/2002/07/utility" soap:mustUnderstand="1" Id="id">
              <Created>{created}</Created>
              <Expires>{expires}</Expires>
            </Timestamp>
            <Locale>{language}</Locale>
          </soap:Header>
          <soap:Body>
            <{action}>
              <parameters{attributes}/>
            </{action}>
          </soap:Body>
        </soap:Envelope>
    "#,
        action = action,
        user = escape_xml(user),
        password = escape_xml(password),
        language = escape_xml(language),
        created = created.to_rfc3339_opts(SecondsFormat::Secs, true),
        expires = expires.to_rfc3339_opts(SecondsFormat::Secs, true),
        attributes = attributes,
    }
}

/// Parses a SOAP response body, surfacing a `Fault` element as
/// [`GaroonError::SoapFault`].
pub fn parse_soap_response(text: &str) -> GaroonResult<Document<'_>> {
    let doc = Document::parse(text)
        .map_err(|e| GaroonError::ResponseParse(format!("invalid SOAP response: {e}")))?;

    if let Some(fault) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "Fault")
    {
        let code = text_at(fault, &["Code", "Value"]);
        let reason = text_at(fault, &["Reason", "Text"]);
        return Err(GaroonError::SoapFault {
            code: code.unwrap_or_else(|| "unknown".to_string()),
            reason: reason.unwrap_or_else(|| "unknown".to_string()),
        });
    }

    Ok(doc)
}

/// Follows a chain of child element names and returns the trimmed text
/// of the last one.
fn text_at(node: Node<'_, '_>, path: &[&str]) -> Option<String> {
    let mut current = node;
    for name in path {
        current = current
            .children()
            .find(|c| c.tag_name().name() == *name)?;
    }
    current.text().map(|t| t.trim().to_string())
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
