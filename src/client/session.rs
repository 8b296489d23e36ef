//! Session establishment.
//!
//! Either a pre-issued access token is used as-is, or the partner SOAP `login`
//! call exchanges username, password and security token for a session id.

use crate::error::{BulkDeleteError, Result};
use quick_xml::escape::escape;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// An authenticated session against one org
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Scheme and host of the org, e.g. `https://acme.my.salesforce.com`
    pub instance_url: String,
    pub access_token: String,
}

impl Session {
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"***")
            .finish()
    }
}

/// Username/password credentials for the SOAP login
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("security_token", &"***")
            .finish()
    }
}

/// Where the client gets its session from
#[derive(Debug, Clone)]
pub enum SessionSource {
    Static(Session),
    SoapLogin {
        credentials: Credentials,
        /// Base URL of the login host, e.g. `https://login.salesforce.com`
        login_url: String,
    },
}

impl SessionSource {
    /// SOAP login against `https://{domain}.salesforce.com`
    pub fn soap_login(credentials: Credentials, domain: &str) -> Self {
        Self::SoapLogin {
            credentials,
            login_url: login_url_for_domain(domain),
        }
    }
}

/// `login` -> `https://login.salesforce.com`; a full URL is used unchanged
pub fn login_url_for_domain(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.trim_end_matches('/').to_string()
    } else {
        format!("https://{domain}.salesforce.com")
    }
}

/// Exchange credentials for a session through the partner SOAP API
pub async fn soap_login(
    http: &Client,
    login_url: &str,
    api_version: &str,
    credentials: &Credentials,
) -> Result<Session> {
    let endpoint = format!("{login_url}/services/Soap/u/{api_version}");
    debug!(endpoint = %endpoint, username = %credentials.username, "Requesting SOAP login");

    let response = http
        .post(&endpoint)
        .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(login_envelope(credentials))
        .send()
        .await
        .map_err(|e| BulkDeleteError::transport("login", e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BulkDeleteError::transport("login", e.to_string()))?;

    if !status.is_success() {
        let reason = fault_reason(&body).unwrap_or(body);
        return Err(BulkDeleteError::authentication(format!(
            "HTTP {}: {reason}",
            status.as_u16()
        )));
    }

    let result = parse_login_result(&body)?;
    let server_url = Url::parse(&result.server_url.value)
        .map_err(|e| BulkDeleteError::authentication(format!("invalid serverUrl: {e}")))?;
    let instance_url = server_url.origin().ascii_serialization();

    info!(instance_url = %instance_url, "Connected to Salesforce");

    Ok(Session::new(instance_url, result.session_id.value))
}

fn login_envelope(credentials: &Credentials) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8" ?>"#,
            r#"<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<env:Body><n1:login xmlns:n1="urn:partner.soap.sforce.com">"#,
            "<n1:username>{}</n1:username>",
            "<n1:password>{}{}</n1:password>",
            "</n1:login></env:Body></env:Envelope>"
        ),
        escape(&credentials.username),
        escape(&credentials.password),
        escape(&credentials.security_token),
    )
}

/// `<soapenv:Envelope>`; element names are matched without their prefix
#[derive(Debug, Deserialize)]
struct SoapEnvelope {
    #[serde(rename = "Body")]
    body: SoapBody,
}

#[derive(Debug, Deserialize)]
struct SoapBody {
    #[serde(rename = "loginResponse", default)]
    login_response: Option<LoginResponse>,
    #[serde(rename = "Fault", default)]
    fault: Option<SoapFault>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    result: LoginResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult {
    server_url: XmlText,
    session_id: XmlText,
}

#[derive(Debug, Deserialize)]
struct SoapFault {
    #[serde(default)]
    faultcode: Option<XmlText>,
    #[serde(default)]
    faultstring: Option<XmlText>,
}

/// Text content of an element, whatever attributes it carries
#[derive(Debug, Deserialize)]
struct XmlText {
    #[serde(rename = "$text", default)]
    value: String,
}

fn parse_envelope(body: &str) -> Result<SoapEnvelope> {
    quick_xml::de::from_str(body).map_err(|e| {
        BulkDeleteError::authentication(format!("malformed login response: {e}"))
    })
}

fn parse_login_result(body: &str) -> Result<LoginResult> {
    let envelope = parse_envelope(body)?;
    if let Some(fault) = envelope.body.fault {
        return Err(BulkDeleteError::authentication(fault.reason()));
    }
    let result = envelope
        .body
        .login_response
        .map(|response| response.result)
        .ok_or_else(|| BulkDeleteError::authentication("login response has no result"))?;

    if result.session_id.value.trim().is_empty() {
        return Err(BulkDeleteError::authentication(
            "login response has no sessionId",
        ));
    }
    Ok(result)
}

fn fault_reason(body: &str) -> Option<String> {
    parse_envelope(body).ok()?.body.fault.map(|fault| fault.reason())
}

impl SoapFault {
    fn reason(&self) -> String {
        match (&self.faultstring, &self.faultcode) {
            (Some(text), _) if !text.value.is_empty() => text.value.clone(),
            (_, Some(code)) => code.value.clone(),
            _ => "SOAP fault without a reason".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_result_with_prefixes_and_attributes() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soapenv:Body><loginResponse><result>",
            "<metadataServerUrl>https://acme.my.salesforce.com/services/Soap/m/59.0/00D</metadataServerUrl>",
            "<passwordExpired>false</passwordExpired>",
            "<serverUrl>https://acme.my.salesforce.com/services/Soap/u/59.0/00D</serverUrl>",
            r#"<sessionId xsi:type="xsd:string">00D!AQ&amp;x</sessionId>"#,
            "<userInfo><userName>ops@acme.com</userName></userInfo>",
            "</result></loginResponse></soapenv:Body></soapenv:Envelope>"
        );

        let result = parse_login_result(xml).unwrap();
        assert_eq!(result.session_id.value, "00D!AQ&x");
        assert_eq!(
            result.server_url.value,
            "https://acme.my.salesforce.com/services/Soap/u/59.0/00D"
        );
        assert_eq!(fault_reason(xml), None);
    }

    #[test]
    fn test_fault_reason_is_unescaped() {
        let fault = concat!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<soapenv:Body><soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode>",
            "<faultstring>can&apos;t &amp; won&apos;t</faultstring>",
            "</soapenv:Fault></soapenv:Body></soapenv:Envelope>"
        );

        assert_eq!(fault_reason(fault).as_deref(), Some("can't & won't"));
        let err = parse_login_result(fault).unwrap_err();
        assert!(err.to_string().contains("can't & won't"));
    }

    #[test]
    fn test_login_response_without_session_is_rejected() {
        let xml = "<Envelope><Body><loginResponse><result><serverUrl>https://x.example</serverUrl><sessionId/></result></loginResponse></Body></Envelope>";
        assert!(matches!(
            parse_login_result(xml),
            Err(BulkDeleteError::Authentication { .. })
        ));
        assert!(parse_login_result("not xml at all").is_err());
    }

    #[test]
    fn test_envelope_escapes_credentials() {
        let envelope = login_envelope(&Credentials {
            username: "ops@acme.com".into(),
            password: "p<w>&".into(),
            security_token: "TOK".into(),
        });
        assert!(envelope.contains("<n1:username>ops@acme.com</n1:username>"));
        assert!(envelope.contains("<n1:password>p&lt;w&gt;&amp;TOK</n1:password>"));
    }

    #[test]
    fn test_login_url_for_domain() {
        assert_eq!(login_url_for_domain("login"), "https://login.salesforce.com");
        assert_eq!(login_url_for_domain("test"), "https://test.salesforce.com");
        assert_eq!(
            login_url_for_domain("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_credentials_debug_is_masked() {
        let rendered = format!(
            "{:?}",
            Credentials {
                username: "u".into(),
                password: "hunter2".into(),
                security_token: "tok".into(),
            }
        );
        assert!(!rendered.contains("hunter2"));
    }
}
