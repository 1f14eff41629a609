//! In-process stand-in for the `XTMail` transactional endpoint.
//!
//! Accepts `XTMAILING` documents on `POST /XTMail` and answers with an
//! `XTMAILING_RESPONSE` in the same shape the real service uses.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use quick_xml::{events::Event, Reader};
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

/// What the mock needs from an incoming request.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MailingSummary {
    pub campaign_id: String,
    pub emails: Vec<String>,
}

/// One `RECIPIENT_DETAIL` in the reply.
#[derive(Debug, PartialEq, Eq)]
pub struct SendResult {
    pub email: String,
    pub error: Option<&'static str>,
}

pub fn app() -> Router {
    Router::new().route("/XTMail", post(xtmail))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn xtmail(headers: HeaderMap, body: String) -> impl IntoResponse {
    let is_xml = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/xml"));
    if !is_xml {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, String::new()).into_response();
    }

    let xml = match summarize(&body) {
        Err(reason) => {
            debug!(%reason, "rejecting malformed request");
            failure_response("", "Invalid XML request")
        }
        Ok(summary) if summary.campaign_id.is_empty() => failure_response("", "Campaign Id is required"),
        Ok(summary) => {
            let results = send_results(&summary.emails);
            info!(
                campaign_id = %summary.campaign_id,
                recipients = results.len(),
                "accepted mailing"
            );
            success_response(&summary.campaign_id, &results)
        }
    };

    ([(header::CONTENT_TYPE, "text/xml")], xml).into_response()
}

/// Pull the campaign id and recipient emails out of an `XTMAILING` body.
pub fn summarize(xml: &str) -> Result<MailingSummary, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut summary = MailingSummary::default();
    let mut path: Vec<String> = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if path.is_empty() {
                    if name != "XTMAILING" {
                        return Err(format!("unexpected root <{name}>"));
                    }
                    saw_root = true;
                }
                if name == "RECIPIENT" {
                    summary.emails.push(String::new());
                }
                path.push(name);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| e.to_string())?.into_owned();
                match path.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
                    ["XTMAILING", "CAMPAIGN_ID"] => summary.campaign_id = text,
                    ["XTMAILING", "RECIPIENT", "EMAIL"] => {
                        if let Some(email) = summary.emails.last_mut() {
                            *email = text;
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root || !path.is_empty() {
        return Err("incomplete document".to_string());
    }
    Ok(summary)
}

pub fn send_results(emails: &[String]) -> Vec<SendResult> {
    emails
        .iter()
        .map(|email| SendResult {
            email: email.clone(),
            error: (!email.contains('@')).then_some("Invalid email address"),
        })
        .collect()
}

fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

fn success_response(campaign_id: &str, results: &[SendResult]) -> String {
    let errors = results.iter().filter(|r| r.error.is_some()).count();
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <XTMAILING_RESPONSE>\n\
         <CAMPAIGN_ID>{campaign}</CAMPAIGN_ID>\n\
         <TRANSACTION_ID>{transaction}</TRANSACTION_ID>\n\
         <RECIPIENTS_RECEIVED>{received}</RECIPIENTS_RECEIVED>\n\
         <EMAILS_SENT>{sent}</EMAILS_SENT>\n\
         <NUMBER_ERRORS>{errors}</NUMBER_ERRORS>\n\
         <STATUS>0</STATUS>\n\
         <ERROR_CODE>0</ERROR_CODE>\n\
         <ERROR_STRING />\n",
        campaign = escape(campaign_id),
        transaction = Uuid::new_v4(),
        received = results.len(),
        sent = results.len() - errors,
    );
    for result in results {
        let (status, error) = match result.error {
            Some(message) => (1, format!("<ERROR_STRING>{message}</ERROR_STRING>")),
            None => (0, "<ERROR_STRING />".to_string()),
        };
        xml.push_str(&format!(
            "<RECIPIENT_DETAIL>\n<EMAIL>{}</EMAIL>\n<SEND_STATUS>{status}</SEND_STATUS>\n\
             <ERROR_CODE>{status}</ERROR_CODE>\n{error}\n</RECIPIENT_DETAIL>\n",
            escape(&result.email),
        ));
    }
    xml.push_str("</XTMAILING_RESPONSE>");
    xml
}

fn failure_response(campaign_id: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <XTMAILING_RESPONSE>\n\
         <CAMPAIGN_ID>{}</CAMPAIGN_ID>\n\
         <RECIPIENTS_RECEIVED>0</RECIPIENTS_RECEIVED>\n\
         <EMAILS_SENT>0</EMAILS_SENT>\n\
         <NUMBER_ERRORS>0</NUMBER_ERRORS>\n\
         <STATUS>1</STATUS>\n\
         <ERROR_CODE>1</ERROR_CODE>\n\
         <ERROR_STRING>{}</ERROR_STRING>\n\
         </XTMAILING_RESPONSE>",
        escape(campaign_id),
        escape(message),
    )
}
