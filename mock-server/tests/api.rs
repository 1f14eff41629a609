use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use quick_xml::{events::Event, Reader};
use tower::ServiceExt;

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

fn xml_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/XTMail")
        .header(http::header::CONTENT_TYPE, "text/xml")
        .header(http::header::ACCEPT, "*/*")
        .body(body.to_string())
        .unwrap()
}

fn mailing(campaign_id: &str, emails: &[&str]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<XTMAILING>\n\
         <CAMPAIGN_ID>{campaign_id}</CAMPAIGN_ID>\n\
         <SHOW_ALL_SEND_DETAIL>true</SHOW_ALL_SEND_DETAIL>\n\
         <SEND_AS_BATCH>false</SEND_AS_BATCH>\n\
         <NO_RETRY_ON_FAILURE>false</NO_RETRY_ON_FAILURE>\n"
    );
    for email in emails {
        xml.push_str(&format!(
            "<RECIPIENT>\n<EMAIL>{email}</EMAIL>\n<BODY_TYPE>HTML</BODY_TYPE>\n</RECIPIENT>\n"
        ));
    }
    xml.push_str("</XTMAILING>");
    xml
}

/// Text of every `<tag>` element in `xml`, in document order.
fn fields(xml: &str, tag: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut found = Vec::new();
    let mut current: Option<String> = None;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == tag.as_bytes() => current = Some(String::new()),
            Event::Empty(e) if e.name().as_ref() == tag.as_bytes() => found.push(String::new()),
            Event::Text(e) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&e.unescape().unwrap());
                }
            }
            Event::End(e) if e.name().as_ref() == tag.as_bytes() => found.extend(current.take()),
            Event::Eof => break,
            _ => {}
        }
    }
    found
}

fn field(xml: &str, tag: &str) -> Option<String> {
    fields(xml, tag).into_iter().next()
}

// --- content type ---

#[tokio::test]
async fn rejects_non_xml_content_type() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/XTMail")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn get_is_not_allowed() {
    let resp = app()
        .oneshot(Request::builder().uri("/XTMail").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- accepted mailings ---

#[tokio::test]
async fn accepts_mailing_with_recipients() {
    let resp = app()
        .oneshot(xml_request(&mailing("3556005", &["a@example.com", "b@example.com"])))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let body = body_text(resp).await;
    assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
    assert_eq!(field(&body, "STATUS").as_deref(), Some("0"));
    assert_eq!(field(&body, "CAMPAIGN_ID").as_deref(), Some("3556005"));
    assert_eq!(field(&body, "RECIPIENTS_RECEIVED").as_deref(), Some("2"));
    assert_eq!(field(&body, "EMAILS_SENT").as_deref(), Some("2"));
    assert_eq!(fields(&body, "RECIPIENT_DETAIL").len(), 2);
}

#[tokio::test]
async fn accepts_mailing_without_recipients() {
    let resp = app().oneshot(xml_request(&mailing("1", &[]))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert_eq!(field(&body, "STATUS").as_deref(), Some("0"));
    assert_eq!(field(&body, "RECIPIENTS_RECEIVED").as_deref(), Some("0"));
    assert!(fields(&body, "RECIPIENT_DETAIL").is_empty());
}

#[tokio::test]
async fn invalid_addresses_are_reported_per_recipient() {
    let resp = app()
        .oneshot(xml_request(&mailing("1", &["ok@example.com", "not-an-address"])))
        .await
        .unwrap();

    let body = body_text(resp).await;
    assert_eq!(field(&body, "STATUS").as_deref(), Some("0"));
    assert_eq!(field(&body, "EMAILS_SENT").as_deref(), Some("1"));
    assert_eq!(field(&body, "NUMBER_ERRORS").as_deref(), Some("1"));
    assert!(fields(&body, "ERROR_STRING").contains(&"Invalid email address".to_string()));
}

// --- rejected mailings ---

#[tokio::test]
async fn empty_campaign_id_is_rejected() {
    let resp = app().oneshot(xml_request(&mailing("", &["a@example.com"]))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert_eq!(field(&body, "STATUS").as_deref(), Some("1"));
    assert_eq!(field(&body, "ERROR_STRING").as_deref(), Some("Campaign Id is required"));
}

#[tokio::test]
async fn malformed_xml_is_rejected() {
    let resp = app().oneshot(xml_request("<XTMAILING><CAMPAIGN_ID>1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert_eq!(field(&body, "STATUS").as_deref(), Some("1"));
    assert_eq!(field(&body, "ERROR_STRING").as_deref(), Some("Invalid XML request"));
}

// --- repeated sends ---

#[tokio::test]
async fn each_send_gets_a_fresh_transaction_id() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&mailing("9", &["a@example.com"])))
        .await
        .unwrap();
    let first = body_text(resp).await;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&mailing("9", &["a@example.com"])))
        .await
        .unwrap();
    let second = body_text(resp).await;

    let first_id = field(&first, "TRANSACTION_ID").unwrap();
    let second_id = field(&second, "TRANSACTION_ID").unwrap();
    assert_eq!(first_id.len(), 36);
    assert_ne!(first_id, second_id);
}
