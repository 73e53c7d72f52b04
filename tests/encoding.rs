//! Tests for the SMTP envelope and raw message encoder.

use mail_parser::MessageParser;
use mailroom::encoder;
use mailroom::{
    Address, Attachment, DefaultFormatter, Email, Error, HeaderValue, ValidationError,
};

fn normalized(email: Email) -> Email {
    email.normalize(&DefaultFormatter).unwrap()
}

fn text_only_email() -> Email {
    normalized(
        Email::new()
            .from(("John", "john@x.com"))
            .to(("Jane", "jane@x.com"))
            .subject("Hi")
            .text_body("hey"),
    )
}

fn dual_body_email() -> Email {
    normalized(
        Email::new()
            .from(("John", "john@x.com"))
            .to(("Jane", "jane@x.com"))
            .subject("Hi")
            .text_body("hey text")
            .html_body("<p>hey html</p>"),
    )
}

/// Pull the boundary token out of a `boundary="..."` parameter.
fn boundary_of(raw: &str, content_type: &str) -> String {
    let marker = format!("Content-Type: {content_type}; boundary=\"");
    let start = raw.find(&marker).expect("boundary header") + marker.len();
    let end = raw[start..].find('"').unwrap() + start;
    raw[start..end].to_string()
}

#[test]
fn envelope_strips_display_names_and_unions_recipients() {
    let email = normalized(
        Email::new()
            .from(("John", "john@x.com"))
            .to(("Jane", "jane@x.com"))
            .cc("copy@x.com")
            .bcc("blind@x.com"),
    );

    let envelope = encoder::envelope(&email).unwrap();
    assert_eq!(envelope.from, "john@x.com");
    assert_eq!(
        envelope.recipients,
        vec!["jane@x.com", "copy@x.com", "blind@x.com"]
    );
}

#[test]
fn text_only_message_has_no_multipart_wrapper() {
    let raw = encoder::render(&text_only_email()).unwrap();

    assert_eq!(raw.matches("Subject: Hi\r\n").count(), 1);
    assert!(!raw.contains("boundary"));
    assert_eq!(raw.matches("hey").count(), 1);
    assert!(raw.contains("\r\n\r\nhey\r\n"));
    assert!(raw.contains("Content-Type: text/plain; charset=utf-8\r\n"));
}

#[test]
fn html_only_message_is_written_directly() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .html_body("<p>hey</p>"),
    );
    let raw = encoder::render(&email).unwrap();

    assert!(raw.contains("Content-Type: text/html; charset=utf-8\r\n\r\n<p>hey</p>\r\n"));
    assert!(!raw.contains("multipart"));
}

#[test]
fn dual_body_message_is_multipart_alternative() {
    let raw = encoder::render(&dual_body_email()).unwrap();

    assert_eq!(raw.matches("Content-Type: multipart/alternative").count(), 1);
    let boundary = boundary_of(&raw, "multipart/alternative");
    assert_eq!(raw.matches(&format!("--{boundary}\r\n")).count(), 2);
    assert_eq!(raw.matches(&format!("--{boundary}--\r\n")).count(), 1);
    assert!(raw.contains("Content-ID: <text-body>\r\n"));
    assert!(raw.contains("Content-ID: <html-body>\r\n"));
    assert!(raw.contains("hey text"));
    assert!(raw.contains("<p>hey html</p>"));
}

#[test]
fn boundaries_are_unique_per_message() {
    let first = encoder::render(&dual_body_email()).unwrap();
    let second = encoder::render(&dual_body_email()).unwrap();

    assert_ne!(
        boundary_of(&first, "multipart/alternative"),
        boundary_of(&second, "multipart/alternative")
    );
}

#[test]
fn headers_carry_participants_and_mime_version() {
    let email = normalized(
        Email::new()
            .from(("John", "john@x.com"))
            .to(("Jane", "jane@x.com"))
            .cc("copy@x.com")
            .bcc("blind@x.com")
            .subject("Hi")
            .text_body("hey"),
    );
    let raw = encoder::render(&email).unwrap();

    assert!(raw.contains("From: John <john@x.com>\r\n"));
    assert!(raw.contains("To: Jane <jane@x.com>\r\n"));
    assert!(raw.contains("Cc: copy@x.com\r\n"));
    assert!(raw.contains("Bcc: blind@x.com\r\n"));
    assert!(raw.contains("MIME-Version: 1.0\r\n"));
    assert!(raw.contains("Date: "));
}

#[test]
fn custom_headers_are_emitted_once_per_value() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .header("X-Campaign", "launch")
            .header(
                "X-Tag",
                HeaderValue::Multiple(vec!["alpha".to_string(), "beta".to_string()]),
            )
            .text_body("hey"),
    );
    let raw = encoder::render(&email).unwrap();

    assert!(raw.contains("X-Campaign: launch\r\n"));
    assert!(raw.contains("X-Tag: alpha\r\n"));
    assert!(raw.contains("X-Tag: beta\r\n"));
}

#[test]
fn header_values_with_line_breaks_are_rejected() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .text_body("hey"),
    );

    let smuggled = email.clone().subject("Hi\r\nBcc: evil@x.com");
    assert_eq!(
        encoder::render(&smuggled).unwrap_err(),
        Error::Validation(ValidationError::HeaderInjection("Subject".to_string()))
    );

    let smuggled = email.header("X-Note", "a\nb");
    assert!(matches!(
        encoder::render(&smuggled).unwrap_err(),
        Error::Validation(ValidationError::HeaderInjection(_))
    ));
}

#[test]
fn display_names_with_specials_are_quoted() {
    let email = normalized(
        Email::new()
            .from(("Doe, John", "john@x.com"))
            .to("jane@x.com")
            .text_body("hey"),
    );
    let raw = encoder::render(&email).unwrap();

    assert!(raw.contains("From: \"Doe, John\" <john@x.com>\r\n"));
}

#[test]
fn long_recipient_lists_are_folded() {
    let recipients: Vec<Address> = (0..8)
        .map(|i| Address::new(format!("very.long.recipient.{i}@subdomain.example.com")))
        .collect();
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to(recipients)
            .text_body("hey"),
    );
    let raw = encoder::render(&email).unwrap();

    assert!(raw.contains("\r\n "));
    for line in raw.split("\r\n") {
        assert!(line.len() <= 998, "line too long: {line}");
    }
}

#[test]
fn attachments_wrap_the_message_in_multipart_mixed() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .subject("Report")
            .text_body("see attached")
            .attachment(Attachment::new(
                "report.pdf",
                "application/pdf",
                b"PDFDATA".to_vec(),
            )),
    );
    let raw = encoder::render(&email).unwrap();

    assert_eq!(raw.matches("Content-Type: multipart/mixed").count(), 1);
    let boundary = boundary_of(&raw, "multipart/mixed");
    assert!(raw.contains(&format!("--{boundary}--\r\n")));
    assert!(raw.contains("Content-Type: application/pdf\r\n"));
    assert!(raw.contains("Content-Transfer-Encoding: base64\r\n"));
    assert!(raw.contains("Content-Disposition: attachment; filename=\"report.pdf\"\r\n"));
    // base64 of PDFDATA
    assert!(raw.contains("UERGREFUQQ==\r\n"));
}

#[test]
fn attachments_with_a_content_id_are_inline() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .html_body("<img src=\"cid:logo\">")
            .attachment(
                Attachment::new("logo.png", "image/png", b"PNGDATA".to_vec())
                    .content_id("logo"),
            ),
    );
    let raw = encoder::render(&email).unwrap();

    assert!(raw.contains("Content-Disposition: inline; filename=\"logo.png\"\r\n"));
    assert!(raw.contains("Content-ID: <logo>\r\n"));
}

#[test]
fn dual_body_with_attachment_nests_alternative_inside_mixed() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .text_body("hey text")
            .html_body("<p>hey html</p>")
            .attachment(Attachment::new(
                "notes.txt",
                "text/plain",
                b"notes".to_vec(),
            )),
    );
    let raw = encoder::render(&email).unwrap();

    assert_eq!(raw.matches("Content-Type: multipart/mixed").count(), 1);
    assert_eq!(raw.matches("Content-Type: multipart/alternative").count(), 1);
}

#[test]
fn rendered_message_parses_back_cleanly() {
    let raw = encoder::render(&dual_body_email()).unwrap();

    let parsed = MessageParser::default().parse(raw.as_bytes()).unwrap();
    assert_eq!(parsed.subject().as_deref(), Some("Hi"));
    let from = parsed.from().and_then(|a| a.first()).unwrap();
    assert_eq!(from.name().as_deref(), Some("John"));
    assert_eq!(from.address().as_deref(), Some("john@x.com"));
    let to = parsed.to().and_then(|a| a.first()).unwrap();
    assert_eq!(to.address().as_deref(), Some("jane@x.com"));
    assert!(parsed.body_text(0).unwrap().contains("hey text"));
    assert!(parsed.body_html(0).unwrap().contains("hey html"));
}

#[test]
fn rendered_attachment_survives_a_parse_round_trip() {
    let email = normalized(
        Email::new()
            .from("john@x.com")
            .to("jane@x.com")
            .text_body("see attached")
            .attachment(Attachment::new(
                "report.pdf",
                "application/pdf",
                b"PDFDATA".to_vec(),
            )),
    );
    let raw = encoder::render(&email).unwrap();

    let parsed = MessageParser::default().parse(raw.as_bytes()).unwrap();
    let attachment = parsed.attachments().next().unwrap();
    assert_eq!(attachment.contents(), b"PDFDATA");
}

#[test]
fn rendering_requires_a_normalized_sender() {
    let email = Email::new().to("jane@x.com").text_body("hey");
    assert_eq!(
        encoder::render(&email).unwrap_err(),
        Error::Validation(ValidationError::EmptyFrom)
    );
    assert_eq!(
        encoder::envelope(&email).unwrap_err(),
        Error::Validation(ValidationError::EmptyFrom)
    );
}
