//! SMTP envelope extraction and raw message rendering.
//!
//! Produces the two artifacts an SMTP backend needs from a normalized
//! email: the protocol envelope (bare sender and recipient addresses) and
//! the RFC 5322 message bytes, including the multipart MIME structure when
//! an email carries both body variants or attachments.

use crate::address::{Address, Role};
use crate::email::{Attachment, Email};
use crate::error::{Error, Result, ValidationError};
use base64::prelude::*;
use uuid::Uuid;

/// Fold target for header lines.
const FOLD_AT: usize = 78;
/// Line width for base64 transfer-encoded parts.
const BASE64_WIDTH: usize = 76;

/// The SMTP-level sender/recipient pair, distinct from the message's
/// From/To headers. Display names are stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpEnvelope {
    pub from: String,
    pub recipients: Vec<String>,
}

/// Build the envelope from a normalized email. The recipient list is the
/// union of to, cc and bcc in that order.
pub fn envelope(email: &Email) -> Result<SmtpEnvelope> {
    let sender = email
        .from_address()
        .ok_or(Error::Validation(ValidationError::EmptyFrom))?;
    let recipients = email
        .recipients()
        .iter()
        .map(|address| address.address.clone())
        .collect();
    Ok(SmtpEnvelope {
        from: sender.address.clone(),
        recipients,
    })
}

/// Render the raw message: CRLF-terminated headers, then the body.
///
/// With both a text and an HTML body the message is
/// `multipart/alternative` with a boundary generated per message and a
/// `Content-ID` discriminating the parts; a single body is written directly
/// after the headers. Attachments wrap everything in `multipart/mixed`.
/// Header values carrying a literal CR or LF are rejected.
pub fn render(email: &Email) -> Result<String> {
    let sender = email
        .from_address()
        .ok_or(Error::Validation(ValidationError::EmptyFrom))?;
    check_inputs(email)?;

    let mut out = String::new();
    write_header(&mut out, Role::From.header_name(), &format_mailbox(sender));
    write_address_header(&mut out, Role::To.header_name(), email.to.addresses());
    write_address_header(&mut out, Role::Cc.header_name(), email.cc.addresses());
    write_address_header(&mut out, Role::Bcc.header_name(), email.bcc.addresses());
    if let Some(subject) = &email.subject {
        write_header(&mut out, "Subject", subject);
    }
    write_header(&mut out, "Date", &chrono::Utc::now().to_rfc2822());
    for (name, value) in &email.headers {
        for item in value.iter() {
            write_header(&mut out, name, item);
        }
    }
    out.push_str("MIME-Version: 1.0\r\n");

    if email.attachments.is_empty() {
        write_body(&mut out, email);
    } else {
        write_mixed(&mut out, email);
    }

    Ok(out)
}

/// Reject any header-bound value containing a line break before a single
/// byte is rendered.
fn check_inputs(email: &Email) -> Result<()> {
    for address in std::iter::once(email.from_address())
        .flatten()
        .chain(email.recipients())
    {
        check_value("address", &address.address)?;
        if let Some(name) = &address.name {
            check_value("display name", name)?;
        }
    }
    if let Some(subject) = &email.subject {
        check_value("Subject", subject)?;
    }
    for (name, value) in &email.headers {
        check_value(name, name)?;
        for item in value.iter() {
            check_value(name, item)?;
        }
    }
    for attachment in &email.attachments {
        check_value("filename", &attachment.filename)?;
        check_value("Content-Type", &attachment.content_type)?;
        if let Some(cid) = &attachment.content_id {
            check_value("Content-ID", cid)?;
        }
        for (name, value) in &attachment.headers {
            check_value(name, name)?;
            check_value(name, value)?;
        }
    }
    Ok(())
}

fn check_value(header: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::Validation(ValidationError::HeaderInjection(
            header.to_string(),
        )));
    }
    Ok(())
}

/// Write one header line, folding at whitespace to keep lines near the
/// RFC 5322 limit. Continuation lines start with a single space.
fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    let mut line_len = name.len() + 2;
    let mut first = true;
    for word in value.split(' ') {
        if first {
            out.push_str(word);
            line_len += word.len();
            first = false;
        } else if line_len + word.len() + 1 > FOLD_AT {
            out.push_str("\r\n ");
            out.push_str(word);
            line_len = 1 + word.len();
        } else {
            out.push(' ');
            out.push_str(word);
            line_len += word.len() + 1;
        }
    }
    out.push_str("\r\n");
}

fn write_address_header(out: &mut String, name: &str, addresses: &[Address]) {
    if addresses.is_empty() {
        return;
    }
    let value = addresses
        .iter()
        .map(format_mailbox)
        .collect::<Vec<_>>()
        .join(", ");
    write_header(out, name, &value);
}

/// `Name <addr>` when a display name is present, quoting names that step
/// outside the atom character set.
fn format_mailbox(address: &Address) -> String {
    match address.name.as_deref() {
        Some(name) if !name.is_empty() => {
            if name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_'))
            {
                format!("{name} <{}>", address.address)
            } else {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{escaped}\" <{}>", address.address)
            }
        }
        _ => address.address.clone(),
    }
}

/// Body section for emails without attachments.
fn write_body(out: &mut String, email: &Email) {
    match (&email.text_body, &email.html_body) {
        (Some(text), Some(html)) => {
            let boundary = generate_boundary();
            out.push_str(&format!(
                "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\r\n"
            ));
            write_inline_part(out, &boundary, "text/plain", "text-body", text);
            write_inline_part(out, &boundary, "text/html", "html-body", html);
            out.push_str(&format!("--{boundary}--\r\n"));
        }
        (Some(text), None) => {
            out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
            out.push_str(text);
            out.push_str("\r\n");
        }
        (None, Some(html)) => {
            out.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
            out.push_str(html);
            out.push_str("\r\n");
        }
        (None, None) => {
            out.push_str("\r\n");
        }
    }
}

/// Body section for emails with attachments: a `multipart/mixed` container
/// holding the body (nested `multipart/alternative` when both variants are
/// present) followed by one part per attachment.
fn write_mixed(out: &mut String, email: &Email) {
    let boundary = generate_boundary();
    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
    ));

    match (&email.text_body, &email.html_body) {
        (Some(text), Some(html)) => {
            let inner = generate_boundary();
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str(&format!(
                "Content-Type: multipart/alternative; boundary=\"{inner}\"\r\n\r\n"
            ));
            write_inline_part(out, &inner, "text/plain", "text-body", text);
            write_inline_part(out, &inner, "text/html", "html-body", html);
            out.push_str(&format!("--{inner}--\r\n"));
        }
        (Some(text), None) => {
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
            out.push_str(text);
            out.push_str("\r\n");
        }
        (None, Some(html)) => {
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
            out.push_str(html);
            out.push_str("\r\n");
        }
        (None, None) => {}
    }

    for attachment in &email.attachments {
        write_attachment(out, &boundary, attachment);
    }
    out.push_str(&format!("--{boundary}--\r\n"));
}

fn write_inline_part(
    out: &mut String,
    boundary: &str,
    content_type: &str,
    content_id: &str,
    body: &str,
) {
    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str(&format!("Content-Type: {content_type}; charset=utf-8\r\n"));
    out.push_str(&format!("Content-ID: <{content_id}>\r\n\r\n"));
    out.push_str(body);
    out.push_str("\r\n");
}

fn write_attachment(out: &mut String, boundary: &str, attachment: &Attachment) {
    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str(&format!("Content-Type: {}\r\n", attachment.content_type));
    out.push_str("Content-Transfer-Encoding: base64\r\n");
    // A content-ID marks the attachment as referenced from the HTML body
    let disposition = if attachment.content_id.is_some() {
        "inline"
    } else {
        "attachment"
    };
    out.push_str(&format!(
        "Content-Disposition: {disposition}; filename=\"{}\"\r\n",
        attachment.filename
    ));
    if let Some(cid) = &attachment.content_id {
        out.push_str(&format!("Content-ID: <{cid}>\r\n"));
    }
    for (name, value) in &attachment.headers {
        write_header(out, name, value);
    }
    out.push_str("\r\n");

    let encoded = BASE64_STANDARD.encode(&attachment.data);
    let mut offset = 0;
    while offset < encoded.len() {
        let end = usize::min(offset + BASE64_WIDTH, encoded.len());
        out.push_str(&encoded[offset..end]);
        out.push_str("\r\n");
        offset = end;
    }
}

/// Boundary token, unique per message.
fn generate_boundary() -> String {
    Uuid::new_v4().simple().to_string()
}
