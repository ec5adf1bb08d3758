// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The line protocol: one UTF-8 line per frame, space-separated fields,
//! free text as the final field with newlines and backslashes escaped.
//!
//! Client to server:
//! ```text
//! HELLO <platform_id> <handle>
//! MSG <id> <text>
//! FILE <id> <url> [text]
//! REPLY <id> <replied_id> <text>
//! EDIT <id> <text>
//! DELETE <id>
//! REACT <id> <emoji>
//! UNREACT <id> <emoji>
//! TYPING
//! ```
//!
//! Server to client: `OK`, `ERR <text>`, `MSG <id> <reply_to|-> <text>`,
//! `ATTACH <id> <url>`, `EDIT <id> <text>`, `REACT`/`UNREACT <id> <emoji>`,
//! `TYPING`.

/// A parsed client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Hello { platform_id: String, handle: String },
    Msg { id: String, text: String },
    File { id: String, url: String, text: String },
    Reply { id: String, replied: String, text: String },
    Edit { id: String, text: String },
    Delete { id: String },
    React { id: String, emoji: String },
    Unreact { id: String, emoji: String },
    Typing,
}

/// Escape free text for the wire: backslash, then newlines.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Undo [`escape`].
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn split_fields(rest: &str, n: usize) -> Option<Vec<&str>> {
    let fields: Vec<&str> = rest.splitn(n, ' ').collect();
    if fields.len() == n && fields.iter().all(|f| !f.is_empty()) {
        Some(fields)
    } else {
        None
    }
}

/// Parse one client line. Errors are human-readable and echoed back as
/// `ERR` frames.
pub fn parse_frame(line: &str) -> Result<ClientFrame, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest),
        None => (line, ""),
    };
    match verb {
        "HELLO" => {
            let f = split_fields(rest, 2).ok_or("HELLO needs <platform_id> <handle>")?;
            Ok(ClientFrame::Hello {
                platform_id: f[0].to_string(),
                handle: f[1].to_string(),
            })
        }
        "MSG" => {
            let f = split_fields(rest, 2).ok_or("MSG needs <id> <text>")?;
            Ok(ClientFrame::Msg {
                id: f[0].to_string(),
                text: unescape(f[1]),
            })
        }
        "FILE" => {
            // Trailing text is optional for attachment-only messages.
            let f = split_fields(rest, 3)
                .or_else(|| split_fields(rest, 2).map(|mut f| {
                    f.push("");
                    f
                }))
                .ok_or("FILE needs <id> <url> [text]")?;
            Ok(ClientFrame::File {
                id: f[0].to_string(),
                url: f[1].to_string(),
                text: unescape(f[2]),
            })
        }
        "REPLY" => {
            let f = split_fields(rest, 3).ok_or("REPLY needs <id> <replied_id> <text>")?;
            Ok(ClientFrame::Reply {
                id: f[0].to_string(),
                replied: f[1].to_string(),
                text: unescape(f[2]),
            })
        }
        "EDIT" => {
            let f = split_fields(rest, 2).ok_or("EDIT needs <id> <text>")?;
            Ok(ClientFrame::Edit {
                id: f[0].to_string(),
                text: unescape(f[1]),
            })
        }
        "DELETE" => {
            let f = split_fields(rest, 1).ok_or("DELETE needs <id>")?;
            Ok(ClientFrame::Delete {
                id: f[0].to_string(),
            })
        }
        "REACT" | "UNREACT" => {
            let f = split_fields(rest, 2).ok_or("REACT/UNREACT need <id> <emoji>")?;
            let (id, emoji) = (f[0].to_string(), f[1].to_string());
            Ok(if verb == "REACT" {
                ClientFrame::React { id, emoji }
            } else {
                ClientFrame::Unreact { id, emoji }
            })
        }
        "TYPING" => Ok(ClientFrame::Typing),
        other => Err(format!("unknown verb {other}")),
    }
}
