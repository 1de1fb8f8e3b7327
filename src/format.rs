// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compilation of Apache-style format strings into reusable log formats

use std::iter::Peekable;
use std::mem;
use std::str::Chars;

/// The Common Log Format directives
pub const COMMON_LOG_FORMAT: &str = "%h %l %u %t \"%r\" %>s %b";

/// The Combined Log Format directives
pub const COMBINED_LOG_FORMAT: &str =
    "%h %l %u %t \"%r\" %>s %b \"%{Referer}i\" \"%{User-agent}i\"";

/// An individual directive of the format mini-language
///
/// Directives carrying a key (header name or time subformat) compare equal only for identical
/// keys, so `%{Referer}i` and `%{Host}i` are distinct directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    /// Remote host, `%h`
    RemoteHost,
    /// Identity, `%l`, always renders as `-`
    Identity,
    /// User from Basic authorization, `%u`
    User,
    /// Timestamp, `%t` or `%{FMT}t` with a time subformat
    Timestamp(Option<String>),
    /// Request line, `%r`
    RequestLine,
    /// Response status code, `%s` or `%>s`
    Status,
    /// Number of bytes written as response, `%b`
    BytesSent,
    /// A request header, `%{Name}i`
    Header(String),
    /// Literal percent sign, `%%`
    Percent,
}

/// A segment of a compiled format, either literal text or a reference to a directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Text copied to the output verbatim
    Literal(String),
    /// A directive occurrence, referring into [`LogFormat::directives`]
    Slot(usize),
}

/// A compiled log format
///
/// Compiled once from a format string, immutable afterwards and safe to share between
/// concurrently processed requests. Repeated occurrences of the same directive refer to a single
/// entry in the directive table, so the corresponding value is computed only once per request no
/// matter how often it appears in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFormat {
    pub(crate) segments: Vec<Segment>,
    pub(crate) directives: Vec<Directive>,
}

/// Reads one directive after a `%` character. The iterator is left on the first character after
/// the directive. Returns `None` for unsupported or unterminated directives, these produce no
/// output.
fn scan_directive(chars: &mut Peekable<Chars<'_>>) -> Option<Directive> {
    let mut key = None;
    loop {
        match *chars.peek()? {
            // No-op modifier, %>s is the same as %s
            '>' => {
                chars.next();
            }
            '{' if key.is_none() => {
                chars.next();
                let mut enclosed = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => enclosed.push(ch),
                        // Unterminated enclosure
                        None => return None,
                    }
                }
                key = Some(enclosed);
            }
            '%' if key.is_none() => {
                chars.next();
                return Some(Directive::Percent);
            }
            ch if ch.is_alphabetic() => {
                chars.next();
                return match (ch, key) {
                    ('h', None) => Some(Directive::RemoteHost),
                    ('l', None) => Some(Directive::Identity),
                    ('u', None) => Some(Directive::User),
                    ('t', key) => Some(Directive::Timestamp(key)),
                    ('r', None) => Some(Directive::RequestLine),
                    ('s', None) => Some(Directive::Status),
                    ('b', None) => Some(Directive::BytesSent),
                    ('i', Some(name)) => Some(Directive::Header(name)),
                    _ => None,
                };
            }
            // Anything else terminates the directive without producing output, the character
            // itself is kept as literal text.
            _ => return None,
        }
    }
}

impl LogFormat {
    /// Compiles a format string into a log format
    ///
    /// This always succeeds: unsupported directives are dropped from the output, unterminated
    /// directives at the end of the string are ignored and the literal text before them is kept.
    pub fn compile(format: &str) -> Self {
        let mut segments = Vec::new();
        let mut directives: Vec<Directive> = Vec::new();
        let mut literal = String::new();

        let mut chars = format.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }

            if let Some(directive) = scan_directive(&mut chars) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(mem::take(&mut literal)));
                }
                let index = match directives.iter().position(|known| *known == directive) {
                    Some(index) => index,
                    None => {
                        directives.push(directive);
                        directives.len() - 1
                    }
                };
                segments.push(Segment::Slot(index));
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            segments,
            directives,
        }
    }

    /// Returns the compiled [Common Log Format](COMMON_LOG_FORMAT)
    pub fn common() -> Self {
        Self::compile(COMMON_LOG_FORMAT)
    }

    /// Returns the compiled [Combined Log Format](COMBINED_LOG_FORMAT)
    pub fn combined() -> Self {
        Self::compile(COMBINED_LOG_FORMAT)
    }
}
