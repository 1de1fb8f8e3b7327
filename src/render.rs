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

//! Log line rendering

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset};
use http::{header, HeaderMap, Request};

use crate::capture::{ResponseCapture, ResponseStream};
use crate::format::{Directive, LogFormat, Segment};
use crate::timefmt;

/// Timestamp pattern of the `%t` directive
const TIMESTAMP_PATTERN: &str = "[%d/%m/%Y:%I:%M:%S %z]";

/// Extracts the user name from a Basic authorization header, `-` if there is no such header or
/// its credentials cannot be decoded
fn username(headers: &HeaderMap) -> String {
    let credentials = headers
        .get(header::AUTHORIZATION)
        .and_then(|auth| auth.to_str().ok())
        .and_then(|auth| auth.split_once(' '))
        .and_then(|(_, credentials)| BASE64_STANDARD.decode(credentials).ok());
    let credentials = match credentials {
        Some(credentials) => credentials,
        None => return "-".to_owned(),
    };

    // slice::split_once() is unstable
    if let Some(index) = credentials.iter().position(|b| *b == b':') {
        String::from_utf8(credentials[0..index].to_vec()).unwrap_or_else(|_| "-".to_owned())
    } else {
        "-".to_owned()
    }
}

/// Computes the value of a single directive
fn resolve<B>(
    directive: &Directive,
    request: &Request<B>,
    status: u16,
    bytes_sent: usize,
    time: &DateTime<FixedOffset>,
) -> String {
    match directive {
        Directive::RemoteHost => request
            .uri()
            .host()
            .filter(|host| !host.is_empty())
            .unwrap_or("127.0.0.1")
            .to_owned(),
        Directive::Identity => "-".to_owned(),
        Directive::User => username(request.headers()),
        Directive::Timestamp(None) => time.format(TIMESTAMP_PATTERN).to_string(),
        Directive::Timestamp(Some(subformat)) => timefmt::translate(time, subformat),
        Directive::RequestLine => {
            let method = request.method();
            let path = request.uri().path();
            let version = request.version();
            format!("{method} {path} {version:?}")
        }
        Directive::Status => status.to_string(),
        Directive::BytesSent => bytes_sent.to_string(),
        Directive::Header(name) => request
            .headers()
            .get(name.as_str())
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_owned(),
        Directive::Percent => "%".to_owned(),
    }
}

/// Renders one log line for a processed request
///
/// Each distinct directive of the format is resolved exactly once, repeated occurrences receive
/// the same value. The result doesn't include a trailing newline.
pub fn render<B, S: ResponseStream>(
    format: &LogFormat,
    request: &Request<B>,
    capture: &ResponseCapture<S>,
    time: DateTime<FixedOffset>,
) -> String {
    let values: Vec<_> = format
        .directives
        .iter()
        .map(|directive| {
            resolve(
                directive,
                request,
                capture.status(),
                capture.bytes_sent(),
                &time,
            )
        })
        .collect();

    let capacity = format
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(literal) => literal.len(),
            Segment::Slot(index) => values[*index].len(),
        })
        .sum();

    let mut line = String::with_capacity(capacity);
    for segment in &format.segments {
        match segment {
            Segment::Literal(literal) => line.push_str(literal),
            Segment::Slot(index) => line.push_str(&values[*index]),
        }
    }
    line
}
