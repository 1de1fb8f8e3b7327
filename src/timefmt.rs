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

//! Translation of classic time format tokens into chrono patterns

use chrono::{DateTime, Datelike, FixedOffset};

/// Stand-in for values which chrono cannot produce directly. These are calendar-derived numbers,
/// computed from the instant and substituted into the formatted output afterwards.
const COMPUTED: char = '\u{0}';

/// Formats an instant according to a classic single-letter time format
///
/// Most tokens map onto an equivalent chrono format fragment. Calendar-derived tokens (ISO week
/// year `%G`/`%g`, day of year `%j`, epoch seconds `%s`, ISO weekday `%u`/`%w`, ISO week `%V`)
/// are computed separately and substituted into the formatted output in the order of their
/// appearance. Unsupported tokens render as `?`, a literal `%` is written as `%%`. This never
/// fails, whatever the input.
pub(crate) fn translate(time: &DateTime<FixedOffset>, subformat: &str) -> String {
    let mut pattern = String::with_capacity(subformat.len());
    let mut computed = Vec::new();

    let mut chars = subformat.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            // A literal NUL would be mistaken for a substitution slot below, shifting all
            // computed values
            if ch != COMPUTED {
                pattern.push(ch);
            }
            continue;
        }

        let token = match chars.next() {
            Some(token) => token,
            // Trailing % without a token
            None => break,
        };
        match token {
            'a' => pattern.push_str("%a"),
            'A' => pattern.push_str("%A"),
            'b' | 'h' => pattern.push_str("%b"),
            'B' => pattern.push_str("%B"),
            'C' => pattern.push_str("%y"),
            'd' => pattern.push_str("%d"),
            'D' => pattern.push_str("%m/%d/%y"),
            'e' => pattern.push_str("%e"),
            'F' => pattern.push_str("%Y-%m-%d"),
            'H' => pattern.push_str("%H"),
            'I' => pattern.push_str("%-I"),
            'k' => pattern.push_str("%k"),
            'l' => pattern.push_str("%l"),
            'm' => pattern.push_str("%m"),
            'M' => pattern.push_str("%M"),
            'n' => pattern.push('\n'),
            'p' => pattern.push_str("%p"),
            'P' => pattern.push_str("%P"),
            'r' => pattern.push_str("%I:%M:%S %p"),
            'R' => pattern.push_str("%H:%M"),
            'S' => pattern.push_str("%S"),
            't' => pattern.push('\t'),
            'T' => pattern.push_str("%H:%M:%S"),
            'y' => pattern.push_str("%y"),
            'Y' => pattern.push_str("%Y"),
            'z' => pattern.push_str("%z"),
            'Z' => pattern.push_str("%Z"),
            '%' => pattern.push_str("%%"),
            'G' => {
                computed.push(time.iso_week().year().to_string());
                pattern.push(COMPUTED);
            }
            'g' => {
                computed.push(format!("{:02}", time.iso_week().year().rem_euclid(100)));
                pattern.push(COMPUTED);
            }
            'j' => {
                computed.push(time.ordinal().to_string());
                pattern.push(COMPUTED);
            }
            's' => {
                computed.push(time.timestamp().to_string());
                pattern.push(COMPUTED);
            }
            'u' | 'w' => {
                computed.push(time.weekday().number_from_monday().to_string());
                pattern.push(COMPUTED);
            }
            'V' => {
                computed.push(time.iso_week().week().to_string());
                pattern.push(COMPUTED);
            }
            _ => pattern.push('?'),
        }
    }

    let formatted = time.format(&pattern).to_string();
    if computed.is_empty() {
        return formatted;
    }

    // Fill in the computed values, first to last
    let mut result = String::with_capacity(formatted.len());
    let mut values = computed.into_iter();
    for ch in formatted.chars() {
        if ch == COMPUTED {
            if let Some(value) = values.next() {
                result.push_str(&value);
            }
        } else {
            result.push(ch);
        }
    }
    result
}
