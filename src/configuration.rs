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

//! Structures handling command line options and configuration deserialization for the access log
//! module

use serde::Deserialize;
use std::path::PathBuf;
use structopt::StructOpt;

/// Command line options of the access log module
#[derive(Debug, Default, StructOpt)]
pub struct AccessLogOpt {
    /// Access log file path
    ///
    /// Special values are an empty string (disable logging) and - (write to standard output).
    #[structopt(long, parse(from_os_str))]
    pub log_file: Option<PathBuf>,
    /// Access log format string using Apache log directives, e.g. "%h %l %u %t \"%r\" %>s %b"
    #[structopt(long)]
    pub log_format: Option<String>,
}

/// Configuration settings of the access log module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessLogConf {
    /// Access log file path
    ///
    /// Special values are an empty string (disable logging) and - (write to standard output).
    pub log_file: PathBuf,
    /// Access log format string
    ///
    /// See [`COMMON_LOG_FORMAT`](crate::COMMON_LOG_FORMAT) for the directives of the default
    /// format. The supported directives are listed in the [crate documentation](crate).
    pub log_format: String,
}

impl Default for AccessLogConf {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("-"),
            log_format: String::new(),
        }
    }
}

impl AccessLogConf {
    /// Merges the command line options into the current configuration. Any command line options
    /// present overwrite existing settings.
    pub fn merge_with_opt(&mut self, opt: AccessLogOpt) {
        if let Some(log_file) = opt.log_file {
            self.log_file = log_file;
        }
        if let Some(log_format) = opt.log_format {
            self.log_format = log_format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_deserialization() {
        let conf: AccessLogConf = serde_yaml::from_str(
            r#"
                log_file: access.log
                log_format: '%h %l %u %t "%r" %>s %b'
            "#,
        )
        .unwrap();
        assert_eq!(conf.log_file, PathBuf::from("access.log"));
        assert_eq!(conf.log_format, r#"%h %l %u %t "%r" %>s %b"#);

        let conf: AccessLogConf = serde_yaml::from_str("{}").unwrap();
        assert_eq!(conf, AccessLogConf::default());
    }

    #[test]
    fn opt_merging() {
        let mut conf = AccessLogConf::default();
        conf.merge_with_opt(AccessLogOpt::default());
        assert_eq!(conf, AccessLogConf::default());

        conf.merge_with_opt(AccessLogOpt {
            log_file: Some(PathBuf::from("access.log")),
            log_format: None,
        });
        assert_eq!(conf.log_file, PathBuf::from("access.log"));
        assert_eq!(conf.log_format, "");

        conf.merge_with_opt(AccessLogOpt {
            log_file: None,
            log_format: Some("%h %u".to_owned()),
        });
        assert_eq!(conf.log_file, PathBuf::from("access.log"));
        assert_eq!(conf.log_format, "%h %u");
    }
}
