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

//! The middleware wrapping request handlers

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Local};
use http::Request;
use log::error;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{channel, Sender};

use crate::capture::{ResponseCapture, ResponseStream};
use crate::configuration::AccessLogConf;
use crate::format::LogFormat;
use crate::render::render;
use crate::writer::{log_writer, WriterMessage};

/// Errors reported when setting up the middleware
///
/// Compiling format strings and rendering log lines never fails, the only fallible operation is
/// resolving the configured log file path.
#[derive(Debug, Error)]
pub enum AccessLogError {
    /// Log file's parent directory could not be resolved
    #[error("failed resolving log file's parent directory: {0}")]
    LogFilePath(#[source] std::io::Error),
}

fn normalize_path(path: PathBuf) -> Result<PathBuf, AccessLogError> {
    if path.as_os_str().is_empty() || path.as_os_str() == "-" {
        // Don't change special paths
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        let mut parent = if parent.as_os_str().is_empty() {
            PathBuf::from(".").canonicalize()
        } else {
            parent.canonicalize()
        }
        .map_err(AccessLogError::LogFilePath)?;
        if let Some(name) = path.file_name() {
            parent.push(name);
        }
        Ok(parent)
    } else {
        // Absolute path in the root, leave unchanged
        Ok(path)
    }
}

/// A request handler to be wrapped by the middleware
///
/// The handler receives the request and the response stream to write its response to. Writes go
/// through the middleware's capture wrapper, nothing else is required for the handler's response
/// to be logged.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Processes one request
    async fn handle(&self, request: &Request<Bytes>, response: &mut (dyn ResponseStream + Send));
}

/// Access logging middleware
///
/// The format string is compiled once when the middleware is created, processing requests only
/// evaluates the compiled format. The same middleware instance can process any number of
/// requests concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogHandler {
    conf: AccessLogConf,
    format: Arc<LogFormat>,
    clock: Option<DateTime<FixedOffset>>,
}

impl TryFrom<AccessLogConf> for AccessLogHandler {
    type Error = AccessLogError;

    fn try_from(mut conf: AccessLogConf) -> Result<Self, Self::Error> {
        // Normalize parent directory in case the same file is specified with different paths
        conf.log_file = normalize_path(conf.log_file)?;

        // If no log format specified, use default
        let format = if conf.log_format.is_empty() {
            LogFormat::common()
        } else {
            LogFormat::compile(&conf.log_format)
        };

        Ok(Self {
            conf,
            format: Arc::new(format),
            clock: None,
        })
    }
}

impl AccessLogHandler {
    /// Makes all log lines use the given fixed instant instead of sampling the wall clock when a
    /// line is rendered
    pub fn with_clock(mut self, time: DateTime<FixedOffset>) -> Self {
        self.clock = Some(time);
        self
    }

    /// Processes one request: the wrapped handler's response goes through a capture wrapper, and
    /// once the handler returns, one log line describing the request is written to the
    /// configured log file. Returns the response stream once done.
    pub async fn handle<S>(
        &self,
        request: &Request<Bytes>,
        response: S,
        next: &dyn RequestHandler,
    ) -> S
    where
        S: ResponseStream + Send,
    {
        let mut capture = ResponseCapture::new(response);
        next.handle(request, &mut capture).await;

        if !self.conf.log_file.as_os_str().is_empty() {
            let time = self.clock.unwrap_or_else(|| Local::now().into());
            let line = render(&self.format, request, &capture, time);

            static LOG_SENDER: Lazy<Sender<WriterMessage>> = Lazy::new(|| {
                let (sender, receiver) = channel(100);

                tokio::spawn(log_writer(receiver));

                #[cfg(unix)]
                crate::signal::listen(&sender);

                sender
            });

            let message = WriterMessage::line(&self.conf.log_file, line);
            if let Err(err) = LOG_SENDER.send(message).await {
                error!("Failed logging request, thread crashed? {err}");
            }
        }

        capture.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use http::StatusCode;
    use std::env::current_dir;
    use std::time::Duration;
    use test_log::test;

    struct BodyStream(Vec<u8>);

    impl ResponseStream for BodyStream {
        fn send_status(&mut self, _status: StatusCode) {}

        fn send_body(&mut self, data: &[u8]) {
            self.0.extend_from_slice(data);
        }
    }

    struct TestingHandler;

    #[async_trait]
    impl RequestHandler for TestingHandler {
        async fn handle(
            &self,
            _request: &Request<Bytes>,
            response: &mut (dyn ResponseStream + Send),
        ) {
            response.send_status(StatusCode::OK);
            response.send_body(b"{\"testing\": true}");
        }
    }

    fn test_time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2013, 2, 3, 19, 54, 0)
            .unwrap()
    }

    #[test]
    fn path_normalization() {
        let cwd = current_dir().unwrap().canonicalize().unwrap();
        let mut root = cwd.clone();
        while let Some(parent) = root.parent() {
            root = parent.into();
        }

        assert_eq!(normalize_path("".into()).unwrap(), PathBuf::from(""));
        assert_eq!(normalize_path("-".into()).unwrap(), PathBuf::from("-"));
        assert_eq!(
            normalize_path("file.txt".into()).unwrap(),
            cwd.join("file.txt")
        );
        assert_eq!(
            normalize_path("./file.txt".into()).unwrap(),
            cwd.join("file.txt")
        );
        assert_eq!(
            normalize_path("../file.txt".into()).unwrap(),
            cwd.parent().unwrap().join("file.txt")
        );
        assert_eq!(
            normalize_path(cwd.join("file.txt")).unwrap(),
            cwd.join("file.txt")
        );
        assert_eq!(
            normalize_path(root.join("file.txt")).unwrap(),
            root.join("file.txt")
        );
    }

    #[test]
    fn default_format() {
        let handler = AccessLogHandler::try_from(AccessLogConf::default()).unwrap();
        assert_eq!(*handler.format, LogFormat::common());

        let handler = AccessLogHandler::try_from(AccessLogConf {
            log_format: "%h %u".to_owned(),
            ..AccessLogConf::default()
        })
        .unwrap();
        assert_eq!(*handler.format, LogFormat::compile("%h %u"));
    }

    #[test(tokio::test)]
    async fn response_passes_through() {
        // Logging disabled, the middleware should still be transparent
        let handler = AccessLogHandler::try_from(AccessLogConf {
            log_file: PathBuf::new(),
            ..AccessLogConf::default()
        })
        .unwrap();

        let request = Request::get("/testing").body(Bytes::new()).unwrap();
        let stream = handler
            .handle(&request, BodyStream(Vec::new()), &TestingHandler)
            .await;
        assert_eq!(stream.0, b"{\"testing\": true}");
    }

    #[test(tokio::test)]
    async fn log_line_written() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("access.log");

        let handler = AccessLogHandler::try_from(AccessLogConf {
            log_file: log_file.clone(),
            log_format: String::new(),
        })
        .unwrap()
        .with_clock(test_time());

        let request = Request::get("/testing").body(Bytes::new()).unwrap();
        handler
            .handle(&request, BodyStream(Vec::new()), &TestingHandler)
            .await;

        // The line is written by a separate task, give it a moment
        let mut contents = String::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            contents = std::fs::read_to_string(&log_file).unwrap_or_default();
            if !contents.is_empty() {
                break;
            }
        }
        assert_eq!(
            contents,
            "127.0.0.1 - - [03/02/2013:07:54:00 +0000] \"GET /testing HTTP/1.1\" 200 17\n"
        );
    }
}
