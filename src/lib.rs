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

//! # Access Log Module
//!
//! This crate implements a middleware writing access log files in the
//! [Common Log Format](https://en.wikipedia.org/wiki/Common_Log_Format) and its relatives: the
//! log format is given as a string of Apache log directives which is compiled once when the
//! middleware is created. A configuration could look like this:
//!
//! ```yaml
//! log_file: access.log
//! log_format: '%h %l %u %t "%r" %>s %b "%{Referer}i" "%{User-agent}i"'
//! ```
//!
//! Both fields are also available as `--log-file` and `--log-format` command line options.
//!
//! The supported directives are:
//!
//! * `%h`: remote host
//! * `%l`: identity, always `-`
//! * `%u`: user from a Basic `Authorization` header, `-` if there is none
//! * `%t`: date and time of the request, e.g. `[10/10/2000:01:55:36 -0700]`
//! * `%{FMT}t`: date and time of the request formatted according to `FMT`, a string of
//!   single-letter time format tokens like `%Y` or `%j`. Tokens without a supported mapping
//!   render as `?`.
//! * `%r`: request line, e.g. `GET / HTTP/1.1`
//! * `%s`, `%>s`: status code of the response, e.g. `200`
//! * `%b`: number of bytes sent as response
//! * `%{Name}i`: value of the request header `Name`, lookup is case-insensitive
//! * `%%`: verbatim `%` character
//!
//! Anything else after a `%` character is considered an unsupported directive and produces no
//! output; format strings never fail to compile. [`COMMON_LOG_FORMAT`] and
//! [`COMBINED_LOG_FORMAT`] contain the format strings of the two classic presets.
//!
//! This middleware will add one line per request to the log file, once the wrapped handler is
//! done with the request. A log file will be created if necessary, data in already existing
//! files will be kept. Writing is performed by a single background task, so concurrently
//! processed requests never interleave within a line.
//!
//! On Unix-based systems, the process can be sent a `HUP` or `USR1` signal to make it re-open
//! log files. This is useful after the logs have been rotated for example.
//!
//! ## Code example
//!
//! `AccessLogHandler` wraps a [`RequestHandler`]: it hands the handler a capture wrapper around
//! the response stream, and renders the log line from the captured response metadata afterwards.
//!
//! ```rust
//! use access_log_module::{AccessLogConf, AccessLogHandler, RequestHandler, ResponseStream};
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//!
//! struct HelloHandler;
//!
//! #[async_trait]
//! impl RequestHandler for HelloHandler {
//!     async fn handle(&self, _request: &Request<Bytes>, response: &mut (dyn ResponseStream + Send)) {
//!         response.send_status(StatusCode::OK);
//!         response.send_body(b"Hi!");
//!     }
//! }
//!
//! struct BodyStream(Vec<u8>);
//!
//! impl ResponseStream for BodyStream {
//!     fn send_status(&mut self, _status: StatusCode) {}
//!     fn send_body(&mut self, data: &[u8]) {
//!         self.0.extend_from_slice(data);
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Default configuration logs to standard output in the Common Log Format
//!     let handler: AccessLogHandler = AccessLogConf::default().try_into().unwrap();
//!
//!     let request = Request::get("/hello").body(Bytes::new()).unwrap();
//!     let stream = handler
//!         .handle(&request, BodyStream(Vec::new()), &HelloHandler)
//!         .await;
//!     assert_eq!(stream.0, b"Hi!");
//! }
//! ```

pub mod configuration;
mod capture;
mod format;
mod handler;
mod render;
#[cfg(unix)]
mod signal;
mod timefmt;
mod writer;

pub use capture::{ResponseCapture, ResponseStream};
pub use configuration::{AccessLogConf, AccessLogOpt};
pub use format::{LogFormat, COMBINED_LOG_FORMAT, COMMON_LOG_FORMAT};
pub use handler::{AccessLogError, AccessLogHandler, RequestHandler};
pub use render::render;
