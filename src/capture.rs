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

//! Response metadata capture

use http::StatusCode;

/// Capability interface of the underlying response stream
///
/// This is the seam between the middleware and whatever transport delivers the response. The
/// middleware only needs to observe status and body writes, implementations forward these to the
/// actual connection.
pub trait ResponseStream {
    /// Writes the response status
    fn send_status(&mut self, status: StatusCode);

    /// Writes a chunk of the response body
    fn send_body(&mut self, data: &[u8]);
}

/// Wrapper recording response metadata for a single request
///
/// All operations are forwarded to the wrapped stream unmodified. Only the first status written
/// is recorded, later writes don't change it. Writing body data without a preceding status
/// records the status 200, the usual server behavior when a handler produces a body right away.
/// Byte counts accumulate across all body writes.
#[derive(Debug)]
pub struct ResponseCapture<S> {
    inner: S,
    status: u16,
    bytes_sent: usize,
    status_explicit: bool,
}

impl<S: ResponseStream> ResponseCapture<S> {
    /// Wraps a response stream for one request
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            status: 0,
            bytes_sent: 0,
            status_explicit: false,
        }
    }

    /// Recorded response status, `0` if no status has been written yet
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Number of response body bytes written so far
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Whether the recorded status resulted from an explicit status write rather than being
    /// implied by a body write
    pub fn status_explicit(&self) -> bool {
        self.status_explicit
    }

    /// Returns the wrapped response stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResponseStream> ResponseStream for ResponseCapture<S> {
    fn send_status(&mut self, status: StatusCode) {
        if self.status == 0 {
            self.status = status.as_u16();
            self.status_explicit = true;
        }
        self.inner.send_status(status);
    }

    fn send_body(&mut self, data: &[u8]) {
        if self.status == 0 {
            self.status = StatusCode::OK.as_u16();
        }
        self.bytes_sent += data.len();
        self.inner.send_body(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records everything it receives so that forwarding can be verified
    #[derive(Debug, Default)]
    struct RecordingStream {
        statuses: Vec<u16>,
        body: Vec<u8>,
    }

    impl ResponseStream for RecordingStream {
        fn send_status(&mut self, status: StatusCode) {
            self.statuses.push(status.as_u16());
        }

        fn send_body(&mut self, data: &[u8]) {
            self.body.extend_from_slice(data);
        }
    }

    #[test]
    fn first_status_wins() {
        let mut capture = ResponseCapture::new(RecordingStream::default());
        capture.send_status(StatusCode::NOT_FOUND);
        capture.send_status(StatusCode::OK);
        assert_eq!(capture.status(), 404);
        assert!(capture.status_explicit());

        // Both writes are still forwarded
        assert_eq!(capture.into_inner().statuses, vec![404, 200]);
    }

    #[test]
    fn body_write_implies_success() {
        let mut capture = ResponseCapture::new(RecordingStream::default());
        capture.send_body(b"hi");
        assert_eq!(capture.status(), 200);
        assert!(!capture.status_explicit());

        // Implied status isn't changed by a later explicit write either
        capture.send_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(capture.status(), 200);
    }

    #[test]
    fn bytes_accumulate() {
        let mut capture = ResponseCapture::new(RecordingStream::default());
        assert_eq!(capture.bytes_sent(), 0);
        capture.send_status(StatusCode::OK);
        capture.send_body(b"hello ");
        capture.send_body(b"");
        capture.send_body(b"world");
        assert_eq!(capture.bytes_sent(), 11);
        assert_eq!(capture.into_inner().body, b"hello world");
    }

    #[test]
    fn unset_status() {
        let capture = ResponseCapture::new(RecordingStream::default());
        assert_eq!(capture.status(), 0);
        assert_eq!(capture.bytes_sent(), 0);
    }
}
