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

//! Handles writing logs on a separate task

use log::error;
use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::Receiver;

/// A rendered log line along with its destination
#[derive(Debug)]
pub(crate) struct LogLine {
    log_file: PathBuf,
    line: String,
}

#[derive(Debug)]
pub(crate) enum WriterMessage {
    Reopen,
    Line(LogLine),
}

impl WriterMessage {
    pub(crate) fn line(log_file: &Path, line: String) -> Self {
        Self::Line(LogLine {
            log_file: log_file.to_owned(),
            line,
        })
    }
}

fn open_file(path: &PathBuf) -> Box<dyn Write + Send> {
    if path.as_os_str() != "-" {
        match File::options().append(true).create(true).open(path) {
            Ok(file) => return Box::new(file),
            Err(err) => {
                error!(
                    "Failed opening log file {} (cause: {err}), falling back to stdout",
                    path.as_os_str().to_string_lossy()
                );
            }
        }
    }
    Box::new(stdout())
}

/// Writes incoming log lines, each terminated by a single newline, to their respective files.
/// Files are opened on first use and kept open until a reopen message drops them, e.g. after log
/// rotation.
pub(crate) async fn log_writer(mut receiver: Receiver<WriterMessage>) {
    let mut files = HashMap::new();

    while let Some(message) = receiver.recv().await {
        match message {
            WriterMessage::Reopen => {
                files = HashMap::new();
            }
            WriterMessage::Line(data) => {
                let writer = files.entry(data.log_file).or_insert_with_key(open_file);
                let _ = writer.write_all(data.line.as_bytes());
                let _ = writer.write_all(b"\n");
            }
        }
    }
}
