// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use glob::Pattern;
use serde::Serialize;

use crate::builder::RecordBuilder;
use crate::device::{DevicePhase, RecordDevice, RecordMetadata};
use crate::record::{DataKind, DbrBuffer, PlainValue, RecordType, Value};
use crate::traits::{DeviceSupport, EngineStatus, PutMode, RecordEngine, SchedulerKind};

const HELP: &str = "\
dbl [pattern]        list record names matching a glob pattern (`*`, `?`, `[..]`)
dbgf <name>          show a record's value and alarm
dbpf <name> <value>  write a value through the engine
dbpr <name>          print a record as JSON
help                 show this text
exit                 leave the shell";

/// What the shell wants done after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Output(String),
    Exit,
}

/// Interactive commands against a running IOC.
pub struct Shell<'a> {
    builder: &'a RecordBuilder,
    engine: &'a dyn RecordEngine,
}

#[derive(Serialize)]
struct RecordReport<'a> {
    name: &'a str,
    record_type: RecordType,
    scan: String,
    value: PlainValue,
    severity: &'static str,
    status: &'static str,
    timestamp: f64,
    phase: DevicePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduler: Option<SchedulerKind>,
    #[serde(flatten)]
    metadata: &'a RecordMetadata,
}

impl<'a> Shell<'a> {
    pub fn new(builder: &'a RecordBuilder, engine: &'a dyn RecordEngine) -> Self {
        Self { builder, engine }
    }

    pub fn execute(&self, line: &str) -> Reply {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let output = match command {
            "" => String::new(),
            "exit" | "quit" => return Reply::Exit,
            "help" => HELP.to_string(),
            "dbl" => self.dbl(rest),
            "dbgf" => self.with_record("dbgf", rest, |record| self.dbgf(record)),
            "dbpr" => self.with_record("dbpr", rest, |record| self.dbpr(record)),
            "dbpf" => match rest.split_once(char::is_whitespace) {
                Some((name, value)) => {
                    self.with_record("dbpf", name, |record| self.dbpf(record, value.trim()))
                }
                None => "usage: dbpf <name> <value>".to_string(),
            },
            other => format!("unknown command '{}', try help", other),
        };
        Reply::Output(output)
    }

    /// Reads commands from `input` until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            match self.execute(&line?) {
                Reply::Exit => break,
                Reply::Output(text) if text.is_empty() => {}
                Reply::Output(text) => writeln!(output, "{}", text)?,
            }
            output.flush()?;
        }
        Ok(())
    }

    fn with_record(
        &self,
        command: &str,
        name: &str,
        f: impl FnOnce(&Arc<RecordDevice>) -> String,
    ) -> String {
        if name.is_empty() {
            return format!("usage: {} <name>", command);
        }
        match self.builder.lookup(name) {
            Some(record) => f(&record),
            None => format!("{}: no record named '{}'", command, name),
        }
    }

    fn dbl(&self, pattern: &str) -> String {
        let pattern = if pattern.is_empty() { "*" } else { pattern };
        let pattern = match Pattern::new(pattern) {
            Ok(pattern) => pattern,
            Err(error) => return format!("dbl: invalid pattern '{}': {}", pattern, error.msg),
        };
        self.engine
            .names()
            .into_iter()
            .filter(|name| pattern.matches(name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn dbgf(&self, record: &RecordDevice) -> String {
        match self.engine.read(record.name()) {
            Ok(snapshot) => format!("{} {} {}", record.name(), snapshot.value, snapshot.alarm),
            Err(error) => format!("dbgf: {}", error),
        }
    }

    fn dbpf(&self, record: &RecordDevice, text: &str) -> String {
        let value = match parse_value(record, text) {
            Some(value) => value,
            None => return format!("dbpf: cannot interpret '{}' for {}", text, record.name()),
        };
        match self
            .engine
            .put_field(record.name(), &DbrBuffer::encode(&value), PutMode::Process)
        {
            Ok(EngineStatus::Ok) => self.dbgf(record),
            Ok(EngineStatus::Error) => format!("dbpf: {} rejected '{}'", record.name(), text),
            Err(error) => format!("dbpf: {}", error),
        }
    }

    fn dbpr(&self, record: &RecordDevice) -> String {
        let snapshot = match self.engine.read(record.name()) {
            Ok(snapshot) => snapshot,
            Err(error) => return format!("dbpr: {}", error),
        };
        let report = RecordReport {
            name: record.name(),
            record_type: record.record_type(),
            scan: record.scan_policy().to_string(),
            value: snapshot.value.to_plain(),
            severity: snapshot.severity().as_str(),
            status: snapshot.status().as_str(),
            timestamp: snapshot
                .timestamp
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
            phase: record.phase(),
            scheduler: record.scheduler(),
            metadata: record.metadata(),
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("dbpr: {}", e))
    }
}

/// Turns shell text into a value of the record's kind. Enum records also
/// accept their state names.
fn parse_value(record: &RecordDevice, text: &str) -> Option<Value> {
    let unquoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);

    match record.record_type().data_kind() {
        DataKind::String => Some(Value::String(unquoted.to_string())),
        DataKind::Array => {
            let numbers: Result<Vec<f64>, _> = unquoted
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(str::parse::<f64>)
                .collect();
            match numbers {
                Ok(numbers) => Some(Value::from(numbers)),
                Err(_) => Some(Value::String(unquoted.to_string())),
            }
        }
        DataKind::Scalar => {
            if let Ok(number) = unquoted.parse::<f64>() {
                return Some(Value::Double(number));
            }
            if record.record_type().is_enum() {
                return record
                    .metadata()
                    .options
                    .iter()
                    .position(|option| option == unquoted)
                    .and_then(|index| u16::try_from(index).ok())
                    .map(Value::Enum);
            }
            None
        }
    }
}
