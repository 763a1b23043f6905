//! `LogRecord`: the carrier of a single logged event (spec.md §3, §4.2).
//!
//! Heavy context (timestamp, PID) and derived fields (message, filename,
//! exception summary, ...) are filled lazily and memoised, mirroring the
//! original's property-caching rather than eagerly computing everything at
//! construction — the whole point of [`RecordDispatcher::call_handlers`] is
//! to skip this work when nobody is listening.

use std::collections::BTreeMap;
use std::sync::Weak;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::dispatcher::RecordDispatcher;
use crate::error::{heavy_init_too_late, FormatError};
use crate::format;
use crate::level::Level;

/// A call-site reference: the Rust stand-in for a captured stack frame.
///
/// The original walks a live call stack to find `calling_frame`, `module`,
/// `filename`, and `lineno`. Rust has no such introspection, so the
/// `logbook` crate's logging macros build one of these from `file!()`,
/// `line!()`, and `module_path!()` at the call site and hand it in — the
/// "accept an explicit site token" fallback spec.md's own design notes call
/// for. `func_name` has no macro equivalent and is never populated here.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CallSite {
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub module: Option<String>,
}

impl CallSite {
    pub fn new(filename: &'static str, lineno: u32, module: &'static str) -> Self {
        CallSite {
            filename: Some(filename.to_owned()),
            lineno: Some(lineno),
            module: Some(module.to_owned()),
        }
    }
}

/// The Rust stand-in for Python's `(type, value, traceback)` exception
/// triple. Built either from a typed error via [`ExcInfo::capture`] or from
/// a caught panic payload via [`ExcInfo::from_panic_payload`].
#[derive(Debug)]
pub struct ExcInfo {
    pub type_name: String,
    pub message: String,
    pub backtrace: Option<std::backtrace::Backtrace>,
}

impl ExcInfo {
    pub fn capture<E: std::error::Error>(err: &E) -> Self {
        ExcInfo {
            type_name: std::any::type_name::<E>().to_owned(),
            message: err.to_string(),
            backtrace: Some(std::backtrace::Backtrace::capture()),
        }
    }

    pub fn from_panic_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        ExcInfo {
            type_name: "panic".to_owned(),
            message,
            backtrace: Some(std::backtrace::Backtrace::capture()),
        }
    }

    /// `exc_info`'s type name without its module path, e.g. `ParseIntError`
    /// out of `core::num::error::ParseIntError`.
    pub fn shortname(&self) -> &str {
        self.type_name.rsplit("::").next().unwrap_or(&self.type_name)
    }
}

/// `extra`: a mapping that yields `""` for absent keys but serialises as a
/// plain object (spec.md §3 invariant iv).
#[derive(Clone, Debug, Default)]
pub struct Extra(BTreeMap<String, Value>);

impl Extra {
    pub fn new() -> Self {
        Extra(BTreeMap::new())
    }

    pub fn from_map(map: BTreeMap<String, Value>) -> Self {
        Extra(map)
    }

    pub fn get(&self, key: &str) -> Value {
        self.0.get(key).cloned().unwrap_or_else(|| Value::String(String::new()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }
}

pub struct LogRecord {
    // Input, set at construction.
    pub channel: String,
    pub msg: String,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
    pub level: Level,
    pub exc_info: Option<ExcInfo>,
    pub extra: Extra,
    pub frame: Option<CallSite>,
    pub dispatcher: Option<Weak<RecordDispatcher>>,

    /// Set by a handler to claim ownership of the record past dispatch
    /// (spec.md §4.5, §9 "Ownership of records").
    pub keep_open: bool,

    heavy_initialized: bool,
    late: bool,
    information_pulled: bool,

    // Heavy-init fields.
    time: Option<DateTime<Utc>>,
    process: Option<u32>,

    // Derived / memoised fields.
    message: Option<String>,
    calling_frame: Option<CallSite>,
    module: Option<String>,
    filename: Option<String>,
    lineno: Option<u32>,
    thread: Option<String>,
    thread_name: Option<String>,
    process_name: Option<String>,
    formatted_exception: Option<String>,
    exception_name: Option<String>,
    exception_message: Option<String>,
    exception_shortname: Option<String>,
}

impl LogRecord {
    pub fn new(channel: impl Into<String>, level: Level, msg: impl Into<String>) -> Self {
        LogRecord {
            channel: channel.into(),
            msg: msg.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            level,
            exc_info: None,
            extra: Extra::new(),
            frame: None,
            dispatcher: None,
            keep_open: false,
            heavy_initialized: false,
            late: false,
            information_pulled: false,
            time: None,
            process: None,
            message: None,
            calling_frame: None,
            module: None,
            filename: None,
            lineno: None,
            thread: None,
            thread_name: None,
            process_name: None,
            formatted_exception: None,
            exception_name: None,
            exception_message: None,
            exception_shortname: None,
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwargs(mut self, kwargs: BTreeMap<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn with_exc_info(mut self, exc_info: ExcInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_frame(mut self, frame: CallSite) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Weak<RecordDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn heavy_initialized(&self) -> bool {
        self.heavy_initialized
    }

    pub fn late(&self) -> bool {
        self.late
    }

    pub fn information_pulled(&self) -> bool {
        self.information_pulled
    }

    /// Captures timestamp and PID. Idempotent; panics if called after
    /// [`LogRecord::close`] made the record late (spec.md §7
    /// `HeavyInitTooLate`).
    pub fn heavy_init(&mut self) {
        if self.heavy_initialized {
            return;
        }
        if self.late {
            heavy_init_too_late();
        }
        self.time = Some(Utc::now());
        self.process = Some(std::process::id());
        self.heavy_initialized = true;
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn process(&self) -> Option<u32> {
        self.process
    }

    /// In languages with frame introspection this walks up skipping library
    /// frames; here the call site is captured textually at the logging
    /// macro and the walk collapses to the identity (spec.md §9 "Frame
    /// introspection").
    pub fn calling_frame(&mut self) -> Option<&CallSite> {
        if self.calling_frame.is_none() {
            self.calling_frame = self.frame.clone();
        }
        self.calling_frame.as_ref()
    }

    /// Always `None`: no call-site function name is obtainable without a
    /// live call stack (spec.md's Open Question on frameless ports).
    pub fn func_name(&self) -> Option<&str> {
        None
    }

    pub fn module(&mut self) -> Option<&str> {
        if self.module.is_none() {
            let value = self.calling_frame().and_then(|f| f.module.clone());
            self.module = value;
        }
        self.module.as_deref()
    }

    pub fn filename(&mut self) -> Option<&str> {
        if self.filename.is_none() {
            let value = self
                .calling_frame()
                .and_then(|f| f.filename.clone())
                .map(|raw| normalize_filename(&raw));
            self.filename = value;
        }
        self.filename.as_deref()
    }

    pub fn lineno(&mut self) -> Option<u32> {
        if self.lineno.is_none() {
            self.lineno = self.calling_frame().and_then(|f| f.lineno);
        }
        self.lineno
    }

    /// Captured from the current thread at access time, not from `frame` —
    /// accessing it from a thread other than the one that logged the record
    /// is the caller's own mistake (spec.md §4.2).
    pub fn thread(&mut self) -> &str {
        if self.thread.is_none() {
            self.thread = Some(format!("{:?}", std::thread::current().id()));
        }
        self.thread.as_deref().unwrap()
    }

    pub fn thread_name(&mut self) -> Option<&str> {
        if self.thread_name.is_none() {
            self.thread_name = Some(
                std::thread::current()
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_default(),
            );
        }
        self.thread_name.as_deref()
    }

    pub fn process_name(&mut self) -> Option<&str> {
        if self.process_name.is_none() {
            self.process_name = std::env::current_exe()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
        }
        self.process_name.as_deref()
    }

    pub fn exception_name(&mut self) -> Option<&str> {
        if self.exception_name.is_none() {
            self.exception_name = self.exc_info.as_ref().map(|e| e.type_name.clone());
        }
        self.exception_name.as_deref()
    }

    /// `exc_info`'s type name with its module path stripped. Supplemented
    /// from `original_source/logbook/base.py`; not in spec.md's attribute
    /// list.
    pub fn exception_shortname(&mut self) -> Option<&str> {
        if self.exception_shortname.is_none() {
            self.exception_shortname = self.exc_info.as_ref().map(|e| e.shortname().to_owned());
        }
        self.exception_shortname.as_deref()
    }

    pub fn exception_message(&mut self) -> Option<&str> {
        if self.exception_message.is_none() {
            self.exception_message = self.exc_info.as_ref().map(|e| e.message.clone());
        }
        self.exception_message.as_deref()
    }

    pub fn formatted_exception(&mut self) -> Option<&str> {
        if self.formatted_exception.is_none() {
            self.formatted_exception = self.exc_info.as_ref().map(|e| {
                let mut out = format!("{}: {}", e.type_name, e.message);
                if let Some(bt) = &e.backtrace {
                    out.push('\n');
                    out.push_str(&bt.to_string());
                }
                out
            });
        }
        self.formatted_exception.as_deref()
    }

    /// The rendered message: `msg` verbatim if `args`/`kwargs` are both
    /// empty, otherwise `msg` applied as a format template (spec.md §4.2).
    pub fn message(&mut self) -> Result<&str, FormatError> {
        if self.message.is_none() {
            let filename = self.filename().map(str::to_owned);
            let lineno = self.lineno();
            let rendered = format::render(&self.msg, &self.args, &self.kwargs, filename.as_deref(), lineno)?;
            self.message = Some(rendered);
        }
        Ok(self.message.as_deref().unwrap())
    }

    /// Forces every derived field to be computed. Idempotent; also performs
    /// `heavy_init` first, since nothing downstream (including
    /// [`LogRecord::to_dict`]) is meaningful without it.
    pub fn pull_information(&mut self) -> Result<(), FormatError> {
        self.heavy_init();
        if self.information_pulled {
            return Ok(());
        }
        self.message()?;
        self.calling_frame();
        self.module();
        self.filename();
        self.lineno();
        self.thread();
        self.thread_name();
        self.process_name();
        self.formatted_exception();
        self.exception_name();
        self.exception_message();
        self.exception_shortname();
        self.information_pulled = true;
        Ok(())
    }

    /// Strips cyclic/frame references so the record can be dropped or
    /// handed to a GC-like owner; previously memoised derivations survive
    /// (spec.md §3 invariant iii).
    pub fn close(&mut self) {
        self.exc_info = None;
        self.frame = None;
        self.calling_frame = None;
        self.late = true;
    }

    /// Marks the record late without closing it, for the handler that set
    /// `keep_open` and has taken ownership of the eventual `close` (spec.md
    /// §4.5 `make_record_and_handle`, §9 "Ownership of records").
    pub(crate) fn mark_late(&mut self) {
        self.late = true;
    }

    /// A plain, JSON-representable snapshot (spec.md §6.2). Calls
    /// `pull_information` first. `json_safe` exists for parity with the
    /// original's flag of the same name; since every value here is already
    /// a [`serde_json::Value`], there is no non-JSON-safe representation to
    /// fall back to, so it currently has no observable effect.
    pub fn to_dict(&mut self, json_safe: bool) -> Result<serde_json::Map<String, Value>, FormatError> {
        let _ = json_safe;
        self.pull_information()?;

        let mut map = serde_json::Map::new();
        map.insert("channel".into(), Value::String(self.channel.clone()));
        map.insert("msg".into(), Value::String(self.msg.clone()));
        map.insert("args".into(), Value::Array(self.args.clone()));
        map.insert(
            "kwargs".into(),
            Value::Object(self.kwargs.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        );
        map.insert("level".into(), Value::from(self.level.as_int()));
        map.insert(
            "level_name".into(),
            Value::String(
                self.level
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|_| self.level.as_int().to_string()),
            ),
        );
        map.insert(
            "extra".into(),
            Value::Object(self.extra.as_map().iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        );
        let time = self.time.expect("pull_information ran heavy_init");
        map.insert("time".into(), Value::String(time.to_rfc3339()));
        map.insert(
            "process".into(),
            Value::from(self.process.expect("pull_information ran heavy_init")),
        );
        map.insert("process_name".into(), opt_string(&self.process_name));
        map.insert("thread".into(), opt_string(&self.thread));
        map.insert("thread_name".into(), opt_string(&self.thread_name));
        map.insert("func_name".into(), Value::Null);
        map.insert("module".into(), opt_string(&self.module));
        map.insert("filename".into(), opt_string(&self.filename));
        map.insert(
            "lineno".into(),
            self.lineno.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(
            "message".into(),
            Value::String(self.message.clone().expect("pull_information computed message")),
        );
        map.insert("exception_name".into(), opt_string(&self.exception_name));
        map.insert("exception_message".into(), opt_string(&self.exception_message));
        map.insert("formatted_exception".into(), opt_string(&self.formatted_exception));
        Ok(map)
    }

    /// Reconstructs a record from a [`LogRecord::to_dict`]-shaped mapping,
    /// ignoring unknown keys and accepting any superset (spec.md §6.2).
    /// Heavy-init is suppressed — `time`/`process` come straight from `d` —
    /// and the dispatcher reference is null. All prior derivations are
    /// installed directly rather than left to be recomputed from a `frame`
    /// that no longer exists, so the reconstructed record is immediately
    /// indistinguishable from a pulled one, matching the fix spec.md's
    /// Design Notes call for in the original's `update_from_dict`.
    pub fn from_dict(d: &serde_json::Map<String, Value>) -> Self {
        let channel = d.get("channel").and_then(Value::as_str).unwrap_or_default().to_owned();
        let msg = d.get("msg").and_then(Value::as_str).unwrap_or_default().to_owned();
        let args = d.get("args").and_then(Value::as_array).cloned().unwrap_or_default();
        let kwargs = d
            .get("kwargs")
            .and_then(Value::as_object)
            .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        let level = Level::from_int(d.get("level").and_then(Value::as_i64).unwrap_or(0) as i32);
        let extra = Extra::from_map(
            d.get("extra")
                .and_then(Value::as_object)
                .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
        );
        let time = d
            .get("time")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let process = d.get("process").and_then(Value::as_u64).map(|p| p as u32);

        LogRecord {
            channel,
            msg,
            args,
            kwargs,
            level,
            exc_info: None,
            extra,
            frame: None,
            dispatcher: None,
            keep_open: false,
            heavy_initialized: true,
            late: false,
            information_pulled: true,
            time,
            process,
            message: d.get("message").and_then(Value::as_str).map(str::to_owned),
            calling_frame: None,
            module: d.get("module").and_then(Value::as_str).map(str::to_owned),
            filename: d.get("filename").and_then(Value::as_str).map(str::to_owned),
            lineno: d.get("lineno").and_then(Value::as_u64).map(|l| l as u32),
            thread: d.get("thread").and_then(Value::as_str).map(str::to_owned),
            thread_name: d.get("thread_name").and_then(Value::as_str).map(str::to_owned),
            process_name: d.get("process_name").and_then(Value::as_str).map(str::to_owned),
            formatted_exception: d.get("formatted_exception").and_then(Value::as_str).map(str::to_owned),
            exception_name: d.get("exception_name").and_then(Value::as_str).map(str::to_owned),
            exception_message: d.get("exception_message").and_then(Value::as_str).map(str::to_owned),
            exception_shortname: None,
        }
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn normalize_filename(raw: &str) -> String {
    if raw.starts_with('<') && raw.ends_with('>') {
        return raw.to_owned();
    }
    std::path::Path::new(raw)
        .canonicalize()
        .ok()
        .and_then(|p| p.to_str().map(str::to_owned))
        .unwrap_or_else(|| raw.to_owned())
}
