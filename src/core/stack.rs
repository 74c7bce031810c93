//! Caller and stack trace capture
//!
//! Unwinding goes through the `backtrace` crate. The logger anchors every capture
//! at a `#[track_caller]` location, so the reported caller is the user's call
//! site regardless of how many frames this crate added on top of it.

use std::fmt;
use std::panic::Location;
use std::path::Path;

/// Default number of frames captured for a full stack trace
pub const DEFAULT_MAX_STACK_FRAMES: usize = 64;

/// Frames unwound past the call site while looking for the anchor location
const ANCHOR_SEARCH_DEPTH: usize = 32;

const UNKNOWN: &str = "???";

/// One frame of a captured stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackCaller {
    /// Demangled function path, without the symbol hash
    pub function: Option<String>,
    pub file: Option<String>,
    /// Line number, 0 when unknown
    pub line: u32,
    /// Start address of the function
    pub entry: usize,
    /// Instruction pointer within the function
    pub pc: usize,
}

impl StackCaller {
    /// Caller built from a source location only; function and addresses unknown
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            function: None,
            file: Some(location.file().to_string()),
            line: location.line(),
            entry: 0,
            pc: 0,
        }
    }

    fn is_at(&self, location: &Location<'_>) -> bool {
        self.line == location.line()
            && self
                .file
                .as_deref()
                .is_some_and(|file| Path::new(file).ends_with(location.file()))
    }

    fn from_symbol(symbol: &backtrace::Symbol, entry: usize, pc: usize) -> Self {
        Self {
            function: symbol.name().map(|name| format!("{:#}", name)),
            file: symbol.filename().map(|p| p.display().to_string()),
            line: symbol.lineno().unwrap_or(0),
            entry,
            pc,
        }
    }

    /// Function path, or `???` when unresolved
    pub fn function_or_unknown(&self) -> &str {
        self.function.as_deref().unwrap_or(UNKNOWN)
    }

    /// Final type or module segment plus the function name
    pub fn short_function(&self) -> &str {
        short_function(self.function_or_unknown())
    }

    /// File path, or `???` when unresolved
    pub fn file_or_unknown(&self) -> &str {
        self.file.as_deref().unwrap_or(UNKNOWN)
    }

    /// File name without directories
    pub fn short_file(&self) -> &str {
        trim_dirs(self.file_or_unknown())
    }

    /// Renders this caller with the given options
    pub fn format_with(&self, format: &StackFormat) -> String {
        let mut out = String::with_capacity(128);
        self.write_with(&mut out, format);
        out
    }

    fn write_with(&self, out: &mut String, format: &StackFormat) {
        use std::fmt::Write;

        let padding = format.padding();
        if format.extended {
            out.push_str(&padding);
        }
        let _ = write!(out, "{}({:#x})", self.function_or_unknown(), self.entry);
        if !format.extended {
            return;
        }
        out.push('\n');
        out.push_str(&padding);
        out.push_str(&format.indent());
        let file = if format.short_file {
            self.short_file()
        } else {
            self.file_or_unknown()
        };
        let _ = write!(
            out,
            "{}:{} +{:#x}",
            file,
            self.line,
            self.pc.saturating_sub(self.entry)
        );
    }
}

impl fmt::Display for StackCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(&StackFormat::default()))
    }
}

/// Rendering options for callers and stack traces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFormat {
    /// Adds a second line per caller with `file:line +offset`
    pub extended: bool,
    /// Trims directories from file paths
    pub short_file: bool,
    pub pad_char: char,
    /// Pad characters in front of every line
    pub pad_width: usize,
    /// Extra pad characters in front of the file line
    pub indent_width: usize,
}

impl Default for StackFormat {
    fn default() -> Self {
        Self {
            extended: false,
            short_file: false,
            pad_char: '\t',
            pad_width: 0,
            indent_width: 1,
        }
    }
}

impl StackFormat {
    /// Extended format padded with tabs
    pub fn tabbed(pad_width: usize, indent_width: usize) -> Self {
        Self {
            extended: true,
            short_file: false,
            pad_char: '\t',
            pad_width,
            indent_width,
        }
    }

    /// Extended format padded with spaces
    pub fn spaced(pad_width: usize, indent_width: usize) -> Self {
        Self {
            extended: true,
            short_file: false,
            pad_char: ' ',
            pad_width,
            indent_width,
        }
    }

    #[must_use]
    pub fn with_short_file(mut self, short_file: bool) -> Self {
        self.short_file = short_file;
        self
    }

    fn padding(&self) -> String {
        std::iter::repeat(self.pad_char).take(self.pad_width).collect()
    }

    fn indent(&self) -> String {
        std::iter::repeat(self.pad_char).take(self.indent_width).collect()
    }
}

/// Ordered caller chain, innermost call first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    callers: Vec<StackCaller>,
}

impl StackTrace {
    pub fn new(callers: Vec<StackCaller>) -> Self {
        Self { callers }
    }

    /// Captures up to `max_frames` callers, skipping `skip` frames above the caller of `capture`.
    #[inline(never)]
    pub fn capture(max_frames: usize, skip: usize) -> Self {
        let anchor = Self::capture as usize;
        let frames = unwind(max_frames + skip, anchor);
        let mut callers = Vec::with_capacity(max_frames);
        for frame in frames.iter().skip(skip) {
            resolve_into(frame, &mut callers, max_frames);
            if callers.len() >= max_frames {
                break;
            }
        }
        Self { callers }
    }

    /// Captures up to `max_frames` callers starting at `location`.
    ///
    /// The first caller is the frame whose file and line match `location`. Without line
    /// tables it is the first frame outside this crate, reported with `location`'s file
    /// and line. When neither is found the trace holds a single caller built from
    /// `location`.
    #[inline(never)]
    pub fn capture_at(location: &Location<'_>, max_frames: usize) -> Self {
        if max_frames == 0 {
            return Self::default();
        }
        let frames = unwind(ANCHOR_SEARCH_DEPTH + max_frames, Self::capture_at as usize);
        let mut resolved = Vec::with_capacity(max_frames + 4);
        let mut found = None;
        for frame in &frames {
            resolve_into(frame, &mut resolved, usize::MAX);
            if found.is_none() {
                found = find_anchor(&resolved, location).filter(|a| a.is_final(&resolved));
            }
            if found.is_some_and(|a| resolved.len() >= a.index() + max_frames) {
                break;
            }
        }
        let Some(anchor) = found.or_else(|| find_anchor(&resolved, location)) else {
            return Self {
                callers: vec![StackCaller::from_location(location)],
            };
        };

        let mut callers: Vec<StackCaller> = resolved
            .into_iter()
            .skip(anchor.index())
            .take(max_frames)
            .collect();
        if let (Anchor::Outside(_), Some(top)) = (anchor, callers.first_mut()) {
            top.file = Some(location.file().to_string());
            top.line = location.line();
        }
        Self { callers }
    }

    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }

    /// Returns the caller at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn caller(&self, index: usize) -> &StackCaller {
        assert!(
            index < self.callers.len(),
            "stack caller index {} out of range for length {}",
            index,
            self.callers.len()
        );
        &self.callers[index]
    }

    pub fn callers(&self) -> std::slice::Iter<'_, StackCaller> {
        self.callers.iter()
    }

    /// Program counters of all callers
    pub fn pcs(&self) -> Vec<usize> {
        self.callers.iter().map(|c| c.pc).collect()
    }

    /// Renders every caller with `format`, one caller per line (or pair of lines).
    pub fn format_with(&self, format: &StackFormat) -> String {
        let mut out = String::with_capacity(self.callers.len() * 128);
        for (i, caller) in self.callers.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            caller.write_with(&mut out, format);
        }
        out
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(&StackFormat::default()))
    }
}

/// Program counters of up to `size` callers of the function calling this one,
/// after skipping `skip` more frames.
#[inline(never)]
pub fn program_counters(size: usize, skip: usize) -> Vec<usize> {
    StackTrace::capture(size, skip + 1).pcs()
}

/// Unwinds up to `limit` frames above the frame of `anchor`.
///
/// Frames up to and including the anchor (the unwinder's own frames among them) are
/// dropped. If the anchor is never seen the innermost frames are returned as-is.
fn unwind(limit: usize, anchor: usize) -> Vec<backtrace::Frame> {
    let mut frames = Vec::with_capacity(limit.min(128));
    let mut anchored = false;
    backtrace::trace(|frame| {
        if !anchored && frame.symbol_address() as usize == anchor {
            anchored = true;
            frames.clear();
            return true;
        }
        frames.push(frame.clone());
        if anchored {
            frames.len() < limit
        } else {
            frames.len() < limit + ANCHOR_SEARCH_DEPTH
        }
    });
    frames.truncate(limit);
    frames
}

fn resolve_into(frame: &backtrace::Frame, callers: &mut Vec<StackCaller>, max_frames: usize) {
    let entry = frame.symbol_address() as usize;
    let pc = frame.ip() as usize;
    backtrace::resolve_frame(frame, |symbol| {
        if callers.len() < max_frames {
            callers.push(StackCaller::from_symbol(symbol, entry, pc));
        }
    });
}

/// Where a capture starts among the resolved frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Frame resolving to the call site's file and line
    Exact(usize),
    /// First frame outside this crate, used when no frame resolves to the call site
    Outside(usize),
}

impl Anchor {
    fn index(self) -> usize {
        match self {
            Anchor::Exact(i) | Anchor::Outside(i) => i,
        }
    }

    /// Whether no frame further out can change the anchor
    fn is_final(self, callers: &[StackCaller]) -> bool {
        match self {
            Anchor::Exact(_) => true,
            Anchor::Outside(i) => callers[i].line == 0,
        }
    }
}

/// Picks the frame a capture starts at.
///
/// Scanning stops at the first frame outside this crate that has no line number, since
/// no frame past it can be matched against the call site either.
fn find_anchor(callers: &[StackCaller], location: &Location<'_>) -> Option<Anchor> {
    let mut outside = None;
    for (i, caller) in callers.iter().enumerate() {
        if caller.is_at(location) {
            return Some(Anchor::Exact(i));
        }
        if outside.is_none() && is_outside_crate(caller) {
            outside = Some(i);
            if caller.line == 0 {
                return outside.map(Anchor::Outside);
            }
        }
    }
    outside.map(Anchor::Outside)
}

fn is_outside_crate(caller: &StackCaller) -> bool {
    const OWN: &str = concat!(env!("CARGO_CRATE_NAME"), "::");
    const OWN_IMPL: &str = concat!("<", env!("CARGO_CRATE_NAME"), "::");
    caller
        .function
        .as_deref()
        .is_some_and(|f| !f.starts_with(OWN) && !f.starts_with(OWN_IMPL))
}

/// Trims directories from a file path.
pub(crate) fn trim_dirs(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Keeps the last two `::` segments of a function path.
pub(crate) fn short_function(path: &str) -> &str {
    let mut seps = path.rmatch_indices("::");
    match (seps.next(), seps.next()) {
        (Some(_), Some((i, _))) => &path[i + 2..],
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> StackCaller {
        StackCaller {
            function: Some("app::server::Server::run".to_string()),
            file: Some("/src/app/server.rs".to_string()),
            line: 42,
            entry: 0x1000,
            pc: 0x1010,
        }
    }

    #[test]
    fn test_plain_format() {
        assert_eq!(caller().to_string(), "app::server::Server::run(0x1000)");
    }

    #[test]
    fn test_extended_tabbed_format() {
        let out = caller().format_with(&StackFormat::tabbed(1, 1));
        assert_eq!(
            out,
            "\tapp::server::Server::run(0x1000)\n\t\t/src/app/server.rs:42 +0x10"
        );
    }

    #[test]
    fn test_extended_spaced_short_file() {
        let format = StackFormat::spaced(0, 2).with_short_file(true);
        let out = caller().format_with(&format);
        assert_eq!(out, "app::server::Server::run(0x1000)\n  server.rs:42 +0x10");
    }

    #[test]
    fn test_unknown_caller() {
        let c = StackCaller::default();
        assert_eq!(
            c.format_with(&StackFormat::tabbed(0, 1)),
            "???(0x0)\n\t???:0 +0x0"
        );
    }

    #[test]
    fn test_trace_lines() {
        let trace = StackTrace::new(vec![caller(), caller()]);
        let out = trace.format_with(&StackFormat::default());
        assert_eq!(out.lines().count(), 2);
        assert_eq!(trace.pcs(), vec![0x1010, 0x1010]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_caller_out_of_range() {
        let trace = StackTrace::new(vec![caller()]);
        let _ = trace.caller(1);
    }

    #[test]
    fn test_short_names() {
        assert_eq!(caller().short_function(), "Server::run");
        assert_eq!(short_function("main"), "main");
        assert_eq!(short_function("a::b"), "a::b");
        assert_eq!(caller().short_file(), "server.rs");
        assert_eq!(trim_dirs("C:\\src\\lib.rs"), "lib.rs");
    }

    #[test]
    fn test_capture_at_anchors_on_call_site() {
        let location = Location::caller();
        let trace = StackTrace::capture_at(location, 4);
        assert!(!trace.is_empty());
        let top = trace.caller(0);
        assert_eq!(top.line, location.line());
        assert!(top.file_or_unknown().ends_with("stack.rs"));
    }

    fn frame(function: &str, file: Option<&str>, line: u32) -> StackCaller {
        StackCaller {
            function: Some(function.to_string()),
            file: file.map(str::to_string),
            line,
            entry: 0x1000,
            pc: 0x1008,
        }
    }

    #[test]
    fn test_anchor_on_matching_line() {
        let location = Location::caller();
        let callers = vec![
            frame("logng::core::logger::Logger::out", Some("src/core/logger.rs"), 10),
            frame("app::helper", Some("src/helper.rs"), 3),
            frame("app::main", Some(location.file()), location.line()),
        ];
        assert_eq!(find_anchor(&callers, location), Some(Anchor::Exact(2)));
        assert!(!Anchor::Outside(1).is_final(&callers));
    }

    #[test]
    fn test_anchor_without_line_tables() {
        let location = Location::caller();
        let callers = vec![
            frame("logng::core::logger::Logger::out", None, 0),
            frame("<logng::core::logger::Logger as core::clone::Clone>::clone", None, 0),
            StackCaller::default(),
            frame("app::server::Server::run", None, 0),
            frame("app::main", None, 0),
        ];
        assert_eq!(find_anchor(&callers, location), Some(Anchor::Outside(3)));
        assert!(Anchor::Outside(3).is_final(&callers));

        let internal_only = vec![frame("logng::default::info", None, 0), StackCaller::default()];
        assert_eq!(find_anchor(&internal_only, location), None);
    }

    #[test]
    fn test_capture_respects_max_frames() {
        let trace = StackTrace::capture(3, 0);
        assert!(trace.len() <= 3);
        assert!(StackTrace::capture_at(Location::caller(), 0).is_empty());
        assert!(program_counters(2, 0).len() <= 2);
    }
}
