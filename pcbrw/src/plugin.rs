//! The plugin life cycle: host flag intake, input parsing, output writing,
//! and the exit-code protocol.
//!
//! The host invokes a plugin as `plugin <input> -W:<width> -H:<height> ...`
//! (with `/` as the flag prefix on Windows). [`Plugin::begin`] consumes the
//! command line and the input file; the plugin then transforms
//! [`Plugin::board_mut`] and finishes with [`Plugin::end`], whose return
//! value is the process exit code the host interprets.

use core::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, error, warn};

use crate::board::{Board, BoardFlags, Grid};
use crate::parse::parse_file;
use crate::primitives::{dist_um, dist_valid, size_valid, Format, Point};
use crate::write::write_elements;
use crate::{ErrorKind, PcbError};

/// The host UI language, as reported on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Language {
    /// English (`UK`).
    #[default]
    English,
    /// German (`DE`).
    German,
    /// French (`FR`).
    French,
}

impl Language {
    fn from_code(code: &str) -> Option<Language> {
        if code.eq_ignore_ascii_case("UK") {
            Some(Language::English)
        } else if code.eq_ignore_ascii_case("DE") {
            Some(Language::German)
        } else if code.eq_ignore_ascii_case("FR") {
            Some(Language::French)
        } else {
            None
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Language::English => "English",
            Language::German => "German",
            Language::French => "French",
        };
        f.write_str(name)
    }
}

/// The operation the host performs with the plugin output, reported through
/// the process exit code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    /// Perform no operation; no output is written.
    #[default]
    None = 0,
    /// Replace the input elements with the output elements.
    ReplaceAbsolute = 1,
    /// Add the output elements at their specified positions.
    AddAbsolute = 2,
    /// Remove the input elements, let the user place the output freely.
    ReplaceRelative = 3,
    /// Let the user place the output elements freely.
    AddRelative = 4,
}

/// First exit code of the failure band.
pub const FAILED_START: u8 = 128;
/// First exit code reserved for library-reported failures.
pub const FAILED_LIBRARY: u8 = FAILED_START;
/// First exit code available to plugin-specific failures.
pub const FAILED_PLUGIN: u8 = 144;
/// Last usable exit code.
pub const FAILED_END: u8 = 255;

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Operation::None => "no operation",
            Operation::ReplaceAbsolute => "replace absolute",
            Operation::AddAbsolute => "add absolute",
            Operation::ReplaceRelative => "replace relative",
            Operation::AddRelative => "add relative",
        };
        f.write_str(name)
    }
}

/// Where the plugin currently is in its life cycle. Diagnostics are
/// labelled with this, and failure exit codes derive from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginState {
    /// `begin` has not run yet.
    #[default]
    Uninitialized = 0,
    /// Consuming the host command line.
    ParsingFlags,
    /// Consuming the input file.
    ParsingInput,
    /// The plugin transforms the board.
    Processing,
    /// Writing the output file.
    WritingOutput,
    /// `end` has finished.
    Completed,
}

impl Display for PluginState {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            PluginState::Uninitialized => "uninitialized",
            PluginState::ParsingFlags => "parsing flags",
            PluginState::ParsingInput => "parsing input",
            PluginState::Processing => "processing",
            PluginState::WritingOutput => "writing output",
            PluginState::Completed => "completed",
        };
        f.write_str(name)
    }
}

const FLAG_PREFIX: char = if cfg!(windows) { '/' } else { '-' };
const FLAG_DELIMITER: char = ':';
const OUTPUT_SUFFIX: &str = "_out";

/// The values collected from the host command line.
#[derive(Debug, Default)]
struct Flags {
    input: Option<String>,
    language: Option<Language>,
    width: Option<i32>,
    height: Option<i32>,
    origin_x: Option<i32>,
    origin_y: Option<i32>,
    grid: Option<i32>,
    flags: Option<i32>,
    process: Option<i32>,
    all: bool,
}

/// One plugin invocation: the state machine from uninitialized to
/// completed, the board, and the input/output paths.
#[derive(Debug)]
pub struct Plugin {
    state: PluginState,
    language: Language,
    process: u32,
    selection: bool,
    board: Board,
    input: PathBuf,
    output: PathBuf,
}

impl Plugin {
    /// Consumes the host command line (including the program name), parses
    /// the input file, and leaves the plugin in the processing state.
    pub fn begin<I>(args: I) -> Result<Plugin, PcbError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut plugin = Plugin {
            state: PluginState::ParsingFlags,
            language: Language::default(),
            process: 0,
            selection: true,
            board: Board::default(),
            input: PathBuf::new(),
            output: PathBuf::new(),
        };
        plugin.parse_flags(args).map_err(|err| {
            plugin.report(&err);
            err
        })?;

        plugin.state = PluginState::ParsingInput;
        plugin.parse_input().map_err(|err| {
            plugin.report(&err);
            err
        })?;

        plugin.state = PluginState::Processing;
        debug!("plugin ready: {}", plugin.board.describe());
        Ok(plugin)
    }

    fn parse_flags<I>(&mut self, args: I) -> Result<(), PcbError>
    where
        I: IntoIterator<Item = String>,
    {
        // skip the program name
        let args: Vec<String> = args.into_iter().skip(1).collect();
        if args.len() < 3 {
            return Err(PcbError::new(
                ErrorKind::FlagsMissing,
                "too few arguments",
            ));
        }

        let mut flags = Flags::default();
        let mut args = args.into_iter();

        // the input file comes first, before any flag
        let first = args.next().unwrap_or_default();
        let mut pending = None;
        if !first.is_empty() && !first.starts_with(FLAG_PREFIX) {
            flags.input = Some(first);
        } else {
            pending = Some(first);
        }

        for arg in pending.into_iter().chain(args) {
            if arg.is_empty() {
                continue;
            }
            let Some(rest) = arg.strip_prefix(FLAG_PREFIX) else {
                return Err(PcbError::new(
                    ErrorKind::FlagsSyntax,
                    format!("unexpected argument: {arg}"),
                ));
            };
            let Some(letter) = rest.chars().next().filter(char::is_ascii_alphabetic) else {
                let what = if rest.is_empty() { "incomplete" } else { "invalid" };
                return Err(PcbError::new(
                    ErrorKind::FlagsSyntax,
                    format!("{what} flag: {arg}"),
                ));
            };
            let letter = letter.to_ascii_uppercase();

            // the lone value-less flag
            if letter == 'A' {
                if flags.all {
                    warn!("duplicate flag: {arg}");
                } else {
                    debug!("importing the entire board");
                }
                if rest.len() > 1 {
                    warn!("ignored flag value: {arg}");
                }
                flags.all = true;
                continue;
            }

            let value = rest[1..].strip_prefix(FLAG_DELIMITER).ok_or_else(|| {
                PcbError::new(ErrorKind::FlagsSyntax, format!("incomplete flag: {arg}"))
            })?;

            let target = match letter {
                'W' => &mut flags.width,
                'H' => &mut flags.height,
                'X' => &mut flags.origin_x,
                'Y' => &mut flags.origin_y,
                'R' => &mut flags.grid,
                'M' => &mut flags.flags,
                'P' => &mut flags.process,
                'L' => {
                    if flags.language.replace(parse_language(&arg, value)?).is_some() {
                        warn!("overwriting flag: {arg}");
                    }
                    continue;
                }
                _ => {
                    return Err(PcbError::new(
                        ErrorKind::FlagsSyntax,
                        format!("unknown flag: {arg}"),
                    ))
                }
            };
            if target.replace(parse_int(&arg, value)?).is_some() {
                warn!("overwriting flag: {arg}");
            }
        }

        // required values first: the input path and the board dimensions
        let mut missing = Vec::new();
        if flags.input.is_none() {
            missing.push("input file");
        }
        if flags.width.is_none() {
            missing.push("width (W)");
        }
        if flags.height.is_none() {
            missing.push("height (H)");
        }
        if !missing.is_empty() {
            let kind = if flags.input.is_none() {
                ErrorKind::InputMissing
            } else {
                ErrorKind::FlagsMissing
            };
            return Err(PcbError::new(
                kind,
                format!("could not find required argument(s): {}", missing.iter().join(", ")),
            ));
        }

        // the rest defaults with a warning
        let mut defaulted = Vec::new();
        if flags.language.is_none() {
            defaulted.push("language (L)");
        }
        if flags.origin_x.is_none() {
            defaulted.push("origin X (X)");
        }
        if flags.origin_y.is_none() {
            defaulted.push("origin Y (Y)");
        }
        if flags.grid.is_none() {
            defaulted.push("grid (R)");
        }
        if flags.flags.is_none() {
            defaulted.push("flags (M)");
        }
        if flags.process.is_none() {
            defaulted.push("process ID (P)");
        }
        if !defaulted.is_empty() {
            warn!(
                "defaulting missing argument(s): {}",
                defaulted.iter().join(", ")
            );
        }

        let width = flags.width.unwrap_or(0);
        let height = flags.height.unwrap_or(0);
        let origin_x = flags.origin_x.unwrap_or(0);
        let origin_y = flags.origin_y.unwrap_or(0);
        let grid = flags.grid.unwrap_or_else(|| dist_um(1270));

        if !size_valid(width) {
            return Err(PcbError::new(ErrorKind::FlagsSyntax, "width invalid"));
        }
        if !size_valid(height) {
            return Err(PcbError::new(ErrorKind::FlagsSyntax, "height invalid"));
        }
        if !dist_valid(origin_x) {
            return Err(PcbError::new(ErrorKind::FlagsSyntax, "origin x invalid"));
        }
        if !dist_valid(origin_y) {
            return Err(PcbError::new(ErrorKind::FlagsSyntax, "origin y invalid"));
        }
        if !size_valid(grid) {
            return Err(PcbError::new(ErrorKind::FlagsSyntax, "grid invalid"));
        }

        let raw_flags = flags.flags.unwrap_or(0) as u32;
        let board_flags = BoardFlags::from_bits_truncate(raw_flags);
        if board_flags.bits() != raw_flags {
            warn!("unknown board flag bits ignored: {raw_flags:#x}");
        }

        let input = PathBuf::from(flags.input.unwrap_or_default());
        self.output = output_path(&input);
        self.input = input;
        self.language = flags.language.unwrap_or_default();
        self.process = flags.process.unwrap_or(0) as u32;
        self.selection = !flags.all;
        self.board.width = width;
        self.board.height = height;
        self.board.grid = Grid::new(Point::new(origin_x, origin_y), grid, grid);
        self.board.flags = board_flags;
        Ok(())
    }

    fn parse_input(&mut self) -> Result<(), PcbError> {
        let parsed = parse_file(&self.input).map_err(|err| {
            if err.kind() == ErrorKind::Io {
                err
            } else {
                // the plugin-facing kind; details were logged at the source
                PcbError::new(ErrorKind::InputSyntax, err.to_string())
            }
        })?;
        self.board.elements = parsed.elements;
        self.board.salvaged = parsed.salvaged;
        if self.board.salvaged {
            warn!("input file was salvaged; some elements were discarded");
        }
        Ok(())
    }

    /// The board parsed from the input, to transform in place.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The board parsed from the input.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The current life-cycle state.
    pub fn state(&self) -> PluginState {
        self.state
    }

    /// The host UI language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// The host process id.
    pub fn process(&self) -> u32 {
        self.process
    }

    /// Whether the input holds only the selection rather than the whole
    /// board (`-A` absent).
    pub fn is_selection(&self) -> bool {
        self.selection
    }

    /// The input file path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// The output file path: the input path with `_out` spliced in before
    /// the extension.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The exit code reporting a library failure in the current state.
    pub fn exit_code(&self) -> u8 {
        FAILED_LIBRARY + self.state as u8
    }

    /// Writes the output file (unless the operation is [`Operation::None`])
    /// and returns the exit code to end the process with.
    pub fn end(mut self, operation: Operation) -> Result<u8, PcbError> {
        if self.state != PluginState::Processing {
            return Err(PcbError::new(
                ErrorKind::InvalidState,
                format!("end called while {}", self.state),
            ));
        }
        self.state = PluginState::WritingOutput;

        if operation != Operation::None {
            let text = write_elements(&self.board.elements, Format::Raw).map_err(|err| {
                let err = err.rethrow();
                self.report(&err);
                err
            })?;
            std::fs::write(&self.output, text).map_err(|err| {
                let err = PcbError::new(
                    ErrorKind::Io,
                    format!("error opening file for writing: {err}"),
                );
                self.report(&err);
                err
            })?;
            debug!("wrote {}", self.output.display());
        }

        self.state = PluginState::Completed;
        Ok(operation as u8)
    }

    /// Maps a plugin-specific failure code into the 144..=255 band.
    pub fn bail(code: u8) -> u8 {
        FAILED_PLUGIN.checked_add(code).unwrap_or(FAILED_END)
    }

    /// Logs an error labelled with the current plugin state.
    pub fn report(&self, err: &PcbError) {
        error!("{} [{}]", err, self.state);
    }

    /// Logs a critical error and returns the state-derived exit code for
    /// the caller to end the process with.
    pub fn fail(&self, err: &PcbError) -> u8 {
        error!("Critical {} [{}]", err, self.state);
        self.exit_code()
    }
}

fn parse_int(arg: &str, value: &str) -> Result<i32, PcbError> {
    value.parse::<i32>().map_err(|_| {
        PcbError::new(
            ErrorKind::FlagsSyntax,
            format!("invalid flag value: {arg}"),
        )
    })
}

fn parse_language(arg: &str, value: &str) -> Result<Language, PcbError> {
    Language::from_code(value).ok_or_else(|| {
        PcbError::new(
            ErrorKind::FlagsSyntax,
            format!("invalid flag value: {arg}"),
        )
    })
}

/// Splices `_out` into a path just before its extension.
fn output_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(OUTPUT_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| (*arg).to_owned()).collect()
    }

    fn flag(letter: char, value: &str) -> String {
        format!("{FLAG_PREFIX}{letter}{FLAG_DELIMITER}{value}")
    }

    #[test]
    fn output_path_splices_suffix() {
        assert_eq!(
            output_path(Path::new("work/board.txt")),
            PathBuf::from("work/board_out.txt")
        );
        assert_eq!(output_path(Path::new("board")), PathBuf::from("board_out"));
    }

    #[test]
    fn begin_requires_dimensions() {
        let input = std::env::temp_dir().join("pcbrw_flags_test.txt");
        std::fs::write(&input, "TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;").unwrap();
        let err = Plugin::begin(args(&[
            "plugin",
            input.to_str().unwrap(),
            &flag('W', "1000"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FlagsMissing);
    }

    #[test]
    fn begin_parses_flags_and_input() {
        let input = std::env::temp_dir().join("pcbrw_begin_test.txt");
        std::fs::write(&input, "TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;").unwrap();

        let plugin = Plugin::begin(args(&[
            "plugin",
            input.to_str().unwrap(),
            &flag('W', "1000000"),
            &flag('H', "800000"),
            &flag('L', "DE"),
            &flag('X', "100"),
            &flag('Y', "-100"),
            &flag('R', "12700"),
            &flag('M', "17"),
            &flag('P', "4242"),
        ]))
        .unwrap();

        assert_eq!(plugin.state(), PluginState::Processing);
        assert_eq!(plugin.language(), Language::German);
        assert_eq!(plugin.process(), 4242);
        assert!(plugin.is_selection());
        assert_eq!(plugin.board().width, 1_000_000);
        assert_eq!(plugin.board().grid.origin, Point::new(100, -100));
        assert!(plugin
            .board()
            .flags
            .contains(BoardFlags::PLANE_TOP | BoardFlags::MULTILAYER));
        assert_eq!(plugin.board().elements.len(), 1);
        assert!(!plugin.board().salvaged);
        assert_eq!(
            plugin.output(),
            std::env::temp_dir().join("pcbrw_begin_test_out.txt")
        );
    }

    #[test]
    fn selection_flag() {
        let input = std::env::temp_dir().join("pcbrw_selection_test.txt");
        std::fs::write(&input, "").unwrap();
        let all = format!("{FLAG_PREFIX}A");
        let plugin = Plugin::begin(args(&[
            "plugin",
            input.to_str().unwrap(),
            &flag('W', "1000"),
            &flag('H', "1000"),
            &all,
        ]))
        .unwrap();
        assert!(!plugin.is_selection());
    }

    #[test]
    fn end_writes_output_and_reports_operation() {
        let input = std::env::temp_dir().join("pcbrw_end_test.txt");
        std::fs::write(&input, "TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;").unwrap();
        let output = std::env::temp_dir().join("pcbrw_end_test_out.txt");

        let plugin = Plugin::begin(args(&[
            "plugin",
            input.to_str().unwrap(),
            &flag('W', "1000"),
            &flag('H', "1000"),
        ]))
        .unwrap();
        let code = plugin.end(Operation::ReplaceAbsolute).unwrap();
        assert_eq!(code, 1);

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "TRACK,LAYER=1,WIDTH=100,P0=0/0,P1=1/1;\n");
    }

    #[test]
    fn bail_clamps_into_plugin_band() {
        assert_eq!(Plugin::bail(0), 144);
        assert_eq!(Plugin::bail(10), 154);
        assert_eq!(Plugin::bail(200), 255);
    }

    #[test]
    fn exit_codes_derive_from_state() {
        let plugin = Plugin {
            state: PluginState::ParsingInput,
            language: Language::default(),
            process: 0,
            selection: true,
            board: Board::default(),
            input: PathBuf::new(),
            output: PathBuf::new(),
        };
        assert_eq!(plugin.exit_code(), 130);
    }
}
