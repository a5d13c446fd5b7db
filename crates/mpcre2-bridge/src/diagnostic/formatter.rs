//! Terminal rendering of bridge diagnostics
//!
//! A diagnostic renders as a header line followed by an optional
//! `--> operation` line and one `= label: text` line per note or help.
//! The plain and coloured renderings share the same layout; only the
//! styling differs.

use crate::diagnostic::{Diagnostic, DiagnosticLevel};
use mpcre2_config::ColorSetting;
use std::io;
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
    /// Colour only when stderr is a terminal
    Auto,
}

impl ColorMode {
    /// Resolve against the process environment; `NO_COLOR` wins over everything
    pub fn to_color_choice(self) -> ColorChoice {
        self.resolve(std::env::var_os("NO_COLOR").is_some())
    }

    fn resolve(self, no_color: bool) -> ColorChoice {
        match self {
            _ if no_color => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto => ColorChoice::Auto,
        }
    }
}

impl From<ColorSetting> for ColorMode {
    fn from(setting: ColorSetting) -> Self {
        match setting {
            ColorSetting::Auto => ColorMode::Auto,
            ColorSetting::Always => ColorMode::Always,
            ColorSetting::Never => ColorMode::Never,
        }
    }
}

/// What precedes the text of a rendered line
enum Lead<'a> {
    Header(DiagnosticLevel, &'a str),
    Operation,
    Trailer(&'static str, Color),
}

fn lines(diag: &Diagnostic) -> impl Iterator<Item = (Lead<'_>, &str)> {
    let header = std::iter::once((Lead::Header(diag.level, &diag.code), diag.message.as_str()));
    let operation = diag.operation.as_deref().map(|op| (Lead::Operation, op));
    let notes = diag
        .notes
        .iter()
        .map(|note| (Lead::Trailer("note", Color::Cyan), note.as_str()));
    let help = diag
        .help
        .as_deref()
        .map(|help| (Lead::Trailer("help", Color::Green), help));

    header.chain(operation).chain(notes).chain(help)
}

fn bold(color: Option<Color>) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(color).set_bold(true);
    spec
}

fn styled(w: &mut impl WriteColor, spec: &ColorSpec, text: &str) -> io::Result<()> {
    w.set_color(spec)?;
    write!(w, "{}", text)?;
    w.reset()
}

/// Writes diagnostics to stderr or a buffer
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticFormatter {
    color_mode: ColorMode,
}

impl DiagnosticFormatter {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    pub fn auto() -> Self {
        Self::new(ColorMode::Auto)
    }

    pub fn plain() -> Self {
        Self::new(ColorMode::Never)
    }

    /// Write to stderr; a failed write is dropped since there is nowhere left to report it
    pub fn emit(&self, diag: &Diagnostic) {
        let mut stream = StandardStream::stderr(self.color_mode.to_color_choice());
        let _ = self.write_diagnostic(&mut stream, diag);
    }

    pub fn write_diagnostic(&self, w: &mut impl WriteColor, diag: &Diagnostic) -> io::Result<()> {
        for (lead, text) in lines(diag) {
            match lead {
                Lead::Header(level, code) => {
                    let color = match level {
                        DiagnosticLevel::Error => Color::Red,
                        DiagnosticLevel::Warning => Color::Yellow,
                    };
                    styled(w, &bold(Some(color)), &format!("{}[{}]", level, code))?;
                    styled(w, &bold(None), &format!(": {}", text))?;
                }
                Lead::Operation => {
                    styled(w, &bold(Some(Color::Cyan)), "  --> ")?;
                    write!(w, "{}", text)?;
                }
                Lead::Trailer(label, color) => {
                    styled(w, &bold(Some(Color::Cyan)), "   = ")?;
                    styled(w, &bold(Some(color)), label)?;
                    write!(w, ": {}", text)?;
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }

    /// Render into memory, with escapes only if the mode is `Always`
    pub fn format_to_buffer(&self, diag: &Diagnostic) -> Vec<u8> {
        let mut buf = match self.color_mode {
            ColorMode::Always => Buffer::ansi(),
            ColorMode::Never | ColorMode::Auto => Buffer::no_color(),
        };
        let _ = self.write_diagnostic(&mut buf, diag);
        buf.into_inner()
    }
}

impl Default for DiagnosticFormatter {
    fn default() -> Self {
        Self::auto()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::error_codes;

    fn stale() -> Diagnostic {
        Diagnostic::error_with_code(error_codes::HANDLE_STALE, "handle 4294967296 was freed")
            .with_operation("mpcre2_code_free")
            .with_help("pass back a token returned by a previous call")
    }

    #[test]
    fn test_plain_layout() {
        let output = String::from_utf8(DiagnosticFormatter::plain().format_to_buffer(&stale())).unwrap();

        assert_eq!(
            output,
            "error[MP0101]: handle 4294967296 was freed\n  \
             --> mpcre2_code_free\n   \
             = help: pass back a token returned by a previous call\n"
        );
    }

    #[test]
    fn test_without_operation() {
        let output =
            String::from_utf8(DiagnosticFormatter::plain().format_to_buffer(&Diagnostic::error("boom"))).unwrap();

        assert_eq!(output, "error[MP9999]: boom\n");
    }

    #[test]
    fn test_always_mode_writes_escapes() {
        let colored = DiagnosticFormatter::new(ColorMode::Always).format_to_buffer(&stale());
        let colored = String::from_utf8(colored).unwrap();

        assert!(colored.contains("\x1b["));
        assert!(colored.contains("mpcre2_code_free"));
        assert_ne!(colored, stale().to_human_string());
    }

    #[test]
    fn test_color_mode_from_setting() {
        assert_eq!(ColorMode::from(ColorSetting::Always), ColorMode::Always);
        assert_eq!(ColorMode::from(ColorSetting::Never), ColorMode::Never);
        assert_eq!(ColorMode::from(ColorSetting::Auto), ColorMode::Auto);
    }

    #[test]
    fn test_no_color_overrides_mode() {
        assert_eq!(ColorMode::Always.resolve(true), ColorChoice::Never);
        assert_eq!(ColorMode::Auto.resolve(true), ColorChoice::Never);
        assert_eq!(ColorMode::Always.resolve(false), ColorChoice::Always);
        assert_eq!(ColorMode::Auto.resolve(false), ColorChoice::Auto);
    }
}
