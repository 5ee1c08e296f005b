use std::{
    fmt::Display,
    io::IsTerminal,
    sync::{Arc, LazyLock},
};

use anstyle::{AnsiColor, Style};

/// The styles used when `freq` writes diagnostics to stderr.
///
/// When stderr isn't a terminal, or when colors are disabled through the
/// environment, every style is empty and rendering is a no-op.
#[derive(Clone, Debug)]
pub struct Theme {
    inner: Option<Arc<ThemeInner>>,
}

impl Theme {
    /// Returns the theme for stderr.
    pub fn stderr() -> &'static Theme {
        static THEME: LazyLock<Theme> = LazyLock::new(|| {
            if !tty_stderr() || !can_use_colors() {
                return Theme { inner: None };
            }
            Theme { inner: Some(Arc::new(ThemeInner::default())) }
        });
        &*THEME
    }

    /// Styles the timestamp at the start of a log line.
    pub fn timestamp<T: Display>(&self, data: T) -> Styled<'_, T> {
        let style = self.inner.as_deref().map(|inner| &inner.timestamp);
        Styled { data, style }
    }

    /// Styles a log level. Only errors and warnings stand out.
    pub fn level(&self, level: log::Level) -> Styled<'_, log::Level> {
        let style = self.inner.as_deref().and_then(|inner| match level {
            log::Level::Error => Some(&inner.error),
            log::Level::Warn => Some(&inner.warn),
            _ => None,
        });
        Styled { data: level, style }
    }
}

#[derive(Debug)]
struct ThemeInner {
    timestamp: Style,
    error: Style,
    warn: Style,
}

impl Default for ThemeInner {
    fn default() -> ThemeInner {
        ThemeInner {
            timestamp: Style::new()
                .bold()
                .fg_color(Some(AnsiColor::Magenta.into())),
            error: Style::new().bold().fg_color(Some(AnsiColor::Red.into())),
            warn: Style::new().fg_color(Some(AnsiColor::Yellow.into())),
        }
    }
}

/// A possibly unstyled piece of renderable data.
#[derive(Clone, Debug)]
pub struct Styled<'s, T> {
    data: T,
    style: Option<&'s Style>,
}

impl<'s, T: Display> Display for Styled<'s, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let Some(style) = self.style else {
            return self.data.fmt(f);
        };
        write!(f, "{style}{}{style:#}", self.data)
    }
}

fn tty_stderr() -> bool {
    static YES: LazyLock<bool> =
        LazyLock::new(|| std::io::stderr().is_terminal());
    *YES
}

/// Whether colors have been disabled with `NO_COLOR` or `TERM=dumb`.
fn can_use_colors() -> bool {
    static YES: LazyLock<bool> = LazyLock::new(|| {
        if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            return false;
        }
        std::env::var_os("TERM").is_none_or(|v| v != "dumb")
    });
    *YES
}
