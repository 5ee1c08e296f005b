use std::ffi::{OsStr, OsString};

use bstr::{BStr, ByteSlice};

/// The `FromStr` analog for `&[u8]`.
pub trait FromBytes: Sized {
    type Err;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Err>;
}

/// Adds `parse` to byte slices, in the manner of `str::parse`.
pub trait BytesExt {
    // `as_bytes` would conflict with the `bstr` method of the same name.
    fn as_byte_slice(&self) -> &[u8];

    fn parse<T: FromBytes>(&self) -> Result<T, <T as FromBytes>::Err> {
        FromBytes::from_bytes(self.as_byte_slice())
    }
}

impl BytesExt for [u8] {
    fn as_byte_slice(&self) -> &[u8] {
        self
    }
}

/// Conversions from OS strings that report failures through `anyhow`.
pub trait OsStrExt {
    fn as_os_str_slice(&self) -> &OsStr;

    /// Converts this OS string to a byte slice.
    ///
    /// This never fails on Unix. Elsewhere, the OS string must be valid
    /// UTF-8.
    fn to_bytes(&self) -> anyhow::Result<&[u8]> {
        let osstr = self.as_os_str_slice();
        <[u8]>::from_os_str(osstr).ok_or_else(|| {
            anyhow::anyhow!(
                "{osstr:?} is not valid UTF-8 but must be \
                 in non-Unix environments",
            )
        })
    }

    fn parse<T: FromBytes<Err = anyhow::Error>>(&self) -> anyhow::Result<T> {
        FromBytes::from_bytes(self.to_bytes()?)
    }
}

impl OsStrExt for OsStr {
    fn as_os_str_slice(&self) -> &OsStr {
        self
    }
}

impl OsStrExt for OsString {
    fn as_os_str_slice(&self) -> &OsStr {
        self.as_os_str()
    }
}

/// A line read from a stream, along with its 1-based line number.
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    number: usize,
    full: &'a BStr,
}

impl<'a> Line<'a> {
    pub fn new(number: usize, full: &'a [u8]) -> Line<'a> {
        Line { number, full: full.as_bstr() }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns the line without its `\n` or `\r\n` terminator.
    pub fn content(&self) -> &'a BStr {
        let full: &'a [u8] = self.full.as_bytes();
        let line = full.strip_suffix(b"\n").unwrap_or(full);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        line.as_bstr()
    }
}

/// Line iteration over `std::io::BufRead` with `anyhow` errors.
///
/// `bstr::io` has the same thing, but its closure must return a
/// `std::io::Result`.
pub trait BufReadExt: std::io::BufRead {
    /// Calls `for_each_line` with every line of this reader until it
    /// returns `false`, an error or the reader is exhausted. A final line
    /// without a terminator is still reported.
    fn for_byte_line<F>(&mut self, mut for_each_line: F) -> anyhow::Result<()>
    where
        Self: Sized,
        F: FnMut(Line<'_>) -> anyhow::Result<bool>,
    {
        let mut buf = vec![];
        let mut number = 0;
        loop {
            buf.clear();
            if self.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            number += 1;
            if !for_each_line(Line::new(number, &buf))? {
                return Ok(());
            }
        }
    }
}

impl<B: std::io::BufRead> BufReadExt for B {}
