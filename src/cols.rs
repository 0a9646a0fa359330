//! Side-by-side hex dumps of two buffers.
//!
//! Rows that are equal in both buffers are shown for a short while and then
//! folded into a single `...` line until the next difference.

use std::io::Write;

use crate::{
    cancel::CancelToken,
    err::{Error, Result},
    palette::Palette,
    util::{is_printable, printable_or_dot},
};

/// Equal rows shown before folding.
pub const DUMP_CONTEXT: i32 = 2;

/// Terminals wider than this get 16 bytes per row.
const WIDE_TERMINAL: u16 = 112;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColumnStyle {
    /// Hex pairs followed by printable characters
    #[default]
    Hex,
    /// hexII: blanks for 0x00, `##` for 0xff, `.c` for printables
    HexII,
}

/// Bytes per row that fit the current terminal.
pub fn auto_width() -> usize {
    match crossterm::terminal::size() {
        Ok((columns, _)) if columns > WIDE_TERMINAL => 16,
        _ => 8,
    }
}

fn hexii(byte: u8) -> String {
    match byte {
        0x00 => "  ".to_string(),
        0xff => "##".to_string(),
        b if is_printable(b) => format!(".{}", b as char),
        b => format!("{:02x}", b),
    }
}

pub struct Columns<'c> {
    width: usize,
    style: ColumnStyle,
    palette: Palette,
    cancel: Option<&'c CancelToken>,
}

impl<'c> Columns<'c> {
    pub fn new(width: usize, style: ColumnStyle, palette: Palette) -> Result<Self> {
        if width != 8 && width != 16 {
            return Err(Error::ColumnWidth(width));
        }
        Ok(Self {
            width,
            style,
            palette,
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, cancel: &'c CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn header(&self) -> String {
        let digits: String = (0..self.width).map(|i| format!("{:X} ", i)).collect();
        let chars: String = (0..self.width).map(|i| format!("{:X}", i)).collect();
        format!(
            "  offset     {}{}    {}{}",
            digits, chars, digits, chars
        )
    }

    /// Renders `this` byte by byte, coloring each against `other` when the
    /// row differs.
    fn cells(&self, this: &[u8], other: &[u8], differs: bool, cell: impl Fn(u8) -> String) -> String {
        this.iter()
            .zip(other)
            .map(|(a, b)| {
                let text = cell(*a);
                match (differs, a == b) {
                    (false, _) => text,
                    (true, true) => self.palette.green(&text),
                    (true, false) => self.palette.red(&text),
                }
            })
            .collect()
    }

    fn row(&self, offset: usize, a: &[u8], b: &[u8], pad: usize) -> String {
        let differs = a != b;
        let head = format!("0x{:08x}{} ", offset, if differs { '!' } else { ' ' });
        let mut line = if differs {
            self.palette.red(&head)
        } else {
            self.palette.green(&head)
        };
        match self.style {
            ColumnStyle::Hex => {
                let hex = |x: u8| format!("{:02x}", x);
                let text = |x: u8| printable_or_dot(x).to_string();
                line += &self.cells(a, b, differs, hex);
                line += &"  ".repeat(pad);
                line += " ";
                line += &self.cells(a, b, differs, text);
                line += &" ".repeat(pad);
                line += "   ";
                line += &self.cells(b, a, differs, hex);
                line += &"  ".repeat(pad);
                line += " ";
                line += &self.cells(b, a, differs, text);
            }
            ColumnStyle::HexII => {
                line += &self.cells(a, b, differs, hexii);
                line += &"  ".repeat(pad);
                line += "   ";
                line += &self.cells(b, a, differs, hexii);
                line += &"  ".repeat(pad);
            }
        }
        line
    }

    /// Dumps the common prefix of `a` and `b`. A trailing `...` marks a length
    /// mismatch. Returns `false` if the dump was cancelled.
    pub fn render(&self, a: &[u8], b: &[u8], out: &mut dyn Write) -> Result<bool> {
        let size = a.len().min(b.len());
        let mut ctx = DUMP_CONTEXT;
        let mut completed = true;

        if self.style == ColumnStyle::Hex {
            writeln!(out, "{}", self.header())?;
        }
        for start in (0..size).step_by(self.width) {
            if self.cancel.is_some_and(|c| c.is_cancelled()) {
                log::info!("column dump cancelled at {:#x}", start);
                completed = false;
                break;
            }
            let end = (start + self.width).min(size);
            let (ca, cb) = (&a[start..end], &b[start..end]);
            if ca == cb {
                ctx -= 1;
                if ctx == -1 {
                    writeln!(out, "...")?;
                    continue;
                }
                if ctx < 0 {
                    ctx = -1;
                    continue;
                }
            } else {
                ctx = DUMP_CONTEXT;
            }
            let pad = self.width - (end - start);
            writeln!(out, "{}", self.row(start, ca, cb, pad))?;
        }
        writeln!(out)?;
        if a.len() != b.len() {
            writeln!(out, "...")?;
        }
        out.flush()?;
        Ok(completed)
    }
}
