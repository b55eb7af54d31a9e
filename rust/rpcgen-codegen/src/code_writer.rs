//! Indentation-tracking writer for generated source text.
//!
//! The writer owns its buffer. Indentation is an RAII guard backed by
//! `Rc<Cell<usize>>`, so a live guard never conflicts with further writes.
//!
//! ```
//! use rpcgen_codegen::code_writer::CodeWriter;
//! use rpcgen_codegen::cw_writeln;
//!
//! let mut w = CodeWriter::with_indent_spaces(2);
//! w.block("export interface User", |w| {
//!     cw_writeln!(w, "{}: {}", "id", "number")
//! })
//! .unwrap();
//! assert_eq!(w.finish(), "export interface User {\n  id: number\n}\n");
//! ```

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

pub struct CodeWriter {
    out: String,
    indent_level: Rc<Cell<usize>>,
    indent_string: String,
    at_line_start: bool,
}

impl CodeWriter {
    pub fn new(indent_string: impl Into<String>) -> Self {
        Self {
            out: String::new(),
            indent_level: Rc::new(Cell::new(0)),
            indent_string: indent_string.into(),
            at_line_start: true,
        }
    }

    pub fn with_indent_spaces(spaces: usize) -> Self {
        Self::new(" ".repeat(spaces))
    }

    /// Go style.
    pub fn with_tabs() -> Self {
        Self::new("\t")
    }

    /// Write text without a newline, indenting first if at line start.
    pub fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }
        if self.at_line_start {
            for _ in 0..self.indent_level.get() {
                self.out.write_str(&self.indent_string)?;
            }
            self.at_line_start = false;
        }
        self.out.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// An empty line. Never indented, and never doubled.
    pub fn blank_line(&mut self) -> fmt::Result {
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return Ok(());
        }
        if !self.at_line_start {
            self.out.write_char('\n')?;
        }
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// Indentation increases while the guard is alive.
    pub fn indent(&self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// One comment line per line of `text`. Blank lines keep the bare prefix.
    pub fn doc_comment(&mut self, prefix: &str, text: &str) -> fmt::Result {
        for line in text.lines() {
            if line.trim().is_empty() {
                self.writeln(prefix)?;
            } else {
                self.writeln(&format!("{prefix} {line}"))?;
            }
        }
        Ok(())
    }

    /// `header {`, the indented body, then `}`.
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.block_with(&format!("{header} {{"), "}", body)
    }

    /// Like [`CodeWriter::block`] with explicit opening and closing lines,
    /// for shapes such as `router.get(path, async (req, res) => {` .. `})`.
    pub fn block_with<F>(&mut self, open: &str, close: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.writeln(open)?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln(close)
    }

    pub fn write_separated<I, F>(&mut self, items: I, separator: &str, mut write_item: F) -> fmt::Result
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item) -> fmt::Result,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.write(separator)?;
            }
            write_item(self, item)?;
        }
        Ok(())
    }

    #[doc(hidden)]
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.write(&args.to_string())
    }

    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.writeln(&args.to_string())
    }

    pub fn finish(self) -> String {
        self.out
    }
}

pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.indent_level
            .set(self.indent_level.get().saturating_sub(1));
    }
}

/// `write!` for a [`CodeWriter`].
#[macro_export]
macro_rules! cw_write {
    ($writer:expr, $($arg:tt)*) => {
        $writer.write_fmt(format_args!($($arg)*))
    };
}

/// `writeln!` for a [`CodeWriter`].
#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_indentation() {
        let mut w = CodeWriter::with_indent_spaces(2);
        w.writeln("a").unwrap();
        {
            let _indent = w.indent();
            w.writeln("b").unwrap();
            {
                let _indent = w.indent();
                w.writeln("c").unwrap();
            }
            w.writeln("d").unwrap();
        }
        w.writeln("e").unwrap();
        assert_eq!(w.finish(), "a\n  b\n    c\n  d\ne\n");
    }

    #[test]
    fn tabs_and_custom_close() {
        let mut w = CodeWriter::with_tabs();
        w.block_with("r.Get(\"/x\", func() {", "})", |w| w.writeln("return"))
            .unwrap();
        assert_eq!(w.finish(), "r.Get(\"/x\", func() {\n\treturn\n})\n");
    }

    #[test]
    fn blank_lines_collapse() {
        let mut w = CodeWriter::with_indent_spaces(2);
        w.blank_line().unwrap();
        w.writeln("a").unwrap();
        w.blank_line().unwrap();
        w.blank_line().unwrap();
        w.write("b").unwrap();
        w.blank_line().unwrap();
        w.writeln("c").unwrap();
        assert_eq!(w.finish(), "a\n\nb\n\nc\n");
    }

    #[test]
    fn doc_comment_keeps_blank_lines_bare() {
        let mut w = CodeWriter::with_tabs();
        let _indent = w.indent();
        w.doc_comment("//", "first\n\nsecond").unwrap();
        assert_eq!(w.finish(), "\t// first\n\t//\n\t// second\n");
    }

    #[test]
    fn separated_and_macros() {
        let mut w = CodeWriter::with_indent_spaces(4);
        cw_write!(w, "f(").unwrap();
        w.write_separated(["a", "b", "c"], ", ", |w, item| w.write(item))
            .unwrap();
        cw_writeln!(w, ") // {}", 3).unwrap();
        assert_eq!(w.finish(), "f(a, b, c) // 3\n");
    }
}
