//! Low-level TypeScript text emission.
//!
//! Everything that decides how a character sequence is spelled in the
//! generated source lives here: string literals, property keys, doc comments,
//! and indentation.

use super::naming::is_plain_property;

/// Text style shared by every emitter of one synthesis pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub indent_width: usize,
    pub single_quote: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            indent_width: 2,
            single_quote: true,
        }
    }
}

impl Style {
    fn quote(&self) -> char {
        if self.single_quote {
            '\''
        } else {
            '"'
        }
    }

    /// Spells `value` as a string literal in the configured quote style.
    pub fn string_literal(&self, value: &str) -> String {
        let quote = self.quote();
        let mut out = String::with_capacity(value.len() + 2);
        out.push(quote);
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c == quote => {
                    out.push('\\');
                    out.push(c);
                }
                c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
                c => out.push(c),
            }
        }
        out.push(quote);
        out
    }

    /// Spells an object key, quoting it only when it is not a plain identifier.
    pub fn property_key(&self, key: &str) -> String {
        if is_plain_property(key) {
            key.to_string()
        } else {
            self.string_literal(key)
        }
    }
}

/// Line-oriented source builder.
#[derive(Debug)]
pub struct Emitter {
    indent: String,
    out: String,
}

impl Emitter {
    pub fn new(style: &Style) -> Self {
        Self {
            indent: " ".repeat(style.indent_width),
            out: String::new(),
        }
    }

    /// Appends one line at `depth` indentation levels.
    pub fn line(&mut self, depth: usize, text: &str) {
        if !text.is_empty() {
            for _ in 0..depth {
                self.out.push_str(&self.indent);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Appends a `/** ... */` comment. A single line stays on one line.
    pub fn doc(&mut self, depth: usize, lines: &[String]) {
        let lines: Vec<String> = lines.iter().map(|l| escape_comment(l)).collect();
        match lines.as_slice() {
            [] => {}
            [only] => self.line(depth, &format!("/** {} */", only)),
            many => {
                self.line(depth, "/**");
                for l in many {
                    if l.is_empty() {
                        self.line(depth, " *");
                    } else {
                        self.line(depth, &format!(" * {}", l));
                    }
                }
                self.line(depth, " */");
            }
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Keeps comment text from closing the comment early.
fn escape_comment(text: &str) -> String {
    text.replace("*/", "*\\/")
}

/// Splits free text into trimmed comment lines, dropping trailing blanks.
pub fn comment_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    lines
}
