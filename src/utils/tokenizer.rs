/// Split a tool option string into arguments.
///
/// Whitespace separates arguments; single or double quotes group text
/// (quotes themselves are dropped). An unterminated quote runs to the end
/// of the input. Adjacent quoted and bare text join into one argument,
/// so `--name="a b"` yields `--name=a b`.
pub fn split_options(input: &str) -> Vec<String> {
    OptionLexer::new(input).collect()
}

/// Find the value following `flag` in an option string, if any
pub fn option_value(input: &str, flag: &str) -> Option<String> {
    let mut args = split_options(input).into_iter();
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
        if let Some(value) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value.to_string());
        }
    }
    None
}

struct OptionLexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> OptionLexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.peek_char().map(|c| c.is_whitespace()).unwrap_or(false) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn read_quoted(&mut self, quote: char, out: &mut String) {
        self.advance();
        let start = self.pos;
        while !self.is_eof() && self.peek_char() != Some(quote) {
            self.advance();
        }
        out.push_str(&self.input[start..self.pos]);
        // closing quote, if present
        self.advance();
    }
}

impl Iterator for OptionLexer<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.skip_whitespace();
        if self.is_eof() {
            return None;
        }

        let mut arg = String::new();
        while let Some(ch) = self.peek_char() {
            match ch {
                '"' | '\'' => self.read_quoted(ch, &mut arg),
                c if c.is_whitespace() => break,
                c => {
                    arg.push(c);
                    self.advance();
                }
            }
        }
        Some(arg)
    }
}
