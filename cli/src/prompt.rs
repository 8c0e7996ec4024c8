//! Interactive yes/no prompting, injectable so non-interactive callers can
//! answer deterministically.
use std::io::{self, BufRead, Write};

/// A source of yes/no answers.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt: Send + Sync {
    /// Ask `message` and return `true` for yes, `false` for no.
    ///
    /// Implementations must keep asking until a recognised answer is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read (e.g. stdin closed).
    fn ask_yes_no(&self, message: &str) -> io::Result<bool>;
}

/// Prompts on the controlling terminal (stdin/stdout).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask_yes_no(&self, message: &str) -> io::Result<bool> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        ask_yes_no_with(&mut input, &mut output, message)
    }
}

/// Answers every question the same way without reading input (`--yes`).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn ask_yes_no(&self, _message: &str) -> io::Result<bool> {
        Ok(self.0)
    }
}

/// Write `message`, then read lines from `input` until one is a recognised
/// answer. Unrecognised input re-prompts; it never defaults to either answer.
///
/// # Errors
///
/// Returns an error if reading or writing fails, or `UnexpectedEof` when the
/// input ends before an answer is given.
pub fn ask_yes_no_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> io::Result<bool> {
    write!(output, "{message} (y/n): ")?;
    output.flush()?;

    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a y/n answer was given",
            ));
        }
        if let Some(answer) = parse_answer(&line) {
            return Ok(answer);
        }
        write!(output, "invalid input, please pick (y/n): ")?;
        output.flush()?;
    }
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
