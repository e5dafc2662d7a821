use std::io::{self, BufRead, IsTerminal, Stdin, StdinLock, Stdout, Write};

use console::Term;
use dialoguer::{Confirm, Input};

use crate::archiver::Progress;
use crate::error::MoonError;

/// What a bare Enter means at the "download N images?" question.
pub const CONFIRM_DEFAULT: bool = false;

/// Line-oriented user interaction.
pub trait Console {
    fn input(&mut self, prompt: &str) -> Result<String, MoonError>;

    fn confirm(&mut self, prompt: &str) -> Result<bool, MoonError>;

    fn say(&mut self, message: &str);

    fn progress(&mut self, _label: &str, _progress: Progress) {}
}

/// dialoguer prompts on a real terminal, plain lines otherwise (piped stdin,
/// or stderr redirected to a log file).
pub struct TerminalConsole<R: BufRead, W: Write> {
    input: R,
    output: W,
    interactive: bool,
    show_progress: bool,
    progress_open: bool,
}

impl TerminalConsole<StdinLock<'static>, Stdout> {
    pub fn stdio(show_progress: bool) -> Self {
        let stdin: Stdin = io::stdin();
        let interactive = Term::stderr().is_term() && stdin.is_terminal();
        Self::new(stdin.lock(), io::stdout(), interactive, show_progress)
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W, interactive: bool, show_progress: bool) -> Self {
        Self {
            input,
            output,
            interactive,
            show_progress,
            progress_open: false,
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, MoonError> {
        self.end_progress_line();
        let _ = write!(self.output, "{prompt}: ");
        let _ = self.output.flush();

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| MoonError::io("reading standard input", e))?;
        if read == 0 {
            return Err(MoonError::io(
                "reading standard input",
                io::Error::new(io::ErrorKind::UnexpectedEof, "input ended"),
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn end_progress_line(&mut self) {
        if self.progress_open {
            let _ = writeln!(self.output);
            self.progress_open = false;
        }
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn input(&mut self, prompt: &str) -> Result<String, MoonError> {
        if !self.interactive {
            return self.read_line(prompt);
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, MoonError> {
        if self.interactive {
            return Confirm::new()
                .with_prompt(prompt)
                .default(CONFIRM_DEFAULT)
                .interact()
                .map_err(prompt_error);
        }
        loop {
            let answer = self.read_line(&format!("{prompt} [y/N]"))?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                "" => return Ok(CONFIRM_DEFAULT),
                _ => self.say("Please answer y or n."),
            }
        }
    }

    fn say(&mut self, message: &str) {
        self.end_progress_line();
        let _ = writeln!(self.output, "{message}");
        let _ = self.output.flush();
    }

    fn progress(&mut self, label: &str, progress: Progress) {
        if !self.show_progress {
            return;
        }
        let line = match progress.percent() {
            Some(percent) => format!("{label}: {percent:>3}%"),
            None => format!("{label}: {} KiB", progress.written / 1024),
        };
        let _ = write!(self.output, "\r{line}");
        let _ = self.output.flush();
        self.progress_open = true;
    }
}

// The terminal is in raw mode while prompting, so Ctrl-C arrives as an
// interrupted read rather than a signal.
fn prompt_error(err: dialoguer::Error) -> MoonError {
    match err {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => MoonError::Cancelled,
        dialoguer::Error::IO(e) => MoonError::io("reading from the terminal", e),
    }
}
