use thiserror::Error;

use crate::form::{FileSlot, SelectedFile};

pub const HELP: &str = "\
Commands:
  /report <path>   attach an EHR report (PDF); no path clears it
  /xray <path>     attach an X-ray image; no path clears it
  /eye <path>      attach an eye image; no path clears it
  /submit          analyze the current query
  /show            show the form
  /help            show this help
  /quit            exit
Any other line replaces the clinical query.";

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectFile(FileSlot, Option<SelectedFile>),
    Query(String),
    Submit,
    Show,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(command) = line.trim_start().strip_prefix('/') else {
            return Ok(Command::Query(line.to_string()));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command.trim_end(), ""),
        };
        let file = (!arg.is_empty()).then(|| SelectedFile::new(arg));

        match name {
            "report" => Ok(Command::SelectFile(FileSlot::Report, file)),
            "xray" => Ok(Command::SelectFile(FileSlot::XRay, file)),
            "eye" => Ok(Command::SelectFile(FileSlot::EyeImage, file)),
            "submit" => Ok(Command::Submit),
            "show" => Ok(Command::Show),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
