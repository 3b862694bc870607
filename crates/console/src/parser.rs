//! Console line tokenizer.
//!
//! A line is a command name followed by flags: `name --flag=v1,v2 --switch`.
//! Bare tokens after a flag extend that flag's values, so
//! `areOwners --addresses=0xaa 0xbb` keeps both addresses under one flag.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("expected a command before '{0}'")]
    MissingCommand(String),
    #[error("'{0}' is not a valid command name")]
    InvalidCommand(String),
    #[error("'{0}' is not a valid flag")]
    InvalidFlag(String),
    #[error("value '{0}' must follow a --flag")]
    UnexpectedValue(String),
}

/// Shape of a command's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityGroup {
    /// No arguments, or only identifier-style values such as aliases.
    Identifier = 0,
    /// At least one value is typed: a `0x` hex literal or an integer.
    Typed = 1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub flag: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub priority_group: PriorityGroup,
    pub arguments: Vec<Argument>,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ParseError::Empty)?;
        if name.starts_with('-') {
            return Err(ParseError::MissingCommand(name.to_string()));
        }
        if !is_identifier(name) {
            return Err(ParseError::InvalidCommand(name.to_string()));
        }

        let mut arguments: Vec<Argument> = Vec::new();
        for token in tokens {
            if let Some(flag_token) = token.strip_prefix("--") {
                let (flag, raw_values) = match flag_token.split_once('=') {
                    Some((flag, values)) => (flag, values),
                    None => (flag_token, ""),
                };
                if !is_flag_name(flag) {
                    return Err(ParseError::InvalidFlag(token.to_string()));
                }
                arguments.push(Argument {
                    flag: flag.to_string(),
                    values: split_values(raw_values),
                });
            } else {
                let argument = arguments
                    .last_mut()
                    .ok_or_else(|| ParseError::UnexpectedValue(token.to_string()))?;
                argument.values.extend(split_values(token));
            }
        }

        let priority_group = if arguments
            .iter()
            .flat_map(|argument| argument.values.iter())
            .any(|value| is_typed_value(value))
        {
            PriorityGroup::Typed
        } else {
            PriorityGroup::Identifier
        };

        Ok(Self {
            name: name.to_string(),
            priority_group,
            arguments,
        })
    }

    pub fn is_typed(&self) -> bool {
        self.priority_group == PriorityGroup::Typed
    }

    /// First value of the argument at `index`, regardless of its flag name.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.arguments
            .get(index)
            .and_then(|argument| argument.values.first())
            .map(String::as_str)
    }

    pub fn flag(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|argument| argument.flag == name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flag(name).is_some()
    }

    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.flag(name)
            .and_then(|argument| argument.values.first())
            .map(String::as_str)
    }

    /// Every value in the order it was supplied.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .flat_map(|argument| argument.values.iter().map(String::as_str))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for argument in &self.arguments {
            write!(f, " --{}", argument.flag)?;
            if !argument.values.is_empty() {
                write!(f, "={}", argument.values.join(","))?;
            }
        }
        Ok(())
    }
}

fn split_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_flag_name(flag: &str) -> bool {
    let mut chars = flag.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn is_typed_value(value: &str) -> bool {
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod tests;
