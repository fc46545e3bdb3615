use async_trait::async_trait;
use colored::Colorize;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::human_input::types::{HumanInputHandler, HumanInputRequest, HumanInputResponse};

/// A console-based human input handler that displays prompts and collects input via the terminal
#[derive(Debug, Clone)]
pub struct ConsoleInputHandler {
    /// Whether to use colored output
    colored_output: bool,

    /// Access mutex to coordinate multiple requests
    access_mutex: Arc<Mutex<()>>,
}

impl Default for ConsoleInputHandler {
    fn default() -> Self {
        Self {
            colored_output: true,
            access_mutex: Arc::new(Mutex::new(())),
        }
    }
}

impl ConsoleInputHandler {
    /// Create a new console input handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new console input handler with colored output disabled
    pub fn without_color() -> Self {
        Self {
            colored_output: false,
            ..Self::default()
        }
    }

    /// Format a request for display
    fn format_prompt(&self, request: &HumanInputRequest) -> String {
        let mut prompt_text = String::new();

        let header = format!("DECISION NEEDED: case {}", request.case_id);
        if self.colored_output {
            prompt_text.push_str(&format!("{}\n", header.bold().blue()));
        } else {
            prompt_text.push_str(&format!("{}\n", header));
        }
        prompt_text.push_str(&format!("{}\n", "─".repeat(50)));

        if self.colored_output {
            prompt_text.push_str(&format!("{}\n", request.prompt.bold()));
        } else {
            prompt_text.push_str(&format!("{}\n", request.prompt));
        }

        for (index, action) in request.actions.iter().enumerate() {
            let line = format!("  [{}] {} ({})", index + 1, action.label, action.value);
            let line = if !self.colored_output {
                line
            } else {
                match action.style.as_str() {
                    "primary" => line.green().to_string(),
                    "danger" => line.red().to_string(),
                    _ => line,
                }
            };
            prompt_text.push_str(&line);
            prompt_text.push('\n');
        }

        if let Some(timeout_seconds) = request.timeout_seconds {
            let note = format!("Timeout: {} seconds", timeout_seconds);
            if self.colored_output {
                prompt_text.push_str(&format!("\n{}", note.yellow()));
            } else {
                prompt_text.push_str(&format!("\n{}", note));
            }
        }

        prompt_text
    }

    fn print_cursor(&self) -> Result<()> {
        if self.colored_output {
            print!("{} ", ">".green().bold());
        } else {
            print!("> ");
        }
        io::stdout().flush()?;
        Ok(())
    }

    /// Prompt until the input names one of the request's actions
    async fn collect_input(&self, request: &HumanInputRequest) -> Result<String> {
        let _lock = self.access_mutex.lock().await;

        println!("\n{}", self.format_prompt(request));

        loop {
            self.print_cursor()?;
            let line = self.read_line().await?;
            match request.resolve(&line) {
                Some(value) => return Ok(value),
                None if line.is_empty() => continue,
                None => {
                    let message = format!("'{}' is not one of the offered actions", line);
                    if self.colored_output {
                        println!("{}", message.red());
                    } else {
                        println!("{}", message);
                    }
                }
            }
        }
    }

    /// Read a line from stdin
    async fn read_line(&self) -> Result<String> {
        let line = tokio::task::spawn_blocking(|| {
            let mut input = String::new();
            io::stdin().read_line(&mut input).map(|read| (read, input))
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))??;

        match line {
            (0, _) => Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while waiting for a decision",
            ))),
            (_, input) => Ok(input.trim().to_string()),
        }
    }
}

#[async_trait]
impl HumanInputHandler for ConsoleInputHandler {
    async fn handle_request(&self, request: HumanInputRequest) -> Result<HumanInputResponse> {
        info!(
            "Processing human input request: id={}, prompt={}",
            request.request_id, request.prompt
        );

        let collected = match request.timeout() {
            Some(limit) => match timeout(limit, self.collect_input(&request)).await {
                Ok(result) => result,
                Err(_) => {
                    if self.colored_output {
                        println!("\n{}", "Timeout waiting for input".red().bold());
                    } else {
                        println!("\nTimeout waiting for input");
                    }
                    Err(Error::Io(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no response received within timeout period",
                    )))
                }
            },
            None => self.collect_input(&request).await,
        };

        match collected {
            Ok(response) => {
                debug!("Received human input response: {}", response);
                Ok(HumanInputResponse::new(request.request_id, response))
            }
            Err(e) => {
                error!("Error collecting human input: {}", e);
                Err(e)
            }
        }
    }
}

/// Answers requests from a fixed list of decisions, in order
#[derive(Debug, Default)]
pub struct ScriptedInputHandler {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedInputHandler {
    /// Handler answering with `answers`
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    /// Answers not yet given
    pub async fn remaining(&self) -> usize {
        self.answers.lock().await.len()
    }
}

#[async_trait]
impl HumanInputHandler for ScriptedInputHandler {
    async fn handle_request(&self, request: HumanInputRequest) -> Result<HumanInputResponse> {
        let answer = self.answers.lock().await.pop_front().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer left for {}", request.request_id),
            ))
        })?;

        let response = match request.resolve(&answer) {
            Some(value) => value,
            None => {
                warn!(
                    "Scripted answer '{}' matches no action of {}, sending as is",
                    answer, request.request_id
                );
                answer
            }
        };
        Ok(HumanInputResponse::new(request.request_id, response))
    }
}
