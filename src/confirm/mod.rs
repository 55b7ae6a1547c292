//! Yes/no gates between pipeline stages.

use async_trait::async_trait;

use crate::error::{FusionError, FusionResult};

/// Answers a yes/no question before an irreversible step
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> FusionResult<bool>;
}

/// Non-interactive: every gate is answered yes
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, prompt: &str) -> FusionResult<bool> {
        tracing::info!("{} yes (--yes)", prompt);
        Ok(true)
    }
}

/// Terminal prompt, defaulting to no.
/// The read blocks, so it runs on the blocking pool and the runtime keeps
/// servicing signals while the operator decides.
pub struct Interactive;

#[async_trait]
impl Confirm for Interactive {
    async fn confirm(&self, prompt: &str) -> FusionResult<bool> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await
        .map_err(|e| FusionError::Prompt(format!("prompt task join error: {}", e)))?
        .map_err(|e| FusionError::Prompt(e.to_string()))
    }
}

/// Replays fixed answers and records the prompts it was asked
#[cfg(test)]
pub struct Scripted {
    answers: std::sync::Mutex<std::collections::VecDeque<bool>>,
    asked: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl Scripted {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: std::sync::Mutex::new(answers.iter().copied().collect()),
            asked: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Confirm for Scripted {
    async fn confirm(&self, prompt: &str) -> FusionResult<bool> {
        self.asked.lock().unwrap().push(prompt.to_string());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}
