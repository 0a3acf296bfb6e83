#![allow(dead_code)]

use async_trait::async_trait;
use sql_optimizer::llm::LanguageModel;
use sql_optimizer::AiFailure;
use std::sync::{Arc, Mutex};

/// Language model that returns a canned reply and records every prompt it sees.
pub struct ScriptedModel {
    reply: Result<String, AiFailure>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(failure: AiFailure) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(failure),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiFailure> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}
