//! Field extraction from free-text messages.
//!
//! Sends a fixed instruction pair to the chat model and decodes the reply
//! into the four-field record. The contract is parse-or-fallback: a reply
//! that is not valid JSON becomes an unstructured record carrying the
//! whole reply, and a failed call degrades to the raw user message.
//! Every message yields an extraction; this component never hard-fails.

use std::sync::Arc;

use tracing::{debug, error};

use crate::adapters::ChatModel;
use crate::domain::{ExtractedFields, Extraction};

/// System instruction: four keys, the `-` sentinel, JSON-only output
const SYSTEM_PROMPT: &str = "Ты помощник, который извлекает из сообщения следующие данные: \
'client' (имя отправителя, клиента, проекта или компании, которое может быть ТОЛЬКО на кириллице. \
Ты должен понимать реальные имена людей), \
'description' (описание действия, включающее всю информацию (и ссылки и слова на латинице и кириллице) \
после имени клиента или отправителя, кроме времени и суммы), \
'time_spent' (затраченное время) и 'amount' (сумма в гривнах). \
Ты должен сохранять все символы в 'description', включая латинские буквы, цифры, знаки препинания и ссылки. \
Не опускай никакие части текста. \
Если какой-либо из данных отсутствует, используй '-'. \
Выводи данные только в формате JSON без дополнительного текста.";

/// Field extractor backed by a chat model
pub struct FieldExtractor {
    model: Arc<dyn ChatModel>,
}

impl FieldExtractor {
    /// Create an extractor over the given model handle
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn user_prompt(message: &str) -> String {
        format!(
            "Извлеки данные из следующего сообщения: '{}'. \
             Выведи их в формате JSON с ключами 'description', 'client', 'time_spent', 'amount'.",
            message
        )
    }

    /// Extract fields from one message
    pub async fn extract(&self, message: &str) -> Extraction {
        let reply = match self
            .model
            .complete(SYSTEM_PROMPT, &Self::user_prompt(message))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("Model call failed, keeping raw message: {:#}", e);
                return Extraction::Unstructured(message.to_string());
            }
        };

        debug!("Model reply: {}", reply);

        match serde_json::from_str::<ExtractedFields>(&reply) {
            Ok(fields) => Extraction::Structured(fields),
            Err(_) => {
                error!("Model reply is not JSON, keeping it as description");
                Extraction::Unstructured(reply)
            }
        }
    }
}
