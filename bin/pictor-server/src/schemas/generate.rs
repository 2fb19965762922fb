use serde::Deserialize;
use validator::Validate;

use crate::schemas::not_blank;

/// Automatic flow: a prompt is synthesized from these two fields.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TopicForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub topic: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub title: String,
}

/// Direct flow: the prompt is used verbatim.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PromptForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub prompt: String,
}
