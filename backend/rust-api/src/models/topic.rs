use serde::{Deserialize, Serialize};

/// Topic as listed by the upstream `topics/subject/{id}` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicPage {
    #[serde(default)]
    pub items: Vec<Topic>,
}
