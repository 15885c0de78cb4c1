//! Node kind identifiers.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{WorkflowError, WorkflowResult};

/// Closed set of node kinds known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    /// Text entered by the user when the workflow runs.
    Input,
    /// Language-model completion.
    Llm,
    /// Result display.
    Output,
}

impl NodeKind {
    /// Parses a kind string, reporting unknown kinds as
    /// [`WorkflowError::UnknownKind`].
    pub fn parse(kind: &str) -> WorkflowResult<Self> {
        kind.parse()
            .map_err(|_| WorkflowError::UnknownKind(kind.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_names() {
        assert_eq!(NodeKind::parse("llm").unwrap(), NodeKind::Llm);
        assert_eq!(NodeKind::Input.to_string(), "input");
    }

    #[test]
    fn unknown_kind_is_reported() {
        let err = NodeKind::parse("webhook").unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownKind(kind) if kind == "webhook"));
    }
}
