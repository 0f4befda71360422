use serde::{Deserialize, Serialize};

/// Secondary panels a block can expand below its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Details,
    Documentation,
    Testing,
    Execution,
    SyntaxErrors,
}

/// Open/closed flags for every panel of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
    pub is_details_open: bool,
    pub is_documentation_open: bool,
    pub is_testing_open: bool,
    pub is_execution_open: bool,
    pub is_syntax_errors_open: bool,
    /// Number of rows listed by the syntax-error panel.
    pub syntax_error_count: usize,
}

impl PanelState {
    pub fn is_open(&self, panel: PanelKind) -> bool {
        match panel {
            PanelKind::Details => self.is_details_open,
            PanelKind::Documentation => self.is_documentation_open,
            PanelKind::Testing => self.is_testing_open,
            PanelKind::Execution => self.is_execution_open,
            PanelKind::SyntaxErrors => self.is_syntax_errors_open,
        }
    }

    pub fn set_open(&mut self, panel: PanelKind, open: bool) {
        match panel {
            PanelKind::Details => self.is_details_open = open,
            PanelKind::Documentation => self.is_documentation_open = open,
            PanelKind::Testing => self.is_testing_open = open,
            PanelKind::Execution => self.is_execution_open = open,
            PanelKind::SyntaxErrors => self.is_syntax_errors_open = open,
        }
    }

    pub fn any_open(&self) -> bool {
        self.is_details_open
            || self.is_documentation_open
            || self.is_testing_open
            || self.is_execution_open
            || self.is_syntax_errors_open
    }
}
