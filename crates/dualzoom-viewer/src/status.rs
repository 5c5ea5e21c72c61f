use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual state of a panel's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Pending,
    Success,
    Error,
}

impl StatusClass {
    /// CSS class list applied to the status element.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusClass::Pending => "status",
            StatusClass::Success => "status success",
            StatusClass::Error => "status error",
        }
    }
}

/// The text and style of one panel's status element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusIndicator {
    /// DOM id of the status element.
    pub element_id: String,
    pub text: String,
    pub class: StatusClass,
}

impl StatusIndicator {
    pub fn new(element_id: &str) -> Self {
        Self {
            element_id: element_id.to_string(),
            text: "Loading...".to_string(),
            class: StatusClass::Pending,
        }
    }

    pub fn succeed(&mut self, text: &str) {
        self.text = text.to_string();
        self.class = StatusClass::Success;
    }

    pub fn fail(&mut self, text: &str) {
        self.text = text.to_string();
        self.class = StatusClass::Error;
    }

    pub fn is_settled(&self) -> bool {
        self.class != StatusClass::Pending
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}] {}", self.element_id, self.class.css_class(), self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let mut status = StatusIndicator::new("dzi-status");
        assert_eq!(status.class.css_class(), "status");
        assert!(!status.is_settled());

        status.fail("Failed to load DZI. Check if image processing completed.");
        assert_eq!(status.class.css_class(), "status error");
        assert!(status.is_settled());
        assert_eq!(
            status.to_string(),
            "#dzi-status [status error] Failed to load DZI. Check if image processing completed."
        );
    }
}
