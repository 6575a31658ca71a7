//! Diagnostic messages for configuration checks.
//!
//! Admin configurations are validated at startup (and by `blog check`); each
//! problem is reported as a [`CheckMessage`].
//!
//! ```
//! use backoffice_core::checks::{CheckLevel, CheckMessage};
//!
//! let msg = CheckMessage::error(
//!     "The value of 'list_editable[0]' refers to 'title', which is not in 'list_display'.",
//!     None,
//!     Some("blog.post"),
//!     Some("admin.E122"),
//! );
//! assert_eq!(msg.level, CheckLevel::Error);
//! assert!(msg.is_serious());
//! ```

/// Severity level for a check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckLevel {
    /// Informational message.
    Info = 1,
    /// A potential problem.
    Warning = 2,
    /// A definite problem that should be fixed.
    Error = 3,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A diagnostic message produced by a configuration check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMessage {
    /// The severity level.
    pub level: CheckLevel,
    /// The human-readable message describing the issue.
    pub msg: String,
    /// An optional hint on how to fix the issue.
    pub hint: Option<String>,
    /// The object (model, site) that has the issue.
    pub obj: Option<String>,
    /// A unique identifier for this check message (e.g. "admin.E108").
    pub id: Option<String>,
}

impl CheckMessage {
    /// Creates a new `CheckMessage` with the given level and details.
    pub fn new(
        level: CheckLevel,
        msg: impl Into<String>,
        hint: Option<&str>,
        obj: Option<&str>,
        id: Option<&str>,
    ) -> Self {
        Self {
            level,
            msg: msg.into(),
            hint: hint.map(String::from),
            obj: obj.map(String::from),
            id: id.map(String::from),
        }
    }

    /// Creates a warning-level message.
    pub fn warning(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Warning, msg, hint, obj, id)
    }

    /// Creates an error-level message.
    pub fn error(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Error, msg, hint, obj, id)
    }

    /// Returns `true` if this is a warning or higher severity.
    pub fn is_serious(&self) -> bool {
        self.level >= CheckLevel::Warning
    }
}

impl std::fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref obj) = self.obj {
            write!(f, "{obj}: ")?;
        }
        if let Some(ref id) = self.id {
            write!(f, "({id}) ")?;
        }
        write!(f, "{}: {}", self.level, self.msg)?;
        if let Some(ref hint) = self.hint {
            write!(f, "\n\tHINT: {hint}")?;
        }
        Ok(())
    }
}

/// Returns `true` if any message is an error.
pub fn has_errors(messages: &[CheckMessage]) -> bool {
    messages.iter().any(|m| m.level == CheckLevel::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(CheckLevel::Error > CheckLevel::Warning);
        assert!(CheckLevel::Warning > CheckLevel::Info);
    }

    #[test]
    fn test_display_includes_obj_id_and_hint() {
        let msg = CheckMessage::error("broken", Some("fix it"), Some("blog.post"), Some("admin.E001"));
        let text = msg.to_string();
        assert!(text.starts_with("blog.post: (admin.E001) ERROR: broken"));
        assert!(text.contains("HINT: fix it"));
    }

    #[test]
    fn test_has_errors() {
        let warn = CheckMessage::warning("meh", None, None, None);
        let err = CheckMessage::error("bad", None, None, None);
        assert!(!has_errors(std::slice::from_ref(&warn)));
        assert!(has_errors(&[warn, err]));
    }

    #[test]
    fn test_info_is_not_serious() {
        let info = CheckMessage::new(CheckLevel::Info, "fyi", None, None, None);
        assert!(!info.is_serious());
    }
}
