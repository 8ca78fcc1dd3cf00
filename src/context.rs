use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Student details supplied by the caller alongside a query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentContext {
    /// `name` and `grade` stay raw JSON; callers send strings and numbers.
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub grade: Option<Value>,
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl StudentContext {
    /// Parses the optional context argument. Anything that is not a JSON
    /// object of the expected shape yields `None`.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match serde_json::from_str::<Self>(raw) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                warn!(error = %err, raw_len = raw.len(), "ignoring malformed student context");
                None
            }
        }
    }

    pub fn render_block(&self) -> String {
        format!(
            "### Current Student Context:\n- Name: {}\n- Grade: {}\n- Enrolled Subjects: {}",
            display_field(self.name.as_ref()),
            display_field(self.grade.as_ref()),
            self.subjects.join(", ")
        )
    }
}

fn display_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => "None".to_string(),
        Some(other) => other.to_string(),
    }
}
