use crate::records::ZapRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render_json(records: &[ZapRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_text(records: &[ZapRecord]) -> Vec<u8> {
    let mut out = String::new();
    for r in records {
        out.push_str(&r.pseudo);
        out.push_str(" :: styles=");
        out.push_str(&r.styles.join(","));
        out.push_str(" instruments=");
        out.push_str(&r.instruments.join(","));
        out.push_str(" roles=");
        out.push_str(&r.roles.join(","));
        out.push('\n');
    }
    out.into_bytes()
}
