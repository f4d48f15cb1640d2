//! In-memory `multipart/form-data` bodies.
//!
//! Parts are text; repeated names are allowed and keep their order. The
//! whole body is rendered at once, there is no streaming.

use uuid::Uuid;

use crate::query::json_text;

/// One named part of a form-data body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn file(name: impl Into<String>, filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::text(name, content)
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    boundary: String,
    parts: Vec<FormPart>,
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

impl FormData {
    pub fn new() -> Self {
        Self::with_boundary(format!("--------------------------{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Build from a JSON object.
    ///
    /// Array values append one part per element. An object value carrying
    /// both `value` and `options` becomes a part whose options give the
    /// filename (either the string itself or `options.filename`) and
    /// `options.contentType`. Everything else is stringified.
    pub fn from_json(data: &serde_json::Value) -> Self {
        let mut form = FormData::new();
        let Some(object) = data.as_object() else {
            return form;
        };
        for (name, value) in object {
            match value {
                serde_json::Value::Array(items) => {
                    for item in items {
                        form.append_part(json_part(name, item));
                    }
                }
                other => {
                    form.append_part(json_part(name, other));
                }
            }
        }
        form
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.append_part(FormPart::text(name, value))
    }

    pub fn append_part(&mut self, part: FormPart) -> &mut Self {
        self.parts.push(part);
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Value for the `content-type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> String {
        let mut body = String::new();
        for part in &self.parts {
            body.push_str(&format!("--{}\r\n", self.boundary));
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_param(&part.name)
            ));
            if let Some(filename) = &part.filename {
                body.push_str(&format!("; filename=\"{}\"", escape_param(filename)));
            }
            body.push_str("\r\n");
            if let Some(content_type) = &part.content_type {
                body.push_str(&format!("Content-Type: {}\r\n", content_type.replace(['\r', '\n'], "")));
            }
            body.push_str("\r\n");
            body.push_str(&part.value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", self.boundary));
        body
    }
}

/// Percent-escape `"`, CR, and LF so a quoted header parameter stays intact.
fn escape_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}

fn json_part(name: &str, value: &serde_json::Value) -> FormPart {
    if let (Some(inner), Some(options)) = (value.get("value"), value.get("options")) {
        let mut part = FormPart::text(name, json_text(inner));
        match options {
            serde_json::Value::String(filename) => part.filename = Some(filename.clone()),
            serde_json::Value::Object(options) => {
                part.filename = options.get("filename").and_then(|v| v.as_str()).map(str::to_string);
                part.content_type = options.get("contentType").and_then(|v| v.as_str()).map(str::to_string);
            }
            _ => {}
        }
        return part;
    }
    FormPart::text(name, json_text(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_and_file_parts() {
        let mut form = FormData::with_boundary("XYZ");
        form.append("name", "apple")
            .append_part(FormPart::file("doc", "a.txt", "hello").with_content_type("text/plain"));
        assert_eq!(
            form.encode(),
            "--XYZ\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\napple\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\
             Content-Type: text/plain\r\n\r\nhello\r\n--XYZ--\r\n"
        );
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XYZ");
    }

    #[test]
    fn from_json_expands_arrays_and_options() {
        let form = FormData::from_json(&serde_json::json!({
            "tag": ["a", "b"],
            "count": 2,
            "file": {"value": "data", "options": {"filename": "f.bin", "contentType": "application/octet-stream"}},
            "note": {"value": "n", "options": "n.txt"}
        }));
        let names: Vec<_> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.iter().filter(|n| **n == "tag").count(), 2);

        let count = form.parts().iter().find(|p| p.name == "count").unwrap();
        assert_eq!(count.value, "2");

        let file = form.parts().iter().find(|p| p.name == "file").unwrap();
        assert_eq!(file.filename.as_deref(), Some("f.bin"));
        assert_eq!(file.content_type.as_deref(), Some("application/octet-stream"));

        let note = form.parts().iter().find(|p| p.name == "note").unwrap();
        assert_eq!(note.filename.as_deref(), Some("n.txt"));
    }

    #[test]
    fn quotes_and_line_breaks_in_names_are_escaped() {
        let mut form = FormData::with_boundary("B");
        form.append_part(FormPart::file("a\"b\r\nX-Evil: 1", "q\".txt", "v"));
        let body = form.encode();
        assert!(body.contains(
            "Content-Disposition: form-data; name=\"a%22b%0D%0AX-Evil: 1\"; filename=\"q%22.txt\"\r\n"
        ));
        assert!(!body.contains("\r\nX-Evil"));

        let mut form = FormData::with_boundary("B");
        form.append_part(FormPart::text("k", "v").with_content_type("text/plain\r\nX-Evil: 1"));
        assert!(form.encode().contains("Content-Type: text/plainX-Evil: 1\r\n"));
    }

    #[test]
    fn generated_boundaries_differ() {
        assert_ne!(FormData::new().boundary(), FormData::new().boundary());
    }
}
