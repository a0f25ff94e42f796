use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// What an attachment carries. A file is either inlined as an image, read as
/// text, or sent by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPayload {
    /// `data:<mime>;base64,…` URL suitable for an `image_url` part.
    Image { data_url: String },
    /// Decoded contents of a text-like file.
    Text { text: String },
    /// Binary or oversized file; only the name reaches the model.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub payload: AttachmentPayload,
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        match self.payload {
            AttachmentPayload::Image { .. } => AttachmentKind::Image,
            AttachmentPayload::Text { .. } | AttachmentPayload::Opaque => AttachmentKind::File,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Image { data_url } => Some(data_url),
            _ => None,
        }
    }

    /// Decoded text, treating an empty file like an opaque one.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Text { text } if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    /// Short label for transcripts: `🖼️ name` or `📄 name`.
    pub fn label(&self) -> String {
        match self.kind() {
            AttachmentKind::Image => format!("🖼️ {}", self.name),
            AttachmentKind::File if self.text().is_some() => format!("📄 {}", self.name),
            AttachmentKind::File => format!("📄 {} (no content)", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
