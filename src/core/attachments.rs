//! Turning a user turn plus its attachments into wire content.
//!
//! Text files are inlined as fenced blocks after the typed text, files with no
//! readable content are listed by name, and images become separate
//! `image_url` parts next to the merged text.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::api::{ContentPart, ImageUrl, MessageContent};
use crate::core::message::{Attachment, AttachmentPayload};

/// Text-like files larger than this are attached by name only.
pub const MAX_TEXT_ATTACHMENT_BYTES: u64 = 512_000;

const TEXT_EXTENSIONS: &[&str] = &["md", "txt", "json", "csv", "log", "yaml", "yml"];

/// Build the content of one user turn.
pub fn encode_user_content(text: &str, attachments: &[Attachment]) -> MessageContent {
    let mut merged = text.to_string();

    for attachment in attachments {
        if let Some(body) = attachment.text() {
            merged.push_str(&format!(
                "\n\nFile: {}\n\n```\n{}\n```",
                attachment.name, body
            ));
        }
    }

    let nameless: Vec<&Attachment> = attachments
        .iter()
        .filter(|a| a.image_url().is_none() && a.text().is_none())
        .collect();
    if !nameless.is_empty() {
        let listing = nameless
            .iter()
            .map(|a| format!("- {}", a.name))
            .collect::<Vec<_>>()
            .join("\n");
        merged.push_str(&format!("\n\nFiles (no content):\n{listing}"));
    }

    let images: Vec<&str> = attachments.iter().filter_map(Attachment::image_url).collect();
    if images.is_empty() {
        return MessageContent::Text(merged);
    }

    let mut parts = Vec::with_capacity(images.len() + 1);
    if !merged.trim().is_empty() {
        parts.push(ContentPart::Text { text: merged });
    }
    parts.extend(images.into_iter().map(|url| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: url.to_string(),
        },
    }));
    MessageContent::Parts(parts)
}

impl Attachment {
    /// Read a file from disk and classify it.
    pub fn from_path(path: &Path) -> Result<Attachment, Box<dyn Error>> {
        let bytes = fs::read(path)
            .map_err(|err| format!("Could not read {}: {err}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Attachment::from_bytes(name, &bytes))
    }

    /// Classify raw bytes by the MIME type guessed from `name`, falling back
    /// to the image signature when the name says nothing.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Attachment {
        let name = name.into();
        let size = bytes.len() as u64;
        let guessed = guess_mime(&name).or_else(|| sniff_image(bytes));

        let (mime, payload) = match guessed {
            Some(mime) if mime.starts_with("image/") => {
                let data_url = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
                (mime.to_string(), AttachmentPayload::Image { data_url })
            }
            _ if is_text_like(&name, guessed) && size <= MAX_TEXT_ATTACHMENT_BYTES => {
                match std::str::from_utf8(bytes) {
                    Ok(text) => (
                        guessed.unwrap_or("text/plain").to_string(),
                        AttachmentPayload::Text {
                            text: text.to_string(),
                        },
                    ),
                    Err(_) => (
                        guessed.unwrap_or("application/octet-stream").to_string(),
                        AttachmentPayload::Opaque,
                    ),
                }
            }
            _ => (
                guessed.unwrap_or("application/octet-stream").to_string(),
                AttachmentPayload::Opaque,
            ),
        };

        let name = match (&payload, name.is_empty()) {
            (AttachmentPayload::Image { .. }, true) => "image".to_string(),
            (_, true) => "file".to_string(),
            (_, false) => name,
        };

        Attachment {
            id: new_attachment_id(),
            name,
            mime,
            size,
            payload,
        }
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn guess_mime(name: &str) -> Option<&'static str> {
    let mime = match extension(name)?.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn is_text_like(name: &str, mime: Option<&str>) -> bool {
    if mime.is_some_and(|m| m.starts_with("text/")) {
        return true;
    }
    extension(name).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// `<unix millis>_<random hex>`, unique enough to key pending attachments.
fn new_attachment_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut bytes = [0u8; 6];
    match getrandom::fill(&mut bytes) {
        Ok(()) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("{millis}_{hex}")
        }
        Err(_) => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_file(name: &str, text: &str) -> Attachment {
        Attachment {
            id: format!("id-{name}"),
            name: name.into(),
            mime: "text/plain".into(),
            size: text.len() as u64,
            payload: AttachmentPayload::Text { text: text.into() },
        }
    }

    fn opaque_file(name: &str) -> Attachment {
        Attachment {
            id: format!("id-{name}"),
            name: name.into(),
            mime: "application/octet-stream".into(),
            size: 10,
            payload: AttachmentPayload::Opaque,
        }
    }

    fn image(name: &str) -> Attachment {
        Attachment {
            id: format!("id-{name}"),
            name: name.into(),
            mime: "image/png".into(),
            size: 4,
            payload: AttachmentPayload::Image {
                data_url: format!("data:image/png;base64,{name}"),
            },
        }
    }

    #[test]
    fn text_file_is_appended_as_fenced_block() {
        let content = encode_user_content("hi", &[text_file("a.txt", "X")]);
        assert_eq!(
            content,
            MessageContent::Text("hi\n\nFile: a.txt\n\n```\nX\n```".into())
        );
    }

    #[test]
    fn lone_image_yields_single_image_part() {
        let content = encode_user_content("", &[image("cat.png")]);
        match content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 1);
                assert!(matches!(parts[0], ContentPart::ImageUrl { .. }));
            }
            other => panic!("expected parts, got {other:?}"),
        }
    }

    #[test]
    fn opaque_file_alone_is_never_empty() {
        let content = encode_user_content("", &[opaque_file("blob.bin")]);
        let MessageContent::Text(text) = content else {
            panic!("expected text content");
        };
        assert!(!text.trim().is_empty());
        assert_eq!(text, "\n\nFiles (no content):\n- blob.bin");
    }

    #[test]
    fn mixed_attachments_keep_text_part_first_and_images_in_order() {
        let attachments = [
            image("one.png"),
            text_file("notes.md", "body"),
            opaque_file("a.bin"),
            opaque_file("b.bin"),
            image("two.png"),
        ];
        let content = encode_user_content("see", &attachments);
        let MessageContent::Parts(parts) = content else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0],
            ContentPart::Text {
                text: "see\n\nFile: notes.md\n\n```\nbody\n```\n\nFiles (no content):\n- a.bin\n- b.bin"
                    .into()
            }
        );
        let urls: Vec<_> = parts[1..]
            .iter()
            .map(|p| match p {
                ContentPart::ImageUrl { image_url } => image_url.url.as_str(),
                _ => panic!("expected image part"),
            })
            .collect();
        assert_eq!(
            urls,
            ["data:image/png;base64,one.png", "data:image/png;base64,two.png"]
        );
    }

    #[test]
    fn empty_text_file_is_listed_by_name() {
        let content = encode_user_content("x", &[text_file("empty.txt", "")]);
        assert_eq!(
            content,
            MessageContent::Text("x\n\nFiles (no content):\n- empty.txt".into())
        );
    }

    #[test]
    fn plain_text_without_attachments_passes_through() {
        assert_eq!(
            encode_user_content("hello", &[]),
            MessageContent::Text("hello".into())
        );
    }

    #[test]
    fn bytes_are_classified_by_extension() {
        let png = Attachment::from_bytes("shot.PNG", &[0x89, 0x50]);
        assert_eq!(png.mime, "image/png");
        assert_eq!(png.image_url(), Some("data:image/png;base64,iVA="));

        let yaml = Attachment::from_bytes("conf.yml", b"a: 1");
        assert_eq!(yaml.text(), Some("a: 1"));
        assert_eq!(yaml.mime, "application/yaml");

        let binary = Attachment::from_bytes("archive.zip", &[1, 2, 3]);
        assert_eq!(binary.payload, AttachmentPayload::Opaque);
        assert_eq!(binary.size, 3);
    }

    #[test]
    fn unnamed_bytes_are_named_by_kind() {
        let png = Attachment::from_bytes("", b"\x89PNG\r\n\x1a\n\0\0");
        assert_eq!(png.name, "image");
        assert_eq!(png.mime, "image/png");
        assert!(png.image_url().is_some());

        let gif = Attachment::from_bytes("", b"GIF89a...");
        assert_eq!(gif.name, "image");
        assert_eq!(gif.mime, "image/gif");

        let blob = Attachment::from_bytes("", &[1, 2, 3]);
        assert_eq!(blob.name, "file");
        assert_eq!(blob.payload, AttachmentPayload::Opaque);
    }

    #[test]
    fn oversized_or_invalid_text_is_opaque() {
        let big = vec![b'a'; (MAX_TEXT_ATTACHMENT_BYTES + 1) as usize];
        assert_eq!(
            Attachment::from_bytes("big.txt", &big).payload,
            AttachmentPayload::Opaque
        );
        assert_eq!(
            Attachment::from_bytes("bad.txt", &[0xff, 0xfe]).payload,
            AttachmentPayload::Opaque
        );
    }

    #[test]
    fn from_path_reads_file_name_and_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("readme.md");
        fs::write(&path, "# Title").expect("write");
        let attachment = Attachment::from_path(&path).expect("attachment");
        assert_eq!(attachment.name, "readme.md");
        assert_eq!(attachment.text(), Some("# Title"));
        assert!(!attachment.id.is_empty());
    }

    #[test]
    fn from_path_reports_missing_files() {
        let err = Attachment::from_path(Path::new("/definitely/not/here.txt"))
            .expect_err("missing file");
        assert!(err.to_string().contains("Could not read"));
    }
}
