//! Content-Type detection for uploaded objects.
//!
//! The leading bytes of the file are checked against a table of magic-byte
//! signatures first. When nothing matches (plain text, unknown formats, unreadable
//! files) the extension decides, and `application/octet-stream` is the last resort.
//! Detection never fails.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Number of leading bytes inspected.
const SNIFF_LEN: u64 = 8192;

/// A file format recognised by every `(offset, bytes)` part matching.
struct Signature {
    mime: &'static str,
    parts: &'static [(usize, &'static [u8])],
}

const SIGNATURES: &[Signature] = &[
    // images
    Signature { mime: "image/jpeg", parts: &[(0, b"\xFF\xD8\xFF")] },
    Signature { mime: "image/png", parts: &[(0, b"\x89PNG\r\n\x1A\n")] },
    Signature { mime: "image/gif", parts: &[(0, b"GIF8")] },
    Signature { mime: "image/webp", parts: &[(0, b"RIFF"), (8, b"WEBP")] },
    Signature { mime: "image/tiff", parts: &[(0, b"II*\x00")] },
    Signature { mime: "image/tiff", parts: &[(0, b"MM\x00*")] },
    Signature { mime: "image/vnd.adobe.photoshop", parts: &[(0, b"8BPS")] },
    Signature { mime: "image/vnd.microsoft.icon", parts: &[(0, b"\x00\x00\x01\x00")] },
    Signature { mime: "image/bmp", parts: &[(0, b"BM")] },
    // audio / video
    Signature { mime: "audio/x-wav", parts: &[(0, b"RIFF"), (8, b"WAVE")] },
    Signature { mime: "video/x-msvideo", parts: &[(0, b"RIFF"), (8, b"AVI ")] },
    Signature { mime: "audio/ogg", parts: &[(0, b"OggS")] },
    Signature { mime: "audio/x-flac", parts: &[(0, b"fLaC")] },
    Signature { mime: "audio/mpeg", parts: &[(0, b"ID3")] },
    Signature { mime: "video/mp4", parts: &[(4, b"ftyp")] },
    Signature { mime: "video/x-matroska", parts: &[(0, b"\x1A\x45\xDF\xA3")] },
    // documents and archives
    Signature { mime: "application/pdf", parts: &[(0, b"%PDF")] },
    Signature { mime: "application/zip", parts: &[(0, b"PK\x03\x04")] },
    Signature { mime: "application/gzip", parts: &[(0, b"\x1F\x8B\x08")] },
    Signature { mime: "application/x-bzip2", parts: &[(0, b"BZh")] },
    Signature { mime: "application/x-xz", parts: &[(0, b"\xFD7zXZ\x00")] },
    Signature { mime: "application/zstd", parts: &[(0, b"\x28\xB5\x2F\xFD")] },
    Signature { mime: "application/x-7z-compressed", parts: &[(0, b"7z\xBC\xAF\x27\x1C")] },
    Signature { mime: "application/vnd.rar", parts: &[(0, b"Rar!\x1A\x07")] },
    Signature { mime: "application/x-tar", parts: &[(257, b"ustar")] },
    Signature {
        mime: "application/vnd.debian.binary-package",
        parts: &[(0, b"!<arch>\ndebian-binary")],
    },
    Signature { mime: "application/vnd.sqlite3", parts: &[(0, b"SQLite format 3\x00")] },
    // executables
    Signature { mime: "application/wasm", parts: &[(0, b"\x00asm")] },
    Signature { mime: "application/x-executable", parts: &[(0, b"\x7FELF")] },
    Signature { mime: "application/vnd.microsoft.portable-executable", parts: &[(0, b"MZ")] },
    // fonts
    Signature { mime: "font/woff", parts: &[(0, b"wOFF")] },
    Signature { mime: "font/woff2", parts: &[(0, b"wOF2")] },
    Signature { mime: "font/otf", parts: &[(0, b"OTTO")] },
    Signature { mime: "font/ttf", parts: &[(0, b"\x00\x01\x00\x00\x00")] },
];

impl Signature {
    fn matches(&self, head: &[u8]) -> bool {
        self.parts.iter().all(|(offset, bytes)| {
            head.get(*offset..offset + bytes.len())
                .is_some_and(|window| window == *bytes)
        })
    }
}

/// MIME type for the file at `path`.
pub fn content_type(path: &Path) -> String {
    if let Some(mime) = sniff(path) {
        return mime.to_string();
    }
    match mime_guess::from_path(path).first_raw() {
        Some(mime) => mime.to_string(),
        None => {
            debug!(path = %path.display(), "No content type detected, using octet-stream");
            OCTET_STREAM.to_string()
        }
    }
}

fn sniff(path: &Path) -> Option<&'static str> {
    let file = File::open(path).ok()?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut head).ok()?;
    detect(&head)
}

/// Matches a buffer of leading bytes against the signature table.
pub fn detect(head: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|signature| signature.matches(head))
        .map(|signature| signature.mime)
}
