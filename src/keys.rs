//! Object key parsing and derived-key expansion.
//!
//! An original photo stored at `{directory}{base_name}.{extension}` has its
//! resized variants stored in the resized bucket at
//! `{directory}{base_name}{size_prefix}.{format}` for every combination of
//! [`SIZE_PREFIXES`] and [`FORMATS`].  Keys are treated as opaque strings:
//! percent-encoded keys are matched exactly as they were written.

/// Size variant suffixes appended to the base name of a resized photo.
pub const SIZE_PREFIXES: [&str; 4] = ["_small", "_small@2x", "_large", "_large@2x"];

/// Encoded formats each size variant is written in.
pub const FORMATS: [&str; 3] = ["avif", "webp", "jpeg"];

/// Number of derived keys produced for every original photo.
pub const DERIVED_KEY_COUNT: usize = SIZE_PREFIXES.len() * FORMATS.len();

/// An object key split into its directory, base name and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Key prefix up to and including the final `/` (may be empty).
    pub directory: String,
    /// Final path segment without its extension (may be empty).
    pub base_name: String,
    /// Text after the last `.` of the final path segment.
    pub extension: String,
}

impl ParsedKey {
    /// Final path segment, extension included.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name, self.extension)
    }

    /// The original object key this was parsed from.
    pub fn object_key(&self) -> String {
        format!("{}{}", self.directory, self.file_name())
    }
}

/// Result of parsing an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParse {
    /// The key names a file.
    File(ParsedKey),
    /// The final path segment has no extension, so the key is most likely
    /// a directory placeholder.
    NotAFile,
}

/// Split `key` into directory, base name and extension.
///
/// Only the final path segment is inspected for an extension, so
/// `uploads/` and `albums.2023/cover` are both [`KeyParse::NotAFile`].
pub fn parse_key(key: &str) -> KeyParse {
    let split = key.rfind('/').map_or(0, |idx| idx + 1);
    let (directory, file_name) = key.split_at(split);

    match file_name.rsplit_once('.') {
        Some((base_name, extension)) => KeyParse::File(ParsedKey {
            directory: directory.to_string(),
            base_name: base_name.to_string(),
            extension: extension.to_string(),
        }),
        None => KeyParse::NotAFile,
    }
}

/// Every resized-bucket key derived from `parsed`.
///
/// Size prefixes form the outer loop and formats the inner loop.  The set
/// is produced whether or not the objects exist.
pub fn derived_keys(parsed: &ParsedKey) -> Vec<String> {
    SIZE_PREFIXES
        .iter()
        .flat_map(|prefix| {
            FORMATS.iter().map(move |format| {
                format!(
                    "{}{}{}.{}",
                    parsed.directory, parsed.base_name, prefix, format
                )
            })
        })
        .collect()
}
