//! Recipient directory loaded from a CSV export.
//!
//! Encoding and delimiter are auto-detected, then rows are mapped onto
//! [`Recipient`] using the `id`, `company` and `email` columns (header
//! matching is case-insensitive; `company_name` and `email_address` are
//! accepted as aliases).

use std::collections::HashSet;
use std::path::Path;

use crate::error::{DirectoryError, DirectoryResult};
use crate::models::Recipient;

const ID_COLUMNS: &[&str] = &["id"];
const COMPANY_COLUMNS: &[&str] = &["company", "company_name"];
const EMAIL_COLUMNS: &[&str] = &["email", "email_address"];

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = b',';
    let mut best_count = 0;

    for sep in [b';', b',', b'\t', b'|'] {
        let count = first_line.bytes().filter(|&b| b == sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// In-memory list of recipients, in file order.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    recipients: Vec<Recipient>,
    /// Detected encoding of the source file
    pub encoding: String,
}

impl RecipientDirectory {
    /// Build a directory from already-parsed recipients.
    pub fn from_recipients(recipients: Vec<Recipient>) -> Self {
        Self {
            recipients,
            encoding: "utf-8".to_string(),
        }
    }

    /// Load a CSV file with auto-detection of encoding and delimiter.
    pub fn load<P: AsRef<Path>>(path: P) -> DirectoryResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Parse CSV bytes with auto-detection of encoding and delimiter.
    pub fn from_bytes(bytes: &[u8]) -> DirectoryResult<Self> {
        let encoding = detect_encoding(bytes);
        let content = decode_content(bytes, &encoding);
        if content.trim().is_empty() {
            return Err(DirectoryError::EmptyFile);
        }

        let delimiter = detect_delimiter(&content);
        let recipients = parse_recipients(&content, delimiter)?;

        Ok(Self { recipients, encoding })
    }

    pub fn all(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.id == id)
    }

    /// Resolve a selection of ids, keeping the caller's order.
    ///
    /// Repeated ids are collapsed; any unknown id fails the whole lookup.
    pub fn select(&self, ids: &[String]) -> DirectoryResult<Vec<Recipient>> {
        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(ids.len());
        let mut unknown = Vec::new();

        for id in ids {
            let id = id.trim();
            if !seen.insert(id) {
                continue;
            }
            match self.get(id) {
                Some(r) => selected.push(r.clone()),
                None => unknown.push(id.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(DirectoryError::UnknownIds(unknown));
        }
        Ok(selected)
    }
}

fn column_index(headers: &[String], names: &'static [&'static str]) -> DirectoryResult<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        .ok_or(DirectoryError::MissingColumn(names[0]))
}

/// Parse CSV text with an explicit delimiter into recipients.
pub fn parse_recipients(content: &str, delimiter: u8) -> DirectoryResult<Vec<Recipient>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DirectoryError::Parse { line: 1, message: e.to_string() })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DirectoryError::EmptyFile);
    }

    let id_idx = column_index(&headers, ID_COLUMNS)?;
    let company_idx = column_index(&headers, COMPANY_COLUMNS)?;
    let email_idx = column_index(&headers, EMAIL_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut recipients = Vec::new();

    for (row_idx, record) in reader.records().enumerate() {
        let line = row_idx + 2; // +1 for 0-index, +1 for header
        let record = record.map_err(|e| DirectoryError::Parse { line, message: e.to_string() })?;

        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let id = field(id_idx);
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id.clone()) {
            return Err(DirectoryError::DuplicateId { id, line });
        }

        recipients.push(Recipient {
            id,
            company: field(company_idx),
            email: field(email_idx),
        });
    }

    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_semicolon_file() {
        let csv = "id;company;email\n1;Acme;jobs@acme.co.za\n2;Globex;hr@globex.com";
        let dir = RecipientDirectory::from_bytes(csv.as_bytes()).unwrap();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.all()[0], Recipient::new("1", "Acme", "jobs@acme.co.za"));
        assert_eq!(dir.get("2").unwrap().company, "Globex");
    }

    #[test]
    fn test_header_aliases_and_case() {
        let csv = "ID,Company_Name,Email_Address,Sector\n10,\"Initech, Ltd\",a@initech.com,IT";
        let dir = RecipientDirectory::from_bytes(csv.as_bytes()).unwrap();

        assert_eq!(dir.all()[0].company, "Initech, Ltd");
        assert_eq!(dir.all()[0].email, "a@initech.com");
    }

    #[test]
    fn test_missing_column() {
        let csv = "id,company\n1,Acme";
        let err = RecipientDirectory::from_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DirectoryError::MissingColumn("email")));
    }

    #[test]
    fn test_duplicate_id_reports_line() {
        let csv = "id,company,email\n1,Acme,a@acme.com\n1,Other,b@other.com";
        let err = RecipientDirectory::from_bytes(csv.as_bytes()).unwrap_err();
        match err {
            DirectoryError::DuplicateId { id, line } => {
                assert_eq!(id, "1");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_ids_and_lines_skipped() {
        let csv = "id,company,email\n1,Acme,a@acme.com\n,Ghost,g@ghost.com\n\n2,Globex,b@globex.com\n";
        let dir = RecipientDirectory::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(
            RecipientDirectory::from_bytes(b"  \n"),
            Err(DirectoryError::EmptyFile)
        ));
    }

    #[test]
    fn test_select_keeps_order_and_reports_unknown() {
        let dir = RecipientDirectory::from_recipients(vec![
            Recipient::new("1", "Acme", "a@acme.com"),
            Recipient::new("2", "Globex", "b@globex.com"),
        ]);

        let picked = dir.select(&["2".into(), "1".into(), "2".into()]).unwrap();
        assert_eq!(picked.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["2", "1"]);

        let err = dir.select(&["1".into(), "42".into()]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown recipient ids: 42");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter("a,b,c"), b',');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("a|b|c"), b'|');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id|company|email").unwrap();
        writeln!(file, "7|Umbrella|careers@umbrella.com").unwrap();

        let dir = RecipientDirectory::load(file.path()).unwrap();
        assert_eq!(dir.get("7").unwrap().email, "careers@umbrella.com");
    }
}
