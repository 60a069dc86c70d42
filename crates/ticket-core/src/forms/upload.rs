//! Reglas de validación de archivos subidos. El almacenamiento del archivo
//! queda fuera del core; aquí sólo se decide si el upload es aceptable.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "docx", "xlsx", "txt", "csv"];

/// Archivo recibido en un envío: nombre original y tamaño en bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub name: String,
    pub size: u64,
}

impl Upload {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size }
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRules {
    pub max_bytes: u64,
    /// Empty list accepts any extension.
    pub allowed_extensions: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
               allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect() }
    }
}

impl FileRules {
    pub fn validate(&self, upload: &Upload) -> Result<(), String> {
        if upload.size == 0 {
            return Err("The submitted file is empty.".to_string());
        }
        if upload.size > self.max_bytes {
            return Err(format!("File too large ({} bytes, limit {} bytes).", upload.size, self.max_bytes));
        }
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }
        match upload.extension() {
            Some(ext) if self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
            Some(ext) => Err(format!("File type not allowed: .{ext}")),
            None => Err("File type not allowed: missing extension".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_oversize_and_unknown_extension() {
        let rules = FileRules { max_bytes: 100,
                                allowed_extensions: vec!["pdf".into()] };
        assert!(rules.validate(&Upload::new("a.pdf", 0)).is_err());
        assert!(rules.validate(&Upload::new("a.pdf", 101)).is_err());
        assert!(rules.validate(&Upload::new("a.exe", 10)).is_err());
        assert!(rules.validate(&Upload::new("noext", 10)).is_err());
        assert!(rules.validate(&Upload::new("A.PDF", 10)).is_ok());
    }

    #[test]
    fn empty_extension_list_accepts_anything() {
        let rules = FileRules { max_bytes: 10,
                                allowed_extensions: vec![] };
        assert!(rules.validate(&Upload::new("blob", 1)).is_ok());
    }
}
