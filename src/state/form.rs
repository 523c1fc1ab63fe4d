//! Modal input forms (login, new repository, uploads, archive download).

use rp_base::config::DEFAULTS;
use rp_base::types::{ArchiveFormat, NewRepository, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    CreateRepository,
    UploadFile,
    UploadFolder,
    DownloadArchive,
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::Login => "Login",
            FormKind::CreateRepository => "New repository",
            FormKind::UploadFile => "Upload file",
            FormKind::UploadFolder => "Upload folder",
            FormKind::DownloadArchive => "Download archive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text { value: String, secret: bool },
    Toggle(bool),
    Choice { options: Vec<String>, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub value: FieldValue,
}

impl Field {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, value: FieldValue::Text { value: value.into(), secret: false } }
    }

    fn secret(label: &'static str) -> Self {
        Self { label, value: FieldValue::Text { value: String::new(), secret: true } }
    }

    fn toggle(label: &'static str, on: bool) -> Self {
        Self { label, value: FieldValue::Toggle(on) }
    }

    fn choice(label: &'static str, options: Vec<String>, selected: &str) -> Self {
        let index = options.iter().position(|o| o == selected).unwrap_or(0);
        Self { label, value: FieldValue::Choice { options, index } }
    }

    /// Text shown in the form; secrets are masked.
    pub fn display(&self) -> String {
        match &self.value {
            FieldValue::Text { value, secret: true } => "•".repeat(value.chars().count()),
            FieldValue::Text { value, secret: false } => value.clone(),
            FieldValue::Toggle(true) => "[x]".to_string(),
            FieldValue::Toggle(false) => "[ ]".to_string(),
            FieldValue::Choice { options, index } => {
                let current = options.get(*index).map(String::as_str).unwrap_or("");
                format!("< {} >", if current.is_empty() { "(none)" } else { current })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<Field>,
    pub selected: usize,
    pub error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, fields: Vec<Field>) -> Self {
        Self { kind, fields, selected: 0, error: None }
    }

    pub fn login(save_token: bool) -> Self {
        Self::new(FormKind::Login, vec![Field::secret("Token"), Field::toggle("Save token", save_token)])
    }

    pub fn create_repository() -> Self {
        let defaults = &*DEFAULTS;
        Self::new(
            FormKind::CreateRepository,
            vec![
                Field::text("Name", ""),
                Field::text("Description", ""),
                Field::toggle("Private", true),
                Field::toggle("Add README", true),
                Field::choice(".gitignore", defaults.gitignore_templates.clone(), &defaults.default_gitignore),
                Field::choice(
                    "License",
                    defaults.licenses.iter().map(|l| l.label.clone()).collect(),
                    &defaults.default_license,
                ),
            ],
        )
    }

    pub fn upload_file(remote_dir: &str) -> Self {
        Self::new(
            FormKind::UploadFile,
            vec![Field::text("Local file", ""), Field::text("Remote path", remote_prefix(remote_dir))],
        )
    }

    pub fn upload_folder(remote_dir: &str, respect_gitignore: bool) -> Self {
        Self::new(
            FormKind::UploadFolder,
            vec![
                Field::text("Local folder", ""),
                Field::text("Remote base", remote_dir),
                Field::toggle("Honor .gitignore", respect_gitignore),
            ],
        )
    }

    pub fn download_archive(default_dest: &str, format: ArchiveFormat) -> Self {
        let formats = vec!["zipball".to_string(), "tarball".to_string()];
        Self::new(
            FormKind::DownloadArchive,
            vec![Field::choice("Format", formats, format.as_str()), Field::text("Save to", default_dest)],
        )
    }

    // === Editing ===

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let n = self.fields.len().max(1);
        self.selected = (self.selected + n - 1) % n;
    }

    pub fn insert_char(&mut self, c: char) {
        self.error = None;
        if let Some(Field { value: FieldValue::Text { value, .. }, .. }) = self.fields.get_mut(self.selected) {
            value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(Field { value: FieldValue::Text { value, .. }, .. }) = self.fields.get_mut(self.selected) {
            value.pop();
        }
    }

    /// Flip a toggle or step a choice; `forward` is false for Left.
    pub fn cycle(&mut self, forward: bool) {
        match self.fields.get_mut(self.selected).map(|f| &mut f.value) {
            Some(FieldValue::Toggle(on)) => *on = !*on,
            Some(FieldValue::Choice { options, index }) if !options.is_empty() => {
                let n = options.len();
                *index = if forward { (*index + 1) % n } else { (*index + n - 1) % n };
            }
            _ => {}
        }
    }

    /// Whether the selected field takes typed characters.
    pub fn selected_is_text(&self) -> bool {
        matches!(self.fields.get(self.selected).map(|f| &f.value), Some(FieldValue::Text { .. }))
    }

    // === Reading ===

    pub fn text(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .and_then(|f| match &f.value {
                FieldValue::Text { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }

    pub fn toggle(&self, label: &str) -> bool {
        self.fields.iter().find(|f| f.label == label).is_some_and(|f| f.value == FieldValue::Toggle(true))
    }

    pub fn choice(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .and_then(|f| match &f.value {
                FieldValue::Choice { options, index } => options.get(*index).map(String::as_str),
                _ => None,
            })
            .unwrap_or("")
    }

    /// Repository parameters from the create form. Not yet validated.
    pub fn new_repository(&self) -> NewRepository {
        let mut spec = NewRepository::new(self.text("Name").trim());
        spec.description = self.text("Description").trim().to_string();
        spec.visibility = if self.toggle("Private") { Visibility::Private } else { Visibility::Public };
        spec.auto_init = self.toggle("Add README");
        spec.gitignore_template = Some(self.choice(".gitignore").to_string()).filter(|t| !t.is_empty());
        spec.license_template = DEFAULTS.license_key(self.choice("License")).map(str::to_string);
        spec
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        match self.choice("Format") {
            "tarball" => ArchiveFormat::Tarball,
            _ => ArchiveFormat::Zipball,
        }
    }
}

fn remote_prefix(dir: &str) -> String {
    if dir.is_empty() { String::new() } else { format!("{}/", dir) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut Form, s: &str) {
        for c in s.chars() {
            form.insert_char(c);
        }
    }

    #[test]
    fn login_form_masks_token() {
        let mut form = Form::login(true);
        type_str(&mut form, "ghp_abc");
        assert_eq!(form.text("Token"), "ghp_abc");
        assert_eq!(form.fields[0].display(), "•••••••");
        form.next_field();
        form.cycle(true);
        assert!(!form.toggle("Save token"));
    }

    #[test]
    fn create_form_builds_repository_spec() {
        let mut form = Form::create_repository();
        type_str(&mut form, "demo");
        let spec = form.new_repository();
        assert_eq!(spec.name, "demo");
        assert_eq!(spec.visibility, Visibility::Private);
        assert!(spec.auto_init);
        assert_eq!(spec.license_template.as_deref(), Some("mit"));
        assert_eq!(spec.gitignore_template.as_deref(), Some("Rust"));
    }

    #[test]
    fn choices_wrap_both_ways() {
        let mut form = Form::download_archive("demo.zip", ArchiveFormat::Zipball);
        assert_eq!(form.archive_format(), ArchiveFormat::Zipball);
        form.cycle(false);
        assert_eq!(form.archive_format(), ArchiveFormat::Tarball);
        form.cycle(true);
        assert_eq!(form.archive_format(), ArchiveFormat::Zipball);
    }

    #[test]
    fn typing_into_a_toggle_is_ignored() {
        let mut form = Form::upload_folder("uploads", false);
        form.selected = 2;
        assert!(!form.selected_is_text());
        form.insert_char('x');
        assert!(!form.toggle("Honor .gitignore"));
        assert_eq!(form.text("Remote base"), "uploads");
    }
}
