//! Letter rendering pipeline.
//!
//! [`LetterGenerator`] turns a [`LetterData`] record into a PDF file:
//!
//! 1. required fields are checked before any work is done,
//! 2. the template is loaded (once per generator),
//! 3. labels are resolved for the effective language,
//! 4. the body is formatted,
//! 5. the logo and signature are inlined,
//! 6. everything is merged into one flat record and bound to the template,
//! 7. the markup is printed on a fresh rendering surface, which is always released,
//! 8. the bytes are written to the target path atomically.

use crate::assets::inline_asset;
use crate::body::format_body;
use crate::filename::derive_filename;
use crate::labels::labels;
use crate::pdf::{PdfOptions, PdfOverrides};
use crate::renderer::{print_to_pdf, PdfRenderer};
use crate::template::{TemplateRecord, TemplateStore};
use crate::{LetterError, LetterResult};
use letterpdf_types::{BodyFormat, Language, LetterData};
use minijinja::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-call configuration. Letter fields take precedence over these fallbacks.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub body_format: Option<BodyFormat>,
    pub language: Option<Language>,
    pub pdf: PdfOverrides,
}

pub struct LetterGenerator {
    templates: TemplateStore,
    renderer: Arc<dyn PdfRenderer>,
}

impl std::fmt::Debug for LetterGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LetterGenerator")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl LetterGenerator {
    pub fn new(templates: TemplateStore, renderer: Arc<dyn PdfRenderer>) -> Self {
        Self {
            templates,
            renderer,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Builds the final letter markup without rendering it.
    ///
    /// # Errors
    ///
    /// - `LetterError::MissingFields` if patientName, date or body is absent or blank.
    /// - Template errors if the template cannot be loaded or bound.
    pub fn compose(&self, data: &LetterData, options: &RenderOptions) -> LetterResult<String> {
        let missing = data.missing_fields();
        if !missing.is_empty() {
            return Err(LetterError::MissingFields(missing));
        }

        self.templates.load()?;

        let record = build_record(data, options);
        self.templates.bind(&record)
    }

    /// Renders `data` to a PDF at `output`.
    ///
    /// Nothing is written unless the whole render succeeds; an existing file at `output` is
    /// replaced only by a complete document.
    pub async fn render(
        &self,
        data: &LetterData,
        output: &Path,
        options: &RenderOptions,
    ) -> LetterResult<()> {
        let html = self.compose(data, options)?;
        let pdf_options = PdfOptions::default().merged(&options.pdf);

        let bytes = print_to_pdf(self.renderer.as_ref(), &html, &pdf_options).await?;
        write_atomically(output, &bytes)?;

        tracing::info!("PDF generated successfully: {}", output.display());
        Ok(())
    }

    /// Reads a letter from a JSON file and renders it.
    ///
    /// When `output` is `None` the filename is derived from the letter and placed in the
    /// current directory. Returns the path written.
    pub async fn generate_from_file(
        &self,
        json_path: &Path,
        output: Option<&Path>,
        options: &RenderOptions,
    ) -> LetterResult<PathBuf> {
        self.generate_from_file_in(json_path, output, Path::new(""), options)
            .await
    }

    /// Like [`generate_from_file`](Self::generate_from_file), but a derived filename is
    /// placed in `base_dir`.
    pub async fn generate_from_file_in(
        &self,
        json_path: &Path,
        output: Option<&Path>,
        base_dir: &Path,
        options: &RenderOptions,
    ) -> LetterResult<PathBuf> {
        let data = read_letter(json_path)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.join(derive_filename(&data)));

        self.render(&data, &output, options).await?;
        Ok(output)
    }
}

/// Reads and parses a letter JSON document.
pub fn read_letter(json_path: &Path) -> LetterResult<LetterData> {
    let contents =
        std::fs::read_to_string(json_path).map_err(|source| LetterError::LetterDataRead {
            path: json_path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Merges letter fields, labels, the formatted body and inlined images into the flat record
/// the template sees.
fn build_record(data: &LetterData, options: &RenderOptions) -> TemplateRecord {
    let mut record = TemplateRecord::new();

    // Extra keys go in first so the known fields below always win.
    for (key, value) in &data.extra {
        match value {
            serde_json::Value::String(s) => {
                record.insert(key.clone(), Value::from(s.as_str()));
            }
            serde_json::Value::Number(n) => {
                record.insert(key.clone(), Value::from(n.to_string()));
            }
            serde_json::Value::Bool(b) => {
                record.insert(key.clone(), Value::from(b.to_string()));
            }
            serde_json::Value::Null => {
                record.insert(key.clone(), Value::from(""));
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                tracing::debug!("dropping nested letter field {:?} from template record", key);
            }
        }
    }

    let text = |value: &Option<String>| Value::from(value.as_deref().unwrap_or_default());
    record.insert("patientName".into(), text(&data.patient_name));
    record.insert("patientDOB".into(), text(&data.patient_dob));
    record.insert("date".into(), text(&data.date));
    record.insert("senderName".into(), text(&data.sender_name));
    record.insert("senderTitle".into(), text(&data.sender_title));

    let language = data
        .declared_language()
        .or(options.language)
        .unwrap_or_default();
    let labels = labels(language);
    record.insert("language".into(), Value::from(language.code()));
    record.insert(
        "patientNameLabel".into(),
        Value::from(labels.patient_name_label),
    );
    record.insert(
        "patientDOBLabel".into(),
        Value::from(labels.patient_dob_label),
    );

    let body_format = data
        .body_format
        .or(options.body_format)
        .unwrap_or_default();
    let body = format_body(data.body.as_deref().unwrap_or_default(), body_format);
    record.insert("bodyFormat".into(), Value::from(body_format.tag()));
    record.insert("body".into(), Value::from_safe_string(body));

    let logo = inline_asset(data.logo_path.as_deref());
    let signature = inline_asset(data.signature_image_path.as_deref());
    record.insert(
        "logoPath".into(),
        Value::from_safe_string(logo.as_template_value().to_owned()),
    );
    record.insert(
        "signatureImagePath".into(),
        Value::from_safe_string(signature.as_template_value().to_owned()),
    );

    record
}

/// Writes `bytes` to a temporary sibling of `output` and renames it into place.
fn write_atomically(output: &Path, bytes: &[u8]) -> LetterResult<()> {
    let write_err = |source| LetterError::OutputWrite {
        path: output.to_path_buf(),
        source,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(output).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::renderer::testing::{FailAt, FakeRenderer};
    use crate::renderer::RenderError;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<html lang=\"{{ language }}\"><body>\
{% if logoPath %}<img class=\"logo\" src=\"{{ logoPath }}\">{% endif %}\
<p>{{ patientNameLabel }}: {{ patientName }}</p>\
{% if patientDOB %}<p>{{ patientDOBLabel }}: {{ patientDOB }}</p>{% endif %}\
<p class=\"date\">{{ date }}</p>\
<main>{{ body }}</main>\
{% if signatureImagePath %}<img class=\"signature\" src=\"{{ signatureImagePath }}\">{% endif %}\
<p>{{ senderName }}</p><p>{{ senderTitle }}</p>{{ clinic }}\
</body></html>";

    struct Fixture {
        dir: TempDir,
        renderer: Arc<FakeRenderer>,
        generator: LetterGenerator,
    }

    fn fixture(fail_at: FailAt) -> Fixture {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("letter.html");
        fs::write(&template_path, TEMPLATE).unwrap();

        let renderer = Arc::new(FakeRenderer::new(fail_at));
        let generator = LetterGenerator::new(TemplateStore::new(template_path), renderer.clone());
        Fixture {
            dir,
            renderer,
            generator,
        }
    }

    fn letter() -> LetterData {
        LetterData {
            patient_name: Some("Jane Doe".into()),
            date: Some("01/02/2024".into()),
            body: Some("First paragraph\n\nSecond paragraph".into()),
            sender_name: Some("Dr. Example".into()),
            ..Default::default()
        }
    }

    #[test]
    fn compose_binds_labels_body_and_sender() {
        let f = fixture(FailAt::Nothing);
        let html = f.generator.compose(&letter(), &RenderOptions::default()).unwrap();

        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("Patient Name: Jane Doe"));
        assert!(html.contains("<main><p>First paragraph</p>\n<p>Second paragraph</p></main>"));
        assert!(html.contains("<p>Dr. Example</p>"));
        assert!(!html.contains("Date of Birth"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn letter_fields_take_precedence_over_options() {
        let f = fixture(FailAt::Nothing);
        let options = RenderOptions {
            body_format: Some(BodyFormat::Html),
            language: Some(Language::Es),
            ..Default::default()
        };

        let mut data = letter();
        data.body = Some("**bold**".into());
        data.body_format = Some(BodyFormat::Markdown);
        data.language = Some("en".into());
        let html = f.generator.compose(&data, &options).unwrap();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("Patient Name"));

        let fallback = f.generator.compose(&letter(), &options).unwrap();
        assert!(fallback.contains("Nombre del Paciente: Jane Doe"));
        assert!(fallback.contains("<main>First paragraph\n\nSecond paragraph</main>"));
    }

    #[test]
    fn missing_images_do_not_abort_and_present_images_are_inlined() {
        let f = fixture(FailAt::Nothing);
        let signature = f.dir.path().join("signature.svg");
        fs::write(&signature, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        let mut data = letter();
        data.logo_path = Some(f.dir.path().join("missing.png").display().to_string());
        data.signature_image_path = Some(format!("file://{}", signature.display()));

        let html = f.generator.compose(&data, &RenderOptions::default()).unwrap();
        assert!(!html.contains("class=\"logo\""));
        assert!(html.contains("class=\"signature\" src=\"data:image/svg+xml;base64,"));
    }

    #[test]
    fn extra_scalar_fields_reach_the_template() {
        let f = fixture(FailAt::Nothing);
        let mut data = letter();
        data.extra
            .insert("clinic".into(), serde_json::json!("North <Wing>"));
        data.extra
            .insert("patientName".into(), serde_json::json!("Impostor"));

        let html = f.generator.compose(&data, &RenderOptions::default()).unwrap();
        assert!(html.contains("North &lt;Wing&gt;"));
        assert!(html.contains("Jane Doe"));
        assert!(!html.contains("Impostor"));
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_rendering() {
        let f = fixture(FailAt::Nothing);
        let data = LetterData {
            patient_name: Some("Jane Doe".into()),
            ..Default::default()
        };
        let output = f.dir.path().join("out.pdf");

        let err = f
            .generator
            .render(&data, &output, &RenderOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(&err, LetterError::MissingFields(fields) if fields == &vec!["date", "body"]));
        assert_eq!(err.kind(), ErrorKind::InputMalformed);
        assert_eq!(f.renderer.opened(), 0);
        assert!(!f.generator.templates().is_loaded());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn missing_template_fails_without_opening_renderer() {
        let renderer = Arc::new(FakeRenderer::new(FailAt::Nothing));
        let generator =
            LetterGenerator::new(TemplateStore::new("/no/such/letter.html"), renderer.clone());
        let dir = TempDir::new().unwrap();

        let err = generator
            .render(&letter(), &dir.path().join("out.pdf"), &RenderOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigurationFatal);
        assert_eq!(renderer.opened(), 0);
    }

    #[tokio::test]
    async fn render_writes_pdf_with_default_page_setup() {
        let f = fixture(FailAt::Nothing);
        let output = f.dir.path().join("nested").join("letter.pdf");

        f.generator
            .render(&letter(), &output, &RenderOptions::default())
            .await
            .unwrap();

        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(f.renderer.released(), 1);
        assert_eq!(f.renderer.last_options(), Some(PdfOptions::default()));
    }

    #[tokio::test]
    async fn pdf_overrides_are_merged_per_call() {
        let f = fixture(FailAt::Nothing);
        let options = RenderOptions {
            pdf: PdfOverrides {
                landscape: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };

        f.generator
            .render(&letter(), &f.dir.path().join("a.pdf"), &options)
            .await
            .unwrap();

        let printed = f.renderer.last_options().unwrap();
        assert!(printed.landscape);
        assert!(printed.print_background);
        assert_eq!(printed.margin, PdfOptions::default().margin);
    }

    #[tokio::test]
    async fn print_failure_releases_surface_and_leaves_no_file() {
        let f = fixture(FailAt::Print);
        let output = f.dir.path().join("letter.pdf");

        let err = f
            .generator
            .render(&letter(), &output, &RenderOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LetterError::Render(RenderError::Print(_))));
        assert_eq!(err.kind(), ErrorKind::RenderEngineFailure);
        assert_eq!(f.renderer.released(), 1);
        assert!(!output.exists());
        // No stray temporary files either.
        let leftovers: Vec<_> = fs::read_dir(f.dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name() != "letter.html")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn repeated_renders_are_identical() {
        let f = fixture(FailAt::Nothing);
        let first = f.dir.path().join("first.pdf");
        let second = f.dir.path().join("second.pdf");

        f.generator
            .render(&letter(), &first, &RenderOptions::default())
            .await
            .unwrap();
        f.generator
            .render(&letter(), &second, &RenderOptions::default())
            .await
            .unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
        assert_eq!(f.renderer.opened(), 2);
        assert_eq!(f.renderer.released(), 2);
    }

    #[tokio::test]
    async fn html_letter_with_logo_from_file_gets_derived_report_name() {
        let f = fixture(FailAt::Nothing);
        let logo = f.dir.path().join("logo.png");
        fs::write(&logo, [0x89, b'P', b'N', b'G']).unwrap();

        let mut data = letter();
        data.body = Some("<p>Rich <b>text</b></p>".into());
        data.body_format = Some(BodyFormat::Html);
        data.language = Some("en".into());
        data.logo_path = Some(logo.display().to_string());
        let json_path = f.dir.path().join("letter.json");
        fs::write(&json_path, serde_json::to_string(&data).unwrap()).unwrap();

        let out_dir = f.dir.path().join("letters");
        let written = f
            .generator
            .generate_from_file_in(&json_path, None, &out_dir, &RenderOptions::default())
            .await
            .unwrap();

        assert_eq!(written, out_dir.join("REPORT_JANE_DOE_01.02.2024.pdf"));
        assert!(written.is_file());
        assert!(fs::metadata(&written).unwrap().len() > 0);
        let html = f.renderer.last_html().unwrap();
        assert!(html.contains("<main><p>Rich <b>text</b></p></main>"));
        assert!(html.contains("src=\"data:image/png;base64,"));
    }

    #[tokio::test]
    async fn malformed_json_is_input_error() {
        let f = fixture(FailAt::Nothing);
        let json_path = f.dir.path().join("broken.json");
        fs::write(&json_path, "{ not json").unwrap();

        let err = f
            .generator
            .generate_from_file(&json_path, None, &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LetterError::LetterDataParse(_)));
        assert_eq!(err.kind(), ErrorKind::InputMalformed);

        let missing = f
            .generator
            .generate_from_file(&f.dir.path().join("nope.json"), None, &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(missing, LetterError::LetterDataRead { .. }));
    }
}
