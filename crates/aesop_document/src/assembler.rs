//! Story → PDF assembly.

use crate::{IMAGE_PLACEHOLDER, ResolvedImage, fit_rect, resolve_image, wrap_words};
use aesop_core::{DocumentConfig, PageKind, Story, StoryPage};
use aesop_error::{AesopResult, DocumentError, DocumentErrorKind};
use aesop_interface::{ImageFetcher, MediaStore};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, instrument, warn};

// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 56.7;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 28.0;
const SUBTITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const BODY_LEADING: f32 = 16.0;
const IMAGE_TEXT_GAP: f32 = 18.0;
const MAX_IMAGE_HEIGHT: f32 = 360.0;

// Helvetica average glyph advance, as a fraction of the font size. Good
// enough for greedy wrapping of body text.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// Renders a story into a complete PDF byte buffer.
///
/// Read-only with respect to the story's stored state; the caller owns
/// uploading the result and recording its key.
pub struct DocumentAssembler<F, S> {
    fetcher: F,
    store: S,
    config: DocumentConfig,
}

impl<F, S> DocumentAssembler<F, S>
where
    F: ImageFetcher,
    S: MediaStore,
{
    /// Create an assembler from its collaborators and configuration.
    pub fn new(fetcher: F, store: S, config: DocumentConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    /// Assemble the storybook PDF.
    ///
    /// Emits a cover page, then the story's pages ascending by
    /// `page_number`, capped at the configured maximum. Unresolvable images
    /// become placeholders; text that outgrows a page continues on a fresh
    /// one.
    ///
    /// # Errors
    ///
    /// Only PDF serialization itself can fail; every image failure is
    /// absorbed as a placeholder.
    #[instrument(skip(self, story, pages), fields(story_id = %story.id, pages = pages.len()))]
    pub async fn assemble(&self, story: &Story, pages: &[StoryPage]) -> AesopResult<Vec<u8>> {
        let mut ordered: Vec<&StoryPage> = pages
            .iter()
            .filter(|p| p.kind == PageKind::Story)
            .collect();
        ordered.sort_by_key(|p| p.page_number);

        if ordered.len() > self.config.max_story_pages {
            warn!(
                total = ordered.len(),
                cap = self.config.max_story_pages,
                "Story exceeds page cap, truncating document"
            );
            ordered.truncate(self.config.max_story_pages);
        }

        let mut builder = PdfBuilder::new();
        builder.cover(&story.title, &story.cover_subtitle());
        builder.finish_page()?;

        for page in ordered {
            self.render_page(&mut builder, page).await?;
        }

        let bytes = builder.finish()?;
        debug!(bytes = bytes.len(), "Assembled storybook document");
        Ok(bytes)
    }

    async fn render_page(
        &self,
        builder: &mut PdfBuilder,
        page: &StoryPage,
    ) -> AesopResult<()> {
        if let Some(source) = &page.image {
            match resolve_image(source, &self.fetcher, &self.store, &self.config).await {
                Ok(image) => builder.image(&image),
                Err(e) => {
                    warn!(
                        page = page.page_number,
                        error = %e,
                        "Illustration unavailable, emitting placeholder"
                    );
                    builder.body_line(IMAGE_PLACEHOLDER);
                }
            }
        }

        let max_chars = (CONTENT_WIDTH / (BODY_SIZE * AVG_CHAR_WIDTH)).floor() as usize;
        for line in wrap_words(&page.content, max_chars) {
            if !builder.fits_line() {
                builder.finish_page()?;
            }
            builder.body_line(&line);
        }

        builder.finish_page()
    }
}

/// Incremental lopdf document builder: shared font objects, one content
/// stream and optional image XObject per page.
struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_regular: ObjectId,
    font_bold: ObjectId,
    kids: Vec<Object>,
    ops: Vec<Operation>,
    image: Option<ObjectId>,
    cursor_y: f32,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let font_bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        Self {
            doc,
            pages_id,
            font_regular,
            font_bold,
            kids: Vec::new(),
            ops: Vec::new(),
            image: None,
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Lay out the cover: title roughly centered, subtitle beneath.
    fn cover(&mut self, title: &str, subtitle: &str) {
        self.cursor_y = PAGE_HEIGHT * 0.62;
        let title_x = centered_x(title, TITLE_SIZE);
        self.text_line(title, TITLE_SIZE, title_x, true);
        self.cursor_y -= TITLE_SIZE * 1.6;

        let subtitle_x = centered_x(subtitle, SUBTITLE_SIZE);
        self.text_line(subtitle, SUBTITLE_SIZE, subtitle_x, false);
    }

    /// Whether another body line fits above the bottom margin.
    fn fits_line(&self) -> bool {
        self.cursor_y - BODY_LEADING >= MARGIN
    }

    /// Emit one body-text line at the left margin and advance the cursor.
    fn body_line(&mut self, text: &str) {
        self.text_line(text, BODY_SIZE, MARGIN, false);
        self.cursor_y -= BODY_LEADING;
    }

    fn text_line(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { "F2" } else { "F1" };
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![font.into(), Object::Real(size)]));
        self.ops.push(Operation::new(
            "Td",
            vec![Object::Real(x), Object::Real(self.cursor_y)],
        ));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Embed an image at the top of the page, scaled to fit the content
    /// width and the maximum image height, centered horizontally.
    fn image(&mut self, image: &ResolvedImage) {
        let (width_pt, height_pt) = fit_rect(
            image.width,
            image.height,
            CONTENT_WIDTH,
            MAX_IMAGE_HEIGHT,
        );
        if width_pt <= 0.0 || height_pt <= 0.0 {
            return;
        }

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            image.rgb.clone(),
        );
        let image_id = self.doc.add_object(stream);
        self.image = Some(image_id);

        let x = MARGIN + (CONTENT_WIDTH - width_pt) / 2.0;
        let y = self.cursor_y - height_pt;

        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(width_pt),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(height_pt),
                Object::Real(x),
                Object::Real(y),
            ],
        ));
        self.ops.push(Operation::new("Do", vec!["Im0".into()]));
        self.ops.push(Operation::new("Q", vec![]));

        self.cursor_y = y - IMAGE_TEXT_GAP;
    }

    /// Close the current page and start a fresh one.
    fn finish_page(&mut self) -> AesopResult<()> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let encoded = content
            .encode()
            .map_err(|e| DocumentError::new(DocumentErrorKind::PdfWrite(e.to_string())))?;
        let content_id = self
            .doc
            .add_object(Stream::new(lopdf::Dictionary::new(), encoded));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => self.font_regular,
                "F2" => self.font_bold,
            },
        };
        if let Some(image_id) = self.image.take() {
            resources.set("XObject", dictionary! { "Im0" => image_id });
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        });
        self.kids.push(page_id.into());
        self.cursor_y = PAGE_HEIGHT - MARGIN;
        Ok(())
    }

    /// Finalize the page tree and serialize the document.
    fn finish(mut self) -> AesopResult<Vec<u8>> {
        let kids = std::mem::take(&mut self.kids);
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| DocumentError::new(DocumentErrorKind::PdfWrite(e.to_string())))?;
        Ok(bytes)
    }
}

/// Left edge that roughly centers `text` at `size`, clamped to the margin.
fn centered_x(text: &str, size: f32) -> f32 {
    let estimated = text.chars().count() as f32 * size * AVG_CHAR_WIDTH;
    ((PAGE_WIDTH - estimated) / 2.0).max(MARGIN)
}
