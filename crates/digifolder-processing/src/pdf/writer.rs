use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::font::{encode_win_ansi, FONT_NAME};
use super::layout::{fit_centered, PlacedLine, PAGE_HEIGHT, PAGE_WIDTH};
use crate::error::ConversionResult;
use crate::image::PreparedImage;

const FONT_RESOURCE: &str = "F1";
const IMAGE_RESOURCE: &str = "Im1";

/// Document information dictionary entries.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Builds a PDF one page at a time.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: Option<ObjectId>,
    kids: Vec<Object>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            font_id: None,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => FONT_NAME,
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    fn push_page(&mut self, operations: Vec<Operation>, resources: lopdf::Dictionary) -> ConversionResult<()> {
        let content = Content { operations };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(PAGE_WIDTH), Object::Real(PAGE_HEIGHT)],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Append a page of pre-positioned text lines.
    pub fn add_text_page(&mut self, lines: &[PlacedLine], font_size: f32) -> ConversionResult<()> {
        let font_id = self.font();

        let mut operations = Vec::with_capacity(lines.len() * 4);
        for line in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![FONT_RESOURCE.into(), Object::Real(font_size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(line.x), Object::Real(line.y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(&line.text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let resources = dictionary! {
            "Font" => dictionary! { FONT_RESOURCE => font_id },
        };
        self.push_page(operations, resources)
    }

    /// Append a page holding one JPEG, scaled to fit the margins and centered.
    pub fn add_image_page(&mut self, image: &PreparedImage) -> ConversionResult<()> {
        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg.clone(),
        )
        .with_compression(false);
        let image_id = self.doc.add_object(image_stream);

        let (x, y, width, height) = fit_centered(image.width as f32, image.height as f32);
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    0.into(),
                    0.into(),
                    Object::Real(height),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];

        let resources = dictionary! {
            "XObject" => dictionary! { IMAGE_RESOURCE => image_id },
        };
        self.push_page(operations, resources)
    }

    /// Serialize the document.
    pub fn finish(mut self, info: &DocumentInfo) -> ConversionResult<Vec<u8>> {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => std::mem::take(&mut self.kids),
            "Count" => count,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(&info.title)),
            "Author" => Object::string_literal(encode_win_ansi(&info.author)),
            "Producer" => Object::string_literal("DigiFolder"),
            "CreationDate" => Object::string_literal(
                info.created_at.format("D:%Y%m%d%H%M%SZ").to_string()
            ),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    use crate::image::ImagePreprocessor;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Receipts".to_string(),
            author: "DigiFolder".to_string(),
            created_at: Utc::now(),
        }
    }

    fn jpeg(width: u32, height: u32) -> PreparedImage {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 200, 10]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        ImagePreprocessor::PDF_PAGE.prepare(&png).unwrap()
    }

    #[test]
    fn test_text_page_contains_lines() {
        let mut writer = PdfWriter::new();
        let lines = vec![PlacedLine {
            text: "Hello (world)".to_string(),
            x: 50.0,
            y: 742.0,
        }];
        writer.add_text_page(&lines, 12.0).unwrap();
        let bytes = writer.finish(&info()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let shown: Vec<&Operation> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .collect();
        assert_eq!(shown.len(), 1);
        assert_eq!(
            shown[0].operands[0].as_str().unwrap(),
            b"Hello (world)".as_slice()
        );
    }

    #[test]
    fn test_info_dictionary() {
        let mut writer = PdfWriter::new();
        writer.add_text_page(&[], 12.0).unwrap();
        let bytes = writer.finish(&info()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let info_ref = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let dict = doc.get_dictionary(info_ref).unwrap();
        assert_eq!(dict.get(b"Title").unwrap().as_str().unwrap(), b"Receipts");
        assert_eq!(dict.get(b"Author").unwrap().as_str().unwrap(), b"DigiFolder");
        assert!(dict.has(b"CreationDate"));
    }

    #[test]
    fn test_image_pages_keep_order() {
        let mut writer = PdfWriter::new();
        writer.add_image_page(&jpeg(40, 20)).unwrap();
        writer.add_image_page(&jpeg(20, 40)).unwrap();
        writer.add_image_page(&jpeg(30, 30)).unwrap();
        assert_eq!(writer.page_count(), 3);
        let bytes = writer.finish(&info()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let widths: Vec<i64> = doc
            .get_pages()
            .values()
            .map(|page_id| {
                let page = doc.get_dictionary(*page_id).unwrap();
                let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
                let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
                let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
                let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
                stream.dict.get(b"Width").unwrap().as_i64().unwrap()
            })
            .collect();
        assert_eq!(widths, vec![40, 20, 30]);
    }
}
