//! Minimal PresentationML (.pptx) writer.
//!
//! Emits the fixed set of package parts a deck of text slides needs:
//! content types, package relationships, presentation part, one master,
//! one blank layout, a theme, and the slides themselves. Slide content is
//! limited to positioned text boxes, which is all the generated decks use.

use crate::error::{LysarkError, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Slide background color.
const BG_COLOR: &str = "F5F5FF";
/// Title text color.
const TITLE_COLOR: &str = "282828";
/// Subtitle text color.
const SUBTITLE_COLOR: &str = "5A5A5A";
/// Bullet text color.
const BULLET_COLOR: &str = "3C3C3C";
/// Typeface used throughout.
const FONT: &str = "Segoe UI";

/// Title size in centipoints (32pt).
const TITLE_SZ: u32 = 3200;
/// Bullet size in centipoints (20pt).
const BULLET_SZ: u32 = 2000;

// Slide geometry in EMU, 16:9.
const SLIDE_CX: u64 = 12_192_000;
const SLIDE_CY: u64 = 6_858_000;

/// A slide in a deck under construction.
#[derive(Debug, Clone)]
enum Slide {
    Title { title: String, subtitle: String },
    Bullets { title: String, bullets: Vec<String> },
}

/// An in-memory presentation document.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    slides: Vec<Slide>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a title slide.
    pub fn add_title_slide(&mut self, title: &str, subtitle: &str) {
        self.slides.push(Slide::Title {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
        });
    }

    /// Append a bulleted content slide.
    pub fn add_bullet_slide(&mut self, title: &str, bullets: &[String]) {
        self.slides.push(Slide::Bullets {
            title: title.to_string(),
            bullets: bullets.to_vec(),
        });
    }

    /// Number of slides added so far.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Serialize the presentation into `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.slides.is_empty() {
            return Err(LysarkError::Deck(
                "Cannot render a presentation with no slides".to_string(),
            ));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut put = |name: &str, content: String| -> Result<()> {
            zip.start_file(name, options)
                .map_err(|e| LysarkError::Deck(format!("Zip write failed: {}", e)))?;
            zip.write_all(content.as_bytes())?;
            Ok(())
        };

        put("[Content_Types].xml", self.content_types_xml())?;
        put("_rels/.rels", package_rels_xml())?;
        put("docProps/core.xml", core_props_xml())?;
        put("docProps/app.xml", app_props_xml())?;
        put("ppt/presentation.xml", self.presentation_xml())?;
        put("ppt/_rels/presentation.xml.rels", self.presentation_rels_xml())?;
        put("ppt/slideMasters/slideMaster1.xml", slide_master_xml())?;
        put(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            slide_master_rels_xml(),
        )?;
        put("ppt/slideLayouts/slideLayout1.xml", slide_layout_xml())?;
        put(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            slide_layout_rels_xml(),
        )?;
        put("ppt/theme/theme1.xml", theme_xml())?;

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            put(&format!("ppt/slides/slide{}.xml", n), slide_xml(slide))?;
            put(
                &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                slide_rels_xml(),
            )?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| LysarkError::Deck(format!("Zip finalize failed: {}", e)))?;
        Ok(cursor.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut overrides = String::new();
        for i in 1..=self.slides.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>{}</Types>"#,
            overrides
        )
    }

    fn presentation_xml(&self) -> String {
        let mut slide_ids = String::new();
        for i in 0..self.slides.len() {
            slide_ids.push_str(&format!(
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                256 + i,
                i + 2
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            slide_ids, SLIDE_CX, SLIDE_CY
        )
    }

    fn presentation_rels_xml(&self) -> String {
        let mut rels = String::from(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        );
        for i in 0..self.slides.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                i + 2,
                i + 1
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        )
    }
}

/// Escape text for inclusion in XML content.
fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A single-run paragraph with explicit styling.
fn paragraph(text: &str, size: u32, bold: bool, color: &str) -> String {
    format!(
        r#"<a:p><a:pPr><a:buNone/></a:pPr><a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
        size,
        if bold { 1 } else { 0 },
        color,
        FONT,
        xml_escape(text)
    )
}

/// A positioned text box shape.
fn text_box(id: u32, name: &str, x: u64, y: u64, cx: u64, cy: u64, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{}</p:txBody></p:sp>"#,
        id, name, x, y, cx, cy, paragraphs
    )
}

fn slide_xml(slide: &Slide) -> String {
    let shapes = match slide {
        Slide::Title { title, subtitle } => {
            let title_para = paragraph(title, 4000, true, TITLE_COLOR);
            let subtitle_para = paragraph(subtitle, BULLET_SZ, false, SUBTITLE_COLOR);
            format!(
                "{}{}",
                text_box(2, "Title", 838_200, 2_130_425, 10_515_600, 1_325_563, &title_para),
                text_box(3, "Subtitle", 838_200, 3_602_038, 10_515_600, 1_500_188, &subtitle_para),
            )
        }
        Slide::Bullets { title, bullets } => {
            let title_para = paragraph(title, TITLE_SZ, true, TITLE_COLOR);
            let body: String = bullets
                .iter()
                .map(|b| paragraph(&format!("\u{2022} {}", b), BULLET_SZ, false, BULLET_COLOR))
                .collect();
            format!(
                "{}{}",
                text_box(2, "Title", 838_200, 365_125, 10_515_600, 1_325_563, &title_para),
                text_box(3, "Body", 838_200, 1_825_625, 10_515_600, 4_351_338, &body),
            )
        }
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        BG_COLOR, shapes
    )
}

fn slide_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#
        .to_string()
}

fn package_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#
        .to_string()
}

fn core_props_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Lysark Presentation</dc:title><dc:creator>lysark</dc:creator></cp:coreProperties>"#
        .to_string()
}

fn app_props_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>lysark</Application></Properties>"#
        .to_string()
}

fn slide_master_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        BG_COLOR
    )
}

fn slide_master_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#
        .to_string()
}

fn slide_layout_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
        .to_string()
}

fn slide_layout_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
        .to_string()
}

fn theme_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Lysark"><a:themeElements><a:clrScheme name="Lysark"><a:dk1><a:srgbClr val="{title}"/></a:dk1><a:lt1><a:srgbClr val="{bg}"/></a:lt1><a:dk2><a:srgbClr val="{bullet}"/></a:dk2><a:lt2><a:srgbClr val="FFFFFF"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Lysark"><a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
        title = TITLE_COLOR,
        bg = BG_COLOR,
        bullet = BULLET_COLOR,
        font = FONT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn sample_presentation() -> Presentation {
        let mut prs = Presentation::new();
        prs.add_title_slide("My Deck", "Auto-generated");
        prs.add_bullet_slide("First Topic", &["One.".to_string(), "Two.".to_string()]);
        prs.add_bullet_slide("Second Topic", &["Three.".to_string()]);
        prs
    }

    #[test]
    fn test_empty_presentation_is_an_error() {
        assert!(Presentation::new().to_bytes().is_err());
    }

    #[test]
    fn test_package_has_one_part_per_slide() {
        let bytes = sample_presentation().to_bytes().unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let slide_parts = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .count();
        assert_eq!(slide_parts, 3);
    }

    #[test]
    fn test_presentation_lists_every_slide() {
        let bytes = sample_presentation().to_bytes().unwrap();
        let presentation = read_entry(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"r:id="rId2""#));
        assert!(presentation.contains(r#"r:id="rId4""#));
        assert!(!presentation.contains(r#"r:id="rId5""#));
    }

    #[test]
    fn test_slide_text_is_escaped() {
        let mut prs = Presentation::new();
        prs.add_bullet_slide("Q&A <live>", &["Ask \"anything\".".to_string()]);
        let bytes = prs.to_bytes().unwrap();

        let slide = read_entry(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains("Q&amp;A &lt;live&gt;"));
        assert!(slide.contains("&quot;anything&quot;"));
        assert!(!slide.contains("Q&A"));
    }

    #[test]
    fn test_bullets_are_prefixed() {
        let bytes = sample_presentation().to_bytes().unwrap();
        let slide = read_entry(&bytes, "ppt/slides/slide2.xml");
        assert!(slide.contains("\u{2022} One."));
        assert!(slide.contains("\u{2022} Two."));
    }
}
