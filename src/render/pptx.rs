//! PPTX rendering. A `.pptx` file is a ZIP archive of OOXML parts; the
//! deck is written directly part-by-part, one slide XML per slide, with
//! a single minimal master/layout/theme chain.

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::aspect;
use crate::themes::ThemeConfig;
use crate::types::{Presentation, Slide, SlideType};

pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const EMU_PER_INCH: f64 = 914_400.0;

const FALLBACK_PRIMARY: &str = "2E86AB";
const FALLBACK_TEXT: &str = "2C3E50";
const FALLBACK_BACKGROUND: &str = "FFFFFF";
const FALLBACK_ACCENT: &str = "3498DB";
const FOOTER_COLOR: &str = "666666";

const XMLNS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pptx io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pptx archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Styling resolved per role: an explicit per-presentation value wins,
/// then the active theme's default, then a hard-coded fallback.
#[derive(Debug, Clone)]
struct ResolvedStyle {
    font: String,
    primary: String,
    text: String,
    background: String,
    accent: String,
}

impl ResolvedStyle {
    fn resolve(presentation: &Presentation) -> Self {
        let font = if presentation.font.trim().is_empty() {
            ThemeConfig::font(presentation.theme).to_string()
        } else {
            presentation.font.clone()
        };
        Self {
            font,
            primary: resolve_color(presentation, "primary", FALLBACK_PRIMARY),
            text: resolve_color(presentation, "text", FALLBACK_TEXT),
            background: resolve_color(presentation, "background", FALLBACK_BACKGROUND),
            accent: resolve_color(presentation, "accent", FALLBACK_ACCENT),
        }
    }
}

fn resolve_color(presentation: &Presentation, role: &str, fallback: &str) -> String {
    presentation
        .colors
        .get(role)
        .and_then(|hex| normalize_hex(hex))
        .or_else(|| ThemeConfig::color(presentation.theme, role).and_then(normalize_hex))
        .unwrap_or_else(|| fallback.to_string())
}

/// "#2e86ab" -> "2E86AB". Anything that is not six hex digits is rejected.
fn normalize_hex(hex: &str) -> Option<String> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digits.to_ascii_uppercase())
    } else {
        None
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Main title size steps down as the title gets longer.
fn title_size_pt(title: &str) -> u32 {
    match title.chars().count() {
        0..=30 => 40,
        31..=60 => 34,
        _ => 28,
    }
}

/// Section heading size steps down as the heading gets longer.
fn heading_size_pt(heading: &str) -> u32 {
    match heading.chars().count() {
        0..=30 => 32,
        31..=60 => 28,
        _ => 24,
    }
}

/// Body size steps down as the total body text grows.
fn body_size_pt(total_chars: usize) -> u32 {
    match total_chars {
        0..=200 => 18,
        201..=400 => 14,
        _ => 12,
    }
}

/// Split two-column content on "Column 1:" / "Column 2:" markers.
/// Without markers, items alternate left and right.
fn split_columns(content: &[String]) -> (Vec<String>, Vec<String>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut target = 0usize;
    let mut saw_marker = false;
    for item in content {
        let trimmed = item.trim();
        let lower = trimmed.to_ascii_lowercase();
        let rest = if lower.starts_with("column 1:") {
            saw_marker = true;
            target = 0;
            trimmed["column 1:".len()..].trim()
        } else if lower.starts_with("column 2:") {
            saw_marker = true;
            target = 1;
            trimmed["column 2:".len()..].trim()
        } else {
            trimmed
        };
        if rest.is_empty() {
            continue;
        }
        if target == 0 {
            left.push(rest.to_string());
        } else {
            right.push(rest.to_string());
        }
        if !saw_marker {
            target = 1 - target;
        }
    }
    (left, right)
}

struct Par<'a> {
    text: &'a str,
    size_pt: u32,
    color: &'a str,
    bold: bool,
    italic: bool,
    center: bool,
    bullet: bool,
}

fn par_xml(par: &Par<'_>, font: &str) -> String {
    let algn = if par.center { r#" algn="ctr""# } else { "" };
    let bullet = if par.bullet {
        r#"<a:buFont typeface="Arial"/><a:buChar char="&#8226;"/>"#
    } else {
        "<a:buNone/>"
    };
    let bold = if par.bold { r#" b="1""# } else { "" };
    let italic = if par.italic { r#" i="1""# } else { "" };
    format!(
        concat!(
            "<a:p><a:pPr{algn}>{bullet}</a:pPr>",
            r#"<a:r><a:rPr lang="en-US" sz="{sz}"{bold}{italic} dirty="0">"#,
            r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill>"#,
            r#"<a:latin typeface="{font}"/>"#,
            "</a:rPr><a:t>{text}</a:t></a:r></a:p>"
        ),
        algn = algn,
        bullet = bullet,
        sz = par.size_pt * 100,
        bold = bold,
        italic = italic,
        color = par.color,
        font = xml_escape(font),
        text = xml_escape(par.text),
    )
}

/// One positioned text box. Coordinates and extents are in inches.
fn text_box(id: u32, name: &str, x: f64, y: f64, w: f64, h: f64, paragraphs: &str) -> String {
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/>"#,
            r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
            "{paragraphs}</p:txBody></p:sp>"
        ),
        id = id,
        name = xml_escape(name),
        x = emu(x),
        y = emu(y),
        cx = emu(w),
        cy = emu(h),
        paragraphs = paragraphs,
    )
}

/// Full XML for one slide part, page dimensions in inches.
fn slide_xml(slide: &Slide, style: &ResolvedStyle, page_w: f64, page_h: f64) -> String {
    let mut shapes = String::new();
    let mut next_id = 2u32;
    let mut add_box = |shapes: &mut String, name: &str, x: f64, y: f64, w: f64, h: f64, pars: String| {
        shapes.push_str(&text_box(next_id, name, x, y, w, h, &pars));
        next_id += 1;
    };

    let heading = |size: u32, center: bool| Par {
        text: &slide.title,
        size_pt: size,
        color: &style.primary,
        bold: true,
        italic: false,
        center,
        bullet: false,
    };
    let body_pars = |items: &[String], size: u32| {
        items
            .iter()
            .map(|item| {
                par_xml(
                    &Par {
                        text: item,
                        size_pt: size,
                        color: &style.text,
                        bold: false,
                        italic: false,
                        center: false,
                        bullet: true,
                    },
                    &style.font,
                )
            })
            .collect::<String>()
    };
    let total_chars: usize = slide.content.iter().map(|s| s.chars().count()).sum();

    match slide.slide_type {
        SlideType::Title => {
            let title_par = par_xml(&heading(title_size_pt(&slide.title), true), &style.font);
            add_box(
                &mut shapes,
                "Title",
                0.5,
                page_h * 0.32,
                page_w - 1.0,
                1.5,
                title_par,
            );
            if let Some(subtitle) = slide.content.first() {
                let sub = par_xml(
                    &Par {
                        text: subtitle,
                        size_pt: 18,
                        color: &style.text,
                        bold: false,
                        italic: false,
                        center: true,
                        bullet: false,
                    },
                    &style.font,
                );
                add_box(
                    &mut shapes,
                    "Subtitle",
                    0.5,
                    page_h * 0.32 + 1.6,
                    page_w - 1.0,
                    0.9,
                    sub,
                );
            }
        }
        SlideType::BulletPoints => {
            let head = par_xml(&heading(heading_size_pt(&slide.title), false), &style.font);
            add_box(&mut shapes, "Heading", 0.5, 0.4, page_w - 1.0, 1.1, head);
            let body = body_pars(&slide.content, body_size_pt(total_chars));
            add_box(
                &mut shapes,
                "Body",
                0.5,
                1.7,
                page_w - 1.0,
                page_h - 2.6,
                body,
            );
        }
        SlideType::TwoColumn => {
            let head = par_xml(&heading(heading_size_pt(&slide.title), false), &style.font);
            add_box(&mut shapes, "Heading", 0.5, 0.4, page_w - 1.0, 1.1, head);
            let (left, right) = split_columns(&slide.content);
            let size = body_size_pt(total_chars);
            let col_w = (page_w - 1.5) / 2.0;
            add_box(
                &mut shapes,
                "Left Column",
                0.5,
                1.7,
                col_w,
                page_h - 2.6,
                body_pars(&left, size),
            );
            add_box(
                &mut shapes,
                "Right Column",
                1.0 + col_w,
                1.7,
                col_w,
                page_h - 2.6,
                body_pars(&right, size),
            );
        }
        SlideType::ContentWithImage => {
            let head = par_xml(&heading(heading_size_pt(&slide.title), false), &style.font);
            add_box(&mut shapes, "Heading", 0.5, 0.4, page_w - 1.0, 1.1, head);
            let body = body_pars(&slide.content, body_size_pt(total_chars));
            add_box(
                &mut shapes,
                "Body",
                0.5,
                1.7,
                page_w - 1.0,
                page_h - 4.2,
                body,
            );
            if let Some(ref suggestion) = slide.image_suggestion {
                let label = format!("[Image: {suggestion}]");
                let par = par_xml(
                    &Par {
                        text: &label,
                        size_pt: 12,
                        color: &style.accent,
                        bold: false,
                        italic: true,
                        center: true,
                        bullet: false,
                    },
                    &style.font,
                );
                add_box(
                    &mut shapes,
                    "Image Placeholder",
                    page_w * 0.25,
                    page_h - 2.3,
                    page_w * 0.5,
                    1.0,
                    par,
                );
            }
        }
    }

    if !slide.citations.is_empty() {
        let footer = slide.citations.join("; ");
        let par = par_xml(
            &Par {
                text: &footer,
                size_pt: 10,
                color: FOOTER_COLOR,
                bold: false,
                italic: true,
                center: false,
                bullet: false,
            },
            &style.font,
        );
        add_box(
            &mut shapes,
            "Citations",
            0.5,
            page_h - 0.75,
            page_w - 1.0,
            0.5,
            par,
        );
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "<p:sld {ns}><p:cSld>",
            r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{bg}"/></a:solidFill>"#,
            "<a:effectLst/></p:bgPr></p:bg>",
            r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/>"#,
            "<p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        ns = XMLNS,
        bg = style.background,
        shapes = shapes,
    )
}

fn content_types_xml(slide_count: usize) -> String {
    let mut overrides = String::new();
    for i in 1..=slide_count {
        overrides.push_str(&format!(
            concat!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" "#,
                r#"ContentType="application/vnd.openxmlformats-officedocument"#,
                r#".presentationml.slide+xml"/>"#
            ),
            i
        ));
    }
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            "{overrides}</Types>"
        ),
        overrides = overrides
    )
}

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
    "</Relationships>"
);

fn presentation_xml(slide_count: usize, page_w: f64, page_h: f64) -> String {
    let mut slide_ids = String::new();
    for i in 0..slide_count {
        slide_ids.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            256 + i,
            2 + i
        ));
    }
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "<p:presentation {ns}>",
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            "<p:sldIdLst>{slide_ids}</p:sldIdLst>",
            r#"<p:sldSz cx="{cx}" cy="{cy}"/>"#,
            r#"<p:notesSz cx="6858000" cy="9144000"/>"#,
            "</p:presentation>"
        ),
        ns = XMLNS,
        slide_ids = slide_ids,
        cx = emu(page_w),
        cy = emu(page_h),
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
    ));
    for i in 0..slide_count {
        rels.push_str(&format!(
            concat!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/"#,
                r#"officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#
            ),
            2 + i,
            1 + i
        ));
    }
    rels.push_str("</Relationships>");
    rels
}

fn slide_master_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "<p:sldMaster {ns}><p:cSld><p:spTree>",
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            "<p:grpSpPr/></p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" "#,
            r#"accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" "#,
            r#"accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        ns = XMLNS
    )
}

const SLIDE_MASTER_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>"#,
    "</Relationships>"
);

fn slide_layout_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<p:sldLayout {ns} type="blank"><p:cSld><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            "<p:grpSpPr/></p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        ns = XMLNS
    )
}

const SLIDE_LAYOUT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>"#,
    "</Relationships>"
);

const SLIDE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
    "</Relationships>"
);

fn theme_xml(style: &ResolvedStyle) -> String {
    let font = xml_escape(&style.font);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Deck">"#,
            "<a:themeElements>",
            r#"<a:clrScheme name="Deck">"#,
            r#"<a:dk1><a:srgbClr val="{text}"/></a:dk1>"#,
            r#"<a:lt1><a:srgbClr val="{bg}"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="{text}"/></a:dk2>"#,
            r#"<a:lt2><a:srgbClr val="{bg}"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="{primary}"/></a:accent1>"#,
            r#"<a:accent2><a:srgbClr val="{accent}"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="{accent}"/></a:accent3>"#,
            r#"<a:accent4><a:srgbClr val="{accent}"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="{accent}"/></a:accent5>"#,
            r#"<a:accent6><a:srgbClr val="{accent}"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="{primary}"/></a:hlink>"#,
            r#"<a:folHlink><a:srgbClr val="{accent}"/></a:folHlink>"#,
            "</a:clrScheme>",
            r#"<a:fontScheme name="Deck">"#,
            r#"<a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
            "</a:fontScheme>",
            r#"<a:fmtScheme name="Deck">"#,
            "<a:fillStyleLst>",
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            "</a:fillStyleLst>",
            "<a:lnStyleLst>",
            r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            "</a:lnStyleLst>",
            "<a:effectStyleLst>",
            "<a:effectStyle><a:effectLst/></a:effectStyle>",
            "<a:effectStyle><a:effectLst/></a:effectStyle>",
            "<a:effectStyle><a:effectLst/></a:effectStyle>",
            "</a:effectStyleLst>",
            "<a:bgFillStyleLst>",
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            "</a:bgFillStyleLst>",
            "</a:fmtScheme>",
            "</a:themeElements></a:theme>"
        ),
        text = style.text,
        bg = style.background,
        primary = style.primary,
        accent = style.accent,
        font = font,
    )
}

/// Where a rendered deck lands for a given presentation id.
pub fn output_path(output_dir: &Path, id: &str) -> PathBuf {
    output_dir.join(format!("presentation_{id}.pptx"))
}

/// Render a presentation to `presentation_{id}.pptx` under `output_dir`,
/// creating the directory if needed. Returns the written path.
pub fn render_pptx(presentation: &Presentation, output_dir: &Path) -> Result<PathBuf, RenderError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_path(output_dir, &presentation.id);
    let file = File::create(&path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let style = ResolvedStyle::resolve(presentation);
    let (page_w, page_h) = aspect::page_size(
        presentation.aspect_ratio,
        presentation.custom_width,
        presentation.custom_height,
    );
    let slide_count = presentation.slides.len();

    let write_part = |zip: &mut ZipWriter<File>, name: &str, body: &str| -> Result<(), RenderError> {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
        Ok(())
    };

    write_part(&mut zip, "[Content_Types].xml", &content_types_xml(slide_count))?;
    write_part(&mut zip, "_rels/.rels", ROOT_RELS)?;
    write_part(
        &mut zip,
        "ppt/presentation.xml",
        &presentation_xml(slide_count, page_w, page_h),
    )?;
    write_part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(slide_count),
    )?;
    write_part(&mut zip, "ppt/slideMasters/slideMaster1.xml", &slide_master_xml())?;
    write_part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS,
    )?;
    write_part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", &slide_layout_xml())?;
    write_part(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS,
    )?;
    write_part(&mut zip, "ppt/theme/theme1.xml", &theme_xml(&style))?;

    for (i, slide) in presentation.slides.iter().enumerate() {
        let n = i + 1;
        write_part(
            &mut zip,
            &format!("ppt/slides/slide{n}.xml"),
            &slide_xml(slide, &style, page_w, page_h),
        )?;
        write_part(&mut zip, &format!("ppt/slides/_rels/slide{n}.xml.rels"), SLIDE_RELS)?;
    }

    zip.finish()?;
    Ok(path)
}
