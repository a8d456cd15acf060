use super::rank::{SummaryEntry, TOP_GDP_LIMIT, dedup_by_name, rank_top_gdp};
use crate::error::OrbisError;
use chrono::{DateTime, SecondsFormat, Utc};
use resvg::tiny_skia;
use resvg::usvg::{Options, Tree, fontdb::Database};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const CANVAS_WIDTH: u32 = 800;
const CANVAS_HEIGHT: u32 = 600;
const FONT_FAMILY: &str = "DejaVu Sans, Liberation Sans, Arial, sans-serif";

/// What the summary image shows, independent of how it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub total_countries: usize,
    pub refreshed_at: DateTime<Utc>,
    pub top: Vec<SummaryEntry>,
}

impl SummaryView {
    /// Entries are de-duplicated by name before counting and ranking.
    pub fn new(entries: Vec<SummaryEntry>, refreshed_at: DateTime<Utc>) -> Self {
        let unique = dedup_by_name(entries);
        let top = rank_top_gdp(&unique, TOP_GDP_LIMIT);
        Self {
            total_countries: unique.len(),
            refreshed_at,
            top,
        }
    }

    pub fn to_svg(&self) -> String {
        let mut body = String::new();

        let _ = write!(
            body,
            r##"<text x="400" y="56" text-anchor="middle" class="title">Country Summary</text>"##
        );
        let _ = write!(
            body,
            r#"<text x="40" y="120" class="info">Total Countries: {}</text>"#,
            self.total_countries
        );
        let _ = write!(
            body,
            r#"<text x="40" y="156" class="info">Last Refresh: {}</text>"#,
            escape_xml(&self.refreshed_at.to_rfc3339_opts(SecondsFormat::Millis, true))
        );
        let _ = write!(
            body,
            r#"<text x="40" y="220" class="heading">Top {TOP_GDP_LIMIT} GDP Countries:</text>"#
        );
        let _ = write!(
            body,
            r##"<line x1="40" y1="236" x2="760" y2="236" stroke="#555555" stroke-width="1"/>"##
        );

        if self.top.is_empty() {
            let _ = write!(
                body,
                r#"<text x="40" y="276" class="row">No GDP estimates available.</text>"#
            );
        }

        for (i, entry) in self.top.iter().enumerate() {
            let y = 276 + i * 40;
            let _ = write!(
                body,
                r#"<text x="40" y="{y}" class="row">{rank}. {name} - {gdp}</text>"#,
                rank = i + 1,
                name = escape_xml(&entry.name),
                gdp = format_gdp(entry.estimated_gdp),
            );
        }

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}" viewBox="0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}">
<defs>
<linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
<stop offset="0%" stop-color="#222222"/>
<stop offset="100%" stop-color="#333333"/>
</linearGradient>
<style>
text {{ font-family: {FONT_FAMILY}; fill: #ffffff; }}
.title {{ font-size: 32px; font-weight: bold; fill: #00ffcc; }}
.info {{ font-size: 20px; }}
.heading {{ font-size: 22px; font-weight: bold; fill: #00ffcc; }}
.row {{ font-size: 20px; }}
</style>
</defs>
<rect width="100%" height="100%" fill="url(#bg)"/>
{body}
</svg>"##
        )
    }
}

/// Rasterises summary SVGs to PNG.
pub struct SummaryRenderer {
    fontdb: Arc<Database>,
}

impl SummaryRenderer {
    /// Loads system fonts, plus any font files under `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut fontdb = Database::new();
        fontdb.load_system_fonts();
        if let Some(dir) = fonts_dir {
            fontdb.load_fonts_dir(dir);
        }
        debug!("Loaded {} font faces for summary rendering", fontdb.len());
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    pub fn render_png(&self, svg: &str) -> Result<Vec<u8>, OrbisError> {
        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };

        let tree = Tree::from_str(svg, &options)
            .map_err(|e| OrbisError::Render(format!("failed to parse SVG: {e}")))?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| OrbisError::Render("failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| OrbisError::Render(format!("failed to encode PNG: {e}")))
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Two decimals with `,` thousands separators, e.g. `1,234,567.89`.
fn format_gdp(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}
