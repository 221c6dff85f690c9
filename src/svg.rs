//! Renders the ASCII-art lines into a standalone SVG so the README can
//! embed the artwork without shipping a raster file.

const START_Y: i32 = 30;
const LINE_HEIGHT: i32 = 20;
const LEFT_PADDING: f32 = 15.0;
const RIGHT_PADDING: f32 = 30.0;
const CHAR_WIDTH: f32 = 9.6;

const BG: &str = "#161b22";
const TEXT: &str = "#c9d1d9";

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn build_tspans(lines: &[String]) -> (String, usize) {
    let mut out = String::new();
    let mut max_width = 0;

    for (i, line) in lines.iter().enumerate() {
        let y = START_Y + (i as i32) * LINE_HEIGHT;
        max_width = max_width.max(line.len());
        out.push_str(&format!(
            "<tspan x=\"{LEFT_PADDING}\" y=\"{y}\">{}</tspan>\n",
            escape_xml(line)
        ));
    }

    (out, max_width)
}

/// Render ASCII lines as a monospace SVG image.
pub fn render(lines: &[String]) -> String {
    let (tspans, chars_wide) = build_tspans(lines);
    let w = chars_wide as f32 * CHAR_WIDTH + LEFT_PADDING + RIGHT_PADDING;
    let h = lines.len() as f32 * LINE_HEIGHT as f32 + START_Y as f32;

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}px" height="{h}px"
     font-family="ConsolasFallback,Consolas,monospace"
     font-size="16px">

<rect width="{w}px" height="{h}px" fill="{BG}" rx="15"/>

<text fill="{TEXT}" xml:space="preserve">
{tspans}
</text>

</svg>
"#
    )
}
