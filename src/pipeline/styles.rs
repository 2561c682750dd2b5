//! CSS injected ahead of the caller's HTML.
//!
//! Two blocks may be prepended:
//!
//! 1. **Break control** (always): `break-inside` for every element and,
//!    separately, for images, so operators can keep paragraphs or pictures
//!    from being split across pages.
//! 2. **Background** (optional): stretches `html`/`body` over the full page
//!    and paints a vertically repeating background image.
//!
//! Each block is prepended in turn, so the one inserted last comes first:
//! the background block precedes the break-control block.

use crate::settings::PdfSettings;

fn break_value(avoid: bool) -> &'static str {
    if avoid {
        "avoid"
    } else {
        "auto"
    }
}

/// The page-break control block.
pub fn break_control_block(avoid_text_break: bool, avoid_image_break: bool) -> String {
    format!(
        "<style>\n\
         \t* {{\n\
         \t\tbreak-inside: {text};\n\
         \t}}\n\
         \n\
         \timg {{\n\
         \t\tbreak-inside: {image};\n\
         \t}}\n\
         </style>\n",
        text = break_value(avoid_text_break),
        image = break_value(avoid_image_break),
    )
}

/// The full-page background block for `image_url`.
pub fn background_block(image_url: &str) -> String {
    format!(
        "<style>\n\
         \thtml {{\n\
         \t\twidth: 100%;\n\
         \t\theight: 100%;\n\
         \t\tmargin: 0;\n\
         \t\tpadding: 0;\n\
         \t}}\n\
         \n\
         \tbody {{\n\
         \t\twidth: 100%;\n\
         \t\theight: 100%;\n\
         \t\tmargin: 0;\n\
         \t\tpadding: 0;\n\
         \t\tbackground-image: url('{url}');\n\
         \t\tbackground-size: cover;\n\
         \t\tbackground-repeat: repeat-y;\n\
         \t\tbackground-position: top left;\n\
         \t}}\n\
         </style>\n",
        url = escape_css_url(image_url),
    )
}

/// Keep the URL inside its single-quoted `url('…')` and its `<style>` element.
///
/// Angle brackets and double quotes are percent-encoded, so a URL cannot
/// close the style element and start markup of its own.
fn escape_css_url(url: &str) -> String {
    url.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('<', "%3C")
        .replace('>', "%3E")
        .replace('"', "%22")
        .replace(['\n', '\r'], "")
}

/// Prepend the style blocks to `html`.
///
/// `background` is the already-looked-up image URL; blank means none.
pub fn inject(html: &str, settings: &PdfSettings, background: Option<&str>) -> String {
    let mut output = String::with_capacity(html.len() + 512);
    let background = background.filter(|url| !url.trim().is_empty());

    if let Some(url) = background {
        output.push_str(&background_block(url));
    }
    output.push_str(&break_control_block(
        settings.avoid_text_break,
        settings.avoid_image_break,
    ));
    output.push_str(html);
    output
}
