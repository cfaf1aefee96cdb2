//! CSS emitted on the login page for Pro settings.

use crate::settings::{LayoutStyle, PositionX, PositionY, Settings};
use crate::style::color::Rgb;

const FORMS: &str = "body.login div#login form#loginform,\n\
body.login div#login form#registerform,\n\
body.login div#login form#lostpasswordform {\n";

/// Stylesheet for the Pro settings. Empty when nothing applies.
pub fn generate_pro_css(settings: &Settings) -> String {
    let mut css = String::new();

    if settings.glass_enabled {
        glass_block(&mut css, settings);
    }

    if settings.layout_position_x != PositionX::Center
        || settings.layout_position_y != PositionY::Center
    {
        position_block(
            &mut css,
            settings.layout_position_x,
            settings.layout_position_y,
        );
    }

    match settings.layout_style {
        LayoutStyle::Compact => {
            css.push_str("/* Compact Layout */\n");
            css.push_str("#loginform, #registerform, #lostpasswordform { padding: 16px 20px !important; }\n");
            css.push_str("#login h1 { margin-bottom: 12px !important; }\n");
            css.push_str("#loginform p, #registerform p { margin-bottom: 12px !important; }\n");
        }
        LayoutStyle::Spacious => {
            css.push_str("/* Spacious Layout */\n");
            css.push_str("#loginform, #registerform, #lostpasswordform { padding: 32px 36px !important; }\n");
            css.push_str("#login h1 { margin-bottom: 32px !important; }\n");
            css.push_str("#loginform p, #registerform p { margin-bottom: 20px !important; }\n");
            css.push_str("#loginform .input, #registerform .input { padding: 8px 12px !important; font-size: 15px !important; }\n");
        }
        LayoutStyle::Standard => {}
    }

    if settings.hide_footer_links {
        css.push_str("/* Hide Footer Links */\n");
        css.push_str("#login #nav, #login #backtoblog, .privacy-policy-page-link { display: none !important; }\n");
    }

    if !settings.custom_css.is_empty() {
        css.push_str("/* Custom CSS */\n");
        css.push_str(&settings.custom_css);
        css.push('\n');
    }

    css
}

fn glass_block(css: &mut String, settings: &Settings) {
    let bg = settings
        .design_str("form_bg_color")
        .and_then(Rgb::from_hex)
        .unwrap_or(Rgb::WHITE);
    let transparency = settings.glass_transparency.min(100);
    let opacity = f64::from(100 - transparency) / 100.0;
    let blur = settings.glass_blur;

    css.push_str("/* Glassmorphism */\n");
    css.push_str(FORMS);
    css.push_str(&format!(
        "    background: rgba({}, {}, {}, {}) !important;\n",
        bg.r, bg.g, bg.b, opacity
    ));
    css.push_str(&format!("    backdrop-filter: blur({}px) !important;\n", blur));
    css.push_str(&format!(
        "    -webkit-backdrop-filter: blur({}px) !important;\n",
        blur
    ));
    if settings.glass_border {
        css.push_str("    border: 1px solid rgba(255, 255, 255, 0.2) !important;\n");
    }
    css.push_str("}\n");
}

fn position_block(css: &mut String, x: PositionX, y: PositionY) {
    css.push_str("/* Layout Position */\n");
    css.push_str("body.login {\n");
    css.push_str("    display: flex !important;\n");
    css.push_str("    flex-direction: column !important;\n");
    css.push_str(&format!("    align-items: {} !important;\n", x.flex_value()));
    css.push_str(&format!("    justify-content: {} !important;\n", y.flex_value()));
    css.push_str("    min-height: 100vh !important;\n");
    css.push_str("    padding: 5% 10% !important;\n");
    css.push_str("    box-sizing: border-box !important;\n");
    css.push_str("}\n");
    css.push_str("body.login div#login {\n");
    css.push_str("    position: relative !important;\n");
    css.push_str("    margin: 0 !important;\n");
    css.push_str("    padding: 0 !important;\n");
    css.push_str("    width: 100% !important;\n");
    css.push_str("    max-width: 400px !important;\n");
    css.push_str("}\n");
    css.push_str("html, body { height: 100% !important; margin: 0 !important; }\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_defaults_emit_nothing() {
        assert_eq!(generate_pro_css(&Settings::default()), "");
    }

    #[test]
    fn test_glass_block() {
        let mut settings = Settings::default();
        settings.glass_enabled = true;
        settings
            .design
            .insert("form_bg_color".into(), Value::String("#1e1e1e".into()));

        let css = generate_pro_css(&settings);
        assert!(css.starts_with("/* Glassmorphism */\nbody.login div#login form#loginform,\n"));
        assert!(css.contains("    background: rgba(30, 30, 30, 0.2) !important;\n"));
        assert!(css.contains("    backdrop-filter: blur(10px) !important;\n"));
        assert!(css.contains("    -webkit-backdrop-filter: blur(10px) !important;\n"));
        assert!(css.contains("border: 1px solid rgba(255, 255, 255, 0.2)"));
        assert!(css.ends_with("}\n"));
    }

    #[test]
    fn test_glass_opacity_edges() {
        let mut settings = Settings::default();
        settings.glass_enabled = true;
        settings.glass_border = false;

        settings.glass_transparency = 0;
        let css = generate_pro_css(&settings);
        assert!(css.contains("rgba(255, 255, 255, 1) !important"));
        assert!(!css.contains("border:"));

        settings.glass_transparency = 100;
        assert!(generate_pro_css(&settings).contains("rgba(255, 255, 255, 0) !important"));

        settings.glass_transparency = 35;
        assert!(generate_pro_css(&settings).contains("rgba(255, 255, 255, 0.65) !important"));
    }

    #[test]
    fn test_position_block() {
        let mut settings = Settings::default();
        settings.layout_position_x = PositionX::Right;
        settings.layout_position_y = PositionY::Top;

        let css = generate_pro_css(&settings);
        assert!(css.starts_with("/* Layout Position */\n"));
        assert!(css.contains("    align-items: flex-end !important;\n"));
        assert!(css.contains("    justify-content: flex-start !important;\n"));
        assert!(css.ends_with("html, body { height: 100% !important; margin: 0 !important; }\n"));
    }

    #[test]
    fn test_layout_styles_and_footer() {
        let mut settings = Settings::default();
        settings.layout_style = LayoutStyle::Compact;
        settings.hide_footer_links = true;
        let css = generate_pro_css(&settings);
        assert!(css.contains("padding: 16px 20px"));
        assert!(css.contains("/* Hide Footer Links */\n#login #nav"));

        settings.layout_style = LayoutStyle::Spacious;
        let css = generate_pro_css(&settings);
        assert!(css.contains("padding: 32px 36px"));
        assert!(css.contains("font-size: 15px"));
    }

    #[test]
    fn test_custom_css_last() {
        let mut settings = Settings::default();
        settings.hide_footer_links = true;
        settings.custom_css = ".login h1 a { display: none; }".into();
        let css = generate_pro_css(&settings);
        assert!(css.ends_with("/* Custom CSS */\n.login h1 a { display: none; }\n"));
    }
}
