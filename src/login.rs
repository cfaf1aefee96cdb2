//! Login page extras: the message below the form and redirects.

use crate::settings::Settings;

/// Link colour used when the design has none.
pub const DEFAULT_LINK_COLOR: &str = "#50575e";

/// Markup for the custom message below the form, if one is set.
pub fn render_custom_message(settings: &Settings) -> Option<String> {
    if settings.custom_message.is_empty() {
        return None;
    }

    let color = settings
        .design_str("below_form_link_color")
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_LINK_COLOR);

    let with_breaks = settings
        .custom_message
        .replace("\r\n", "\n")
        .replace('\n', "<br />\n");
    let body = ammonia::clean(&with_breaks);

    Some(format!(
        "<div id=\"loginforge-custom-message\" style=\"color: {}; text-align: center; margin-top: 16px; font-size: 13px;\">{}</div>",
        ammonia::clean_text(color),
        body
    ))
}

/// Where to send a user after a login attempt.
///
/// The configured URL wins only for successful logins.
pub fn login_redirect(settings: &Settings, requested: &str, authenticated: bool) -> String {
    if authenticated && !settings.redirect_login.is_empty() {
        settings.redirect_login.clone()
    } else {
        requested.to_string()
    }
}

/// Where to send a user after logout, or `None` for the host default.
pub fn logout_redirect(settings: &Settings) -> Option<&str> {
    Some(settings.redirect_logout.as_str()).filter(|url| !url.is_empty())
}
