use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_dim: String,
    pub accent: String,
    pub accent_dim: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub author_badge: String,
    pub peer_badge: String,
    pub link: String,
    pub selected_bg: String,
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Theme {
    pub fn load(name: &str) -> Option<Self> {
        // User themes shadow bundled ones
        if let Some(config_dir) = dirs::config_dir() {
            let user_theme_path = config_dir
                .join("peerclass")
                .join("themes")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path) {
                match toml::from_str::<Theme>(&content) {
                    Ok(theme) => return Some(theme),
                    Err(e) => warn!(path = %user_theme_path.display(), %e, "invalid user theme"),
                }
            }
        }

        let filename = format!("{name}.toml");
        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("catppuccin-mocha").unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1e1e2e".to_string(),
            fg: "#cdd6f4".to_string(),
            text_dim: "#6c7086".to_string(),
            accent: "#89b4fa".to_string(),
            accent_dim: "#45475a".to_string(),
            border: "#45475a".to_string(),
            border_focused: "#89b4fa".to_string(),
            header_bg: "#313244".to_string(),
            header_fg: "#cdd6f4".to_string(),
            author_badge: "#f9e2af".to_string(),
            peer_badge: "#94e2d5".to_string(),
            link: "#74c7ec".to_string(),
            selected_bg: "#45475a".to_string(),
            error: "#f38ba8".to_string(),
            warning: "#f9e2af".to_string(),
            success: "#a6e3a1".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Color::Rgb(r, g, b);
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_dim(&self) -> Color { Self::parse_color(&self.text_dim) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn accent_dim(&self) -> Color { Self::parse_color(&self.accent_dim) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn author_badge(&self) -> Color { Self::parse_color(&self.author_badge) }
    pub fn peer_badge(&self) -> Color { Self::parse_color(&self.peer_badge) }
    pub fn link(&self) -> Color { Self::parse_color(&self.link) }
    pub fn selected_bg(&self) -> Color { Self::parse_color(&self.selected_bg) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_parse() {
        let names = Theme::available_themes();
        assert!(names.contains(&"catppuccin-mocha".to_string()));
        for name in names {
            assert!(Theme::load(&name).is_some(), "theme {name} failed to parse");
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(ThemeColors::parse_color("#ff0080"), Color::Rgb(255, 0, 128));
        assert_eq!(ThemeColors::parse_color("nope"), Color::White);
    }
}
