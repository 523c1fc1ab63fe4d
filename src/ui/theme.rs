use ratatui::style::Color;

// Primary brand colors
pub const ACCENT: Color = Color::Rgb(218, 118, 89); // #DA7659 - warm orange
pub const SUCCESS: Color = Color::Rgb(134, 188, 111); // Soft green
pub const WARNING: Color = Color::Rgb(229, 192, 123); // Warm amber
pub const ERROR: Color = Color::Rgb(224, 108, 117);

// Text colors
pub const TEXT: Color = Color::Rgb(240, 240, 240);
pub const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 180);
pub const TEXT_MUTED: Color = Color::Rgb(144, 144, 144);

// Background colors
pub const BG_BASE: Color = Color::Rgb(34, 34, 32);
pub const BG_SURFACE: Color = Color::Rgb(51, 51, 49);
pub const BG_ELEVATED: Color = Color::Rgb(66, 66, 64);
pub const BG_INPUT: Color = Color::Rgb(58, 58, 56);

// Border colors
pub const BORDER: Color = Color::Rgb(66, 66, 64);
pub const BORDER_FOCUS: Color = Color::Rgb(218, 118, 89);

// Entry kinds
pub const DIRECTORY: Color = Color::Rgb(97, 175, 239);
pub const PRIVATE: Color = Color::Rgb(229, 192, 123);

pub fn level_color(level: rp_base::LogLevel) -> Color {
    match level {
        rp_base::LogLevel::Info => TEXT_SECONDARY,
        rp_base::LogLevel::Success => SUCCESS,
        rp_base::LogLevel::Warning => WARNING,
        rp_base::LogLevel::Error => ERROR,
    }
}
