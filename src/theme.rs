use ratatui::style::{Color, Modifier, Style};

// Palette for the notebook look. Colours are given as RGB and reduced to the
// xterm-256 cube when the terminal does not advertise truecolor.

pub const INK_RGB: (u8, u8, u8) = (220, 38, 38);
pub const HIGHLIGHT_RGB: (u8, u8, u8) = (254, 240, 138);
pub const USER_BUBBLE_RGB: (u8, u8, u8) = (49, 46, 129);
pub const ACCENT_RGB: (u8, u8, u8) = (99, 102, 241);
pub const MATH_RGB: (u8, u8, u8) = (30, 64, 175);

pub fn truecolor() -> bool {
    std::env::var("COLORTERM")
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("truecolor") || value.contains("24bit")
        })
        .unwrap_or(false)
}

pub fn rgb_to_color(rgb: (u8, u8, u8)) -> Color {
    if truecolor() {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    } else {
        Color::Indexed(cube_index(rgb))
    }
}

/// Nearest entry of the 6x6x6 colour cube (indices 16..=231).
fn cube_index((r, g, b): (u8, u8, u8)) -> u8 {
    let level = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

pub fn accent() -> Color {
    rgb_to_color(ACCENT_RGB)
}

pub fn title_style() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(accent())
        .add_modifier(Modifier::BOLD)
}

// Transcript
pub fn user_bubble() -> Style {
    Style::default().fg(Color::White).bg(rgb_to_color(USER_BUBBLE_RGB))
}
pub fn heading() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}
pub fn math() -> Style {
    Style::default()
        .fg(rgb_to_color(MATH_RGB))
        .add_modifier(Modifier::BOLD)
}
pub fn bullet() -> Style {
    Style::default().fg(Color::Gray)
}
pub fn notebook() -> Style {
    Style::default()
}
pub fn section_label() -> Style {
    Style::default()
        .fg(accent())
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}
pub fn tag() -> Style {
    Style::default().fg(accent()).add_modifier(Modifier::BOLD)
}
pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

// Annotation
pub fn ink() -> Style {
    Style::default()
        .fg(rgb_to_color(INK_RGB))
        .add_modifier(Modifier::BOLD)
}
pub fn highlight() -> Style {
    Style::default()
        .bg(rgb_to_color(HIGHLIGHT_RGB))
        .fg(Color::Black)
}
pub fn hint_banner() -> Style {
    Style::default().fg(Color::Black).bg(Color::Yellow)
}

// Banners and bars
pub fn error_banner() -> Style {
    Style::default().fg(Color::White).bg(Color::Red)
}
pub fn status_bar() -> Style {
    Style::default().fg(Color::Black).bg(Color::Gray)
}
pub fn input_border() -> Style {
    Style::default().fg(accent())
}
pub fn input_disabled() -> Style {
    Style::default().fg(Color::DarkGray)
}

// Overlays
pub fn dialog() -> Style {
    Style::default().fg(Color::White).bg(Color::Black)
}
pub fn debug_highlight() -> Color {
    Color::Yellow
}
