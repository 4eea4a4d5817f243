use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 138, g: 180, b: 248 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 203, b: 107 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::TrueColor { r: 130, g: 170, b: 255 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 199, g: 146, b: 234 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 247, g: 140, b: 108 };

pub const PORT_OPEN: Color = Color::Green;
pub const PORT_CLOSED: Color = Color::Red;
pub const PORT_FILTERED: Color = Color::Yellow;
