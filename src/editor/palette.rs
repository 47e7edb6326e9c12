use gtk4::gdk::RGBA;
use log::debug;

/// Preset pen colours offered by the toolkit's colour menu, as RGB bytes.
pub const PRESET_COLORS: [(u8, u8, u8); 8] = [
    (0xE0, 0x1B, 0x24),
    (0xFF, 0x78, 0x00),
    (0xF6, 0xD3, 0x2D),
    (0x33, 0xD1, 0x7A),
    (0x35, 0x84, 0xE4),
    (0x91, 0x41, 0xAC),
    (0xFF, 0xFF, 0xFF),
    (0x00, 0x00, 0x00),
];

pub fn rgba_from_bytes((r, g, b): (u8, u8, u8)) -> RGBA {
    RGBA::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
}

pub fn to_hex(color: &RGBA) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        (color.red() * 255.0).round() as u8,
        (color.green() * 255.0).round() as u8,
        (color.blue() * 255.0).round() as u8
    )
}

/// Popup state of the colour menu and the colour it last picked.
#[derive(Clone, Debug)]
pub struct ColorMenu {
    colors: Vec<RGBA>,
    current: usize,
    active: bool,
}

impl Default for ColorMenu {
    fn default() -> Self {
        Self {
            colors: PRESET_COLORS.iter().copied().map(rgba_from_bytes).collect(),
            current: 0,
            active: false,
        }
    }
}

impl ColorMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(&self) -> &[RGBA] {
        &self.colors
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Opens the menu if closed and closes it if open; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        debug!("Color menu active: {}", self.active);
        self.active
    }

    pub fn deactivate(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        was_active
    }

    /// Picks a preset and closes the menu. Out of range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<RGBA> {
        let color = *self.colors.get(index)?;
        self.current = index;
        self.active = false;
        debug!("Color menu picked {}", to_hex(&color));
        Some(color)
    }
}
