use catppuccin::PALETTE;
use ratatui::style::Color;

const fn rgb(c: &catppuccin::Color) -> Color {
    Color::Rgb(c.rgb.r, c.rgb.g, c.rgb.b)
}

/// Colors used by the kiosk and the board.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    base: Color,
    surface0: Color,
    surface1: Color,
    surface2: Color,
    overlay0: Color,
    overlay1: Color,
    text: Color,
    subtext0: Color,
    subtext1: Color,
    mauve: Color,
    red: Color,
    peach: Color,
    yellow: Color,
    green: Color,
    teal: Color,
    lavender: Color,
}

impl Theme {
    const fn from_catppuccin(flavor: &catppuccin::Flavor) -> Self {
        let c = &flavor.colors;
        Self {
            base: rgb(&c.base),
            surface0: rgb(&c.surface0),
            surface1: rgb(&c.surface1),
            surface2: rgb(&c.surface2),
            overlay0: rgb(&c.overlay0),
            overlay1: rgb(&c.overlay1),
            text: rgb(&c.text),
            subtext0: rgb(&c.subtext0),
            subtext1: rgb(&c.subtext1),
            mauve: rgb(&c.mauve),
            red: rgb(&c.red),
            peach: rgb(&c.peach),
            yellow: rgb(&c.yellow),
            green: rgb(&c.green),
            teal: rgb(&c.teal),
            lavender: rgb(&c.lavender),
        }
    }

    #[must_use]
    pub const fn base(&self) -> Color {
        self.base
    }

    #[must_use]
    pub const fn surface0(&self) -> Color {
        self.surface0
    }

    #[must_use]
    pub const fn surface1(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn surface2(&self) -> Color {
        self.surface2
    }

    #[must_use]
    pub const fn overlay0(&self) -> Color {
        self.overlay0
    }

    #[must_use]
    pub const fn overlay1(&self) -> Color {
        self.overlay1
    }

    #[must_use]
    pub const fn text(&self) -> Color {
        self.text
    }

    #[must_use]
    pub const fn subtext0(&self) -> Color {
        self.subtext0
    }

    #[must_use]
    pub const fn subtext1(&self) -> Color {
        self.subtext1
    }

    #[must_use]
    pub const fn mauve(&self) -> Color {
        self.mauve
    }

    #[must_use]
    pub const fn red(&self) -> Color {
        self.red
    }

    #[must_use]
    pub const fn peach(&self) -> Color {
        self.peach
    }

    #[must_use]
    pub const fn yellow(&self) -> Color {
        self.yellow
    }

    #[must_use]
    pub const fn green(&self) -> Color {
        self.green
    }

    #[must_use]
    pub const fn teal(&self) -> Color {
        self.teal
    }

    #[must_use]
    pub const fn lavender(&self) -> Color {
        self.lavender
    }

    // UI element colors

    #[must_use]
    pub const fn border(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn selection_bg(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn header(&self) -> Color {
        self.yellow
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_catppuccin(&PALETTE.mocha)
    }
}

/// Look up a theme by name, falling back to Mocha.
pub fn theme_from_name(name: &str) -> Theme {
    let flavor = match name {
        "Catppuccin Mocha" => &PALETTE.mocha,
        "Catppuccin Macchiato" => &PALETTE.macchiato,
        "Catppuccin Frappé" => &PALETTE.frappe,
        "Catppuccin Latte" => &PALETTE.latte,
        _ => {
            tracing::warn!(name, "Unknown theme, using default");
            &PALETTE.mocha
        }
    };
    Theme::from_catppuccin(flavor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_theme_is_found() {
        let latte = theme_from_name("Catppuccin Latte");
        let c = PALETTE.latte.colors.base.rgb;
        assert_eq!(latte.base(), Color::Rgb(c.r, c.g, c.b));
    }

    #[test]
    fn test_unknown_theme_falls_back_to_mocha() {
        let theme = theme_from_name("Solarized");
        let c = PALETTE.mocha.colors.base.rgb;
        assert_eq!(theme.base(), Color::Rgb(c.r, c.g, c.b));
    }
}
