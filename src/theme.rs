use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn color(self) -> Color {
        Color::Rgb(self.0, self.1, self.2)
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Rgb(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
        )
    }

    pub fn scale(self, factor: f32) -> Rgb {
        let factor = factor.clamp(0.0, 1.0);
        let dim = |v: u8| (f32::from(v) * factor).round() as u8;
        Rgb(dim(self.0), dim(self.1), dim(self.2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub id: &'static str,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub gradient: (Rgb, Rgb),
    pub glow: Rgb,
}

pub const THEMES: [Theme; 5] = [
    Theme {
        id: "cyber-blue",
        primary: Rgb(6, 182, 212),
        secondary: Rgb(59, 130, 246),
        accent: Rgb(34, 211, 238),
        gradient: (Rgb(22, 78, 99), Rgb(30, 58, 138)),
        glow: Rgb(6, 182, 212),
    },
    Theme {
        id: "neon-pink",
        primary: Rgb(217, 70, 239),
        secondary: Rgb(139, 92, 246),
        accent: Rgb(232, 121, 249),
        gradient: (Rgb(112, 26, 117), Rgb(76, 29, 149)),
        glow: Rgb(217, 70, 239),
    },
    Theme {
        id: "toxic-green",
        primary: Rgb(132, 204, 22),
        secondary: Rgb(16, 185, 129),
        accent: Rgb(163, 230, 53),
        gradient: (Rgb(54, 83, 20), Rgb(6, 78, 59)),
        glow: Rgb(132, 204, 22),
    },
    Theme {
        id: "sunset-orange",
        primary: Rgb(249, 115, 22),
        secondary: Rgb(239, 68, 68),
        accent: Rgb(251, 146, 60),
        gradient: (Rgb(124, 45, 18), Rgb(127, 29, 29)),
        glow: Rgb(249, 115, 22),
    },
    Theme {
        id: "electric-purple",
        primary: Rgb(168, 85, 247),
        secondary: Rgb(99, 102, 241),
        accent: Rgb(192, 132, 252),
        gradient: (Rgb(88, 28, 135), Rgb(49, 46, 129)),
        glow: Rgb(168, 85, 247),
    },
];
