use ratatui::style::{Color, Modifier, Style};

/// Resolved style set for the whole interface.
#[derive(Debug, Clone)]
pub struct Theme {
    pub id: &'static str,
    // Overall background color to paint the full frame
    pub background: Color,

    // Chrome
    pub title: Style,
    pub panel_border: Style,
    pub panel_title: Style,
    pub focused_border: Style,
    pub selection_highlight: Style,
    pub busy_indicator: Style,
    pub error_text: Style,
    pub input_border: Style,

    // Transcript
    pub user_prefix: Style,
    pub user_text: Style,
    pub assistant_text: Style,
    pub timestamp: Style,
    pub heading: Style,
    pub list_number: Style,
    pub citation: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            id: "dark",
            background: Color::Black,

            title: Style::default().fg(Color::Gray),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_title: Style::default().fg(Color::Gray),
            focused_border: Style::default().fg(Color::Cyan),
            selection_highlight: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            busy_indicator: Style::default().fg(Color::Yellow),
            error_text: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            input_border: Style::default().fg(Color::Gray),

            user_prefix: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text: Style::default().fg(Color::Cyan),
            assistant_text: Style::default().fg(Color::White),
            timestamp: Style::default().fg(Color::DarkGray),
            heading: Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
            list_number: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            citation: Style::default().fg(Color::LightBlue),
        }
    }

    pub fn light() -> Self {
        Theme {
            id: "light",
            background: Color::White,

            title: Style::default().fg(Color::DarkGray),
            panel_border: Style::default().fg(Color::Gray),
            panel_title: Style::default().fg(Color::DarkGray),
            focused_border: Style::default().fg(Color::Blue),
            selection_highlight: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            busy_indicator: Style::default().fg(Color::Magenta),
            error_text: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            input_border: Style::default().fg(Color::Black),

            user_prefix: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text: Style::default().fg(Color::Blue),
            assistant_text: Style::default().fg(Color::Black),
            timestamp: Style::default().fg(Color::Gray),
            heading: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            list_number: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            citation: Style::default().fg(Color::Blue),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            // Fallback
            _ => Self::dark_default(),
        }
    }

    /// The other built-in theme, for the runtime toggle.
    pub fn toggled(&self) -> Self {
        match self.id {
            "dark" => Self::light(),
            _ => Self::dark_default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}
