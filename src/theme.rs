//! Themes and the styles BookSwap draws with.
//!
//! Palettes come from `ratatui-themes`; [`ThemeColors`] maps a palette onto
//! the roles the views use (text levels, borders, listing and request badges).

use ratatui::style::{Color, Modifier, Style};

use crate::models::{BookStatus, ExchangeStatus};
use ratatui_themes::{ThemeName, ThemePalette};
use serde::{Deserialize, Serialize};

/// Selected color scheme, stored in the config file by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub ThemeName);

impl Theme {
    /// Every scheme the picker offers
    #[must_use]
    pub const fn all() -> &'static [ThemeName] {
        ThemeName::all()
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0.display_name()
    }

    #[must_use]
    pub const fn inner(&self) -> ThemeName {
        self.0
    }

    #[must_use]
    pub fn colors(&self) -> ThemeColors {
        ThemeColors::from_palette(self.0.palette())
    }
}

impl From<ThemeName> for Theme {
    fn from(name: ThemeName) -> Self {
        Self(name)
    }
}

/// Palette resolved into the roles the UI draws with.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub bg: Color,
    /// Panels, popups and the status bar
    pub bg_secondary: Color,
    pub fg: Color,
    pub muted: Color,

    pub primary: Color,
    pub secondary: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub selection: Color,
}

impl ThemeColors {
    #[must_use]
    pub fn from_palette(p: ThemePalette) -> Self {
        Self {
            bg: p.bg,
            bg_secondary: lighten(p.bg, 10),
            fg: p.fg,
            muted: p.muted,
            primary: p.accent,
            secondary: p.secondary,
            success: p.success,
            warning: p.warning,
            error: p.error,
            info: p.info,
            selection: p.selection,
        }
    }

    fn fg_style(color: Color) -> Style {
        Style::default().fg(color)
    }

    fn bold(color: Color) -> Style {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    // Text

    #[must_use]
    pub fn text(&self) -> Style {
        Self::fg_style(self.fg)
    }

    /// Secondary details (descriptions, dates)
    #[must_use]
    pub fn text_dim(&self) -> Style {
        Self::fg_style(self.muted)
    }

    /// Labels and hints
    #[must_use]
    pub fn text_muted(&self) -> Style {
        Self::fg_style(self.muted).add_modifier(Modifier::DIM)
    }

    #[must_use]
    pub fn text_primary(&self) -> Style {
        Self::fg_style(self.primary)
    }

    #[must_use]
    pub fn text_secondary(&self) -> Style {
        Self::fg_style(self.secondary)
    }

    #[must_use]
    pub fn text_success(&self) -> Style {
        Self::fg_style(self.success)
    }

    #[must_use]
    pub fn text_warning(&self) -> Style {
        Self::fg_style(self.warning)
    }

    #[must_use]
    pub fn text_error(&self) -> Style {
        Self::fg_style(self.error)
    }

    // Chrome

    /// Unfocused panel border
    #[must_use]
    pub fn block(&self) -> Style {
        Self::fg_style(self.muted)
    }

    #[must_use]
    pub fn block_focus(&self) -> Style {
        Self::fg_style(self.primary)
    }

    /// Highlighted list row
    #[must_use]
    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .fg(self.fg)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn tab(&self) -> Style {
        Self::fg_style(self.muted)
    }

    #[must_use]
    pub fn tab_active(&self) -> Style {
        Self::bold(self.primary)
    }

    /// Keyboard shortcut in a hint line
    #[must_use]
    pub fn key_hint(&self) -> Style {
        Self::bold(self.secondary)
    }

    #[must_use]
    pub fn logo_style_primary(&self) -> Style {
        Self::bold(self.primary)
    }

    #[must_use]
    pub fn logo_style_secondary(&self) -> Style {
        Self::bold(self.secondary)
    }

    // Domain badges

    #[must_use]
    pub fn genre_tag(&self) -> Style {
        Self::fg_style(self.info).add_modifier(Modifier::ITALIC)
    }

    /// Badge for a listing's availability
    #[must_use]
    pub fn book_status(&self, status: BookStatus) -> Style {
        Self::bold(match status {
            BookStatus::Available => self.success,
            BookStatus::Pending => self.warning,
            BookStatus::Exchanged => self.muted,
        })
    }

    /// Badge for an exchange request
    #[must_use]
    pub fn exchange_status(&self, status: ExchangeStatus) -> Style {
        Self::bold(match status {
            ExchangeStatus::Pending => self.warning,
            ExchangeStatus::Accepted => self.success,
            ExchangeStatus::Rejected => self.error,
            ExchangeStatus::Completed => self.info,
        })
    }
}

/// Raise each RGB channel by `amount`; named colors pass through.
fn lighten(color: Color, amount: u8) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(amount),
            g.saturating_add(amount),
            b.saturating_add(amount),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighten_saturates() {
        assert_eq!(lighten(Color::Rgb(250, 0, 10), 10), Color::Rgb(255, 10, 20));
        assert_eq!(lighten(Color::Blue, 10), Color::Blue);
    }

    #[test]
    fn test_status_badges_use_semantic_colors() {
        let colors = Theme::default().colors();
        assert_eq!(
            colors.exchange_status(ExchangeStatus::Rejected).fg,
            Some(colors.error)
        );
        assert_eq!(
            colors.book_status(BookStatus::Available).fg,
            Some(colors.success)
        );
    }
}
