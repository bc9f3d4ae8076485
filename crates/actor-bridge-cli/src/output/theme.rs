use actor_bridge::ActorEventType;
use console::{Style, StyledObject};

/// Kind of status line printed by [`super::OutputManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
}

impl Tone {
    fn glyph(self) -> &'static str {
        match self {
            Tone::Success => "✔",
            Tone::Error => "✖",
            Tone::Warning => "▲",
            Tone::Info => "›",
        }
    }
}

/// Styles for actor names, event kinds and traffic counters.
///
/// A plain theme hands out unstyled [`Style`]s so redirected output carries
/// no escape codes.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    colors: bool,
}

impl Theme {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    fn style(&self, build: impl FnOnce(Style) -> Style) -> Style {
        if self.colors {
            build(Style::new())
        } else {
            Style::new()
        }
    }

    pub fn marker(&self, tone: Tone) -> StyledObject<&'static str> {
        let style = self.style(|s| match tone {
            Tone::Success => s.green().bold(),
            Tone::Error => s.red().bold(),
            Tone::Warning => s.yellow().bold(),
            Tone::Info => s.blue(),
        });
        style.apply_to(tone.glyph())
    }

    /// Lifecycle kinds in traffic-light colours, message traffic in cool ones
    pub fn event_kind(&self, kind: ActorEventType) -> StyledObject<&'static str> {
        let style = self.style(|s| match kind {
            ActorEventType::Created => s.green(),
            ActorEventType::Stopped => s.yellow(),
            ActorEventType::Aborted => s.red().bold(),
            ActorEventType::MessageSent => s.cyan(),
            ActorEventType::MessageReceived => s.blue(),
            ActorEventType::MessageProcessed => s.magenta(),
        });
        style.apply_to(kind.as_str())
    }

    pub fn actor(&self) -> Style {
        self.style(|s| s.cyan().bold())
    }

    pub fn detail(&self) -> Style {
        self.style(|s| s.dim())
    }

    pub fn heading(&self) -> Style {
        self.style(|s| s.bold())
    }

    pub fn column_header(&self) -> Style {
        self.style(|s| s.bold().underlined())
    }

    /// Queued message count; anything waiting stands out
    pub fn backlog(&self, queued: u64) -> StyledObject<u64> {
        let style = self.style(|s| if queued > 0 { s.yellow().bold() } else { s.dim() });
        style.apply_to(queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_theme_has_no_escape_codes() {
        let theme = Theme::new(false);
        assert_eq!(
            theme
                .event_kind(ActorEventType::Aborted)
                .force_styling(true)
                .to_string(),
            "ABORTED"
        );
        assert_eq!(theme.marker(Tone::Success).force_styling(true).to_string(), "✔");
        assert_eq!(theme.backlog(3).force_styling(true).to_string(), "3");
    }

    #[test]
    fn test_colored_theme_styles_event_kinds() {
        let theme = Theme::new(true);
        let created = theme
            .event_kind(ActorEventType::Created)
            .force_styling(true)
            .to_string();
        let aborted = theme
            .event_kind(ActorEventType::Aborted)
            .force_styling(true)
            .to_string();

        assert!(created.contains("CREATED"));
        assert!(created.starts_with('\u{1b}'));
        assert_ne!(created, aborted);
    }

    #[test]
    fn test_backlog_highlights_waiting_messages() {
        let theme = Theme::new(true);
        let idle = theme.backlog(0).force_styling(true).to_string();
        let busy = theme.backlog(4).force_styling(true).to_string();
        let yellow = "\u{1b}[33m";
        assert!(busy.contains(yellow));
        assert!(!idle.contains(yellow));
    }
}
