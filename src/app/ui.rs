//! UI rendering for the TUI

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::state::{AppState, Mode};
use crate::exchange;
use crate::models::{Book, ExchangeRequestDetails};
use crate::pages::auth::AuthField;
use crate::pages::matches::Role;
use crate::pages::my_books::{BookField, BookForm};
use crate::router::Route;
use crate::theme::{Theme, ThemeColors};

/// ASCII art logo for the home screen
const LOGO: &str = r"
 ____              _     ____
| __ )  ___   ___ | | __/ ___|_      ____ _ _ __
|  _ \ / _ \ / _ \| |/ /\___ \ \ /\ / / _` | '_ \
| |_) | (_) | (_) |   <  ___) \ V  V / (_| | |_) |
|____/ \___/ \___/|_|\_\|____/ \_/\_/ \__,_| .__/
                                           |_|
";

const ICON: &str = "📚";

/// Spinner animation frames
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Main render function
pub fn render(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();

    // Set background
    let area = frame.area();
    let bg_block = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Navbar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar / footer
        ])
        .split(area);

    render_navbar(frame, state, chunks[0]);
    render_main(frame, state, chunks[1]);
    render_status_bar(frame, state, chunks[2]);

    // Render modal dialogs
    match state.mode {
        Mode::Help => render_help_popup(frame, state),
        Mode::ThemePicker => render_theme_picker(frame, state),
        Mode::BookForm => {
            if let Some(form) = &state.book_form {
                render_book_form(frame, state, form);
            }
        }
        Mode::Exchange => render_exchange_modal(frame, state),
        Mode::ConfirmDelete => render_confirm_delete(frame, state),
        Mode::Search | Mode::ProfileEdit | Mode::Normal => {}
    }
}

fn spinner(state: &AppState) -> &'static str {
    let frame_idx = (state.current_tick() / 2) as usize % SPINNER.len();
    SPINNER[frame_idx]
}

/// Cut `text` to `max` columns, ending in an ellipsis when shortened
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

fn panel<'a>(colors: &ThemeColors, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            colors.block_focus()
        } else {
            colors.block()
        })
        .title(title)
        .title_style(colors.text_primary())
}

fn render_navbar(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let routes = state.nav_routes();

    let titles: Vec<Line> = routes
        .iter()
        .enumerate()
        .map(|(i, route)| {
            let marker = if *route == state.route { "●" } else { "○" };
            Line::from(format!("{marker} {} {}", i + 1, route.title()))
        })
        .collect();

    let account = match &state.user {
        Some(profile) => Line::from(vec![
            Span::styled(format!(" 👤 {} ", profile.username), colors.text_secondary()),
            Span::styled("│ ", colors.text_muted()),
            Span::styled("S", colors.key_hint()),
            Span::styled(" Sign Out ", colors.text_muted()),
        ]),
        None if state.session_loading => Line::from(""),
        None => Line::from(vec![
            Span::styled(" s", colors.key_hint()),
            Span::styled(" Sign In ", colors.text_muted()),
        ]),
    };

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(colors.block())
                .title(format!(" {ICON} BookSwap "))
                .title_style(colors.logo_style_primary())
                .title_top(account.right_aligned()),
        )
        .select(routes.iter().position(|r| *r == state.route))
        .style(colors.tab())
        .highlight_style(colors.tab_active())
        .divider(Span::styled(" │ ", colors.text_muted()));

    frame.render_widget(tabs, area);
}

fn render_main(frame: &mut Frame, state: &AppState, area: Rect) {
    if state.session_loading {
        render_loading(frame, state, area);
        return;
    }

    match state.route {
        Route::Home => render_home(frame, state, area),
        Route::Auth => render_auth(frame, state, area),
        Route::Books => render_books(frame, state, area),
        Route::MyBooks => render_my_books(frame, state, area),
        Route::Matches => render_matches(frame, state, area),
        Route::Profile => render_profile(frame, state, area),
        Route::NotFound => render_not_found(frame, state, area),
    }
}

fn render_loading(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let mut lines = vec![Line::from(""); (area.height / 2).saturating_sub(1) as usize];
    lines.push(Line::styled(
        format!("{} Loading...", spinner(state)),
        colors.text_primary(),
    ));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_home(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();

    let mut lines: Vec<Line> = LOGO
        .lines()
        .map(|l| Line::styled(l.to_string(), colors.logo_style_primary()))
        .collect();
    lines.extend([
        Line::from(""),
        Line::styled(
            "Exchange Books with Fellow Readers",
            colors.logo_style_secondary(),
        ),
        Line::styled(
            "Give your finished books a new home and discover your next read.",
            colors.text_muted(),
        ),
        Line::from(""),
        Line::from(vec![
            Span::styled("📖 List your books  ", colors.text_secondary()),
            Span::styled("🔍 Find what you want  ", colors.text_secondary()),
            Span::styled("🤝 Swap with readers", colors.text_secondary()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", colors.text_muted()),
            Span::styled("Enter", colors.key_hint()),
            Span::styled(" to browse books", colors.text_muted()),
        ]),
    ]);

    let home = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel(&colors, " Home ", false));
    frame.render_widget(home, area);
}

fn render_not_found(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let lines = vec![
        Line::from(""),
        Line::styled("404", colors.text_error().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::styled("Page not found", colors.text()),
        Line::styled(
            "The page you are looking for does not exist.",
            colors.text_muted(),
        ),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", colors.text_muted()),
            Span::styled("Enter", colors.key_hint()),
            Span::styled(" to go home", colors.text_muted()),
        ]),
    ];
    let page = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel(&colors, " Not Found ", false));
    frame.render_widget(page, area);
}

fn render_auth(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let form = &state.auth_form;
    let popup = centered_rect(50, 70, area);

    let mut lines = vec![
        Line::from(""),
        Line::styled(
            format!("  {}", form.mode.heading()),
            colors.text_primary().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
    ];

    for field in form.fields() {
        let focused = *field == form.focus;
        let value = match field {
            AuthField::Username => form.username.clone(),
            AuthField::Email => form.email.clone(),
            AuthField::Password => "•".repeat(form.password.chars().count()),
        };
        let cursor = if focused && !form.submitting { "▏" } else { "" };
        let label_style = if focused {
            colors.text_primary()
        } else {
            colors.text_muted()
        };
        lines.push(Line::styled(format!("  {}", field.label()), label_style));
        lines.push(Line::from(vec![
            Span::styled(if focused { "  ▸ " } else { "    " }, colors.text_primary()),
            Span::styled(value, colors.text()),
            Span::styled(cursor, colors.text_primary()),
        ]));
        lines.push(Line::from(""));
    }

    if let Some(error) = &form.error {
        lines.push(Line::styled(format!("  ⚠ {error}"), colors.text_error()));
        lines.push(Line::from(""));
    }

    let submit = if form.submitting {
        format!("  {} Please wait...", spinner(state))
    } else {
        format!("  [Enter] {}", form.mode.submit_label())
    };
    lines.push(Line::styled(submit, colors.key_hint()));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  F2 ", colors.key_hint()),
        Span::styled(form.mode.switch_hint(), colors.text_muted()),
    ]));

    frame.render_widget(Clear, popup);
    let auth = Paragraph::new(lines)
        .block(
            panel(&colors, format!(" {ICON} {} ", form.mode.submit_label()), true)
                .style(Style::default().bg(colors.bg_secondary))
                .title_bottom(Line::from(" Tab next field │ Esc back ").centered()),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(auth, popup);
}

/// Three-line card for a book in a list
fn book_card<'a>(book: &Book, colors: &ThemeColors, width: usize) -> ListItem<'a> {
    let title = truncate(&book.title, width.saturating_sub(16));
    ListItem::new(vec![
        Line::from(vec![
            Span::styled(title, colors.text().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(book.status.label().to_string(), colors.book_status(book.status)),
        ]),
        Line::styled(
            truncate(&format!("by {}", book.author), width),
            colors.text_secondary(),
        ),
        Line::from(vec![
            Span::styled(book.genre.clone(), colors.genre_tag()),
            Span::styled(" · ", colors.text_muted()),
            Span::styled(book.condition.label(), colors.text_dim()),
        ]),
        Line::from(""),
    ])
}

fn render_books(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let view = &state.books;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    // Filter bar
    let searching = state.mode == Mode::Search;
    let search = if view.filter.search.is_empty() && !searching {
        Span::styled("title or author", colors.text_muted())
    } else {
        Span::styled(view.filter.search.clone(), colors.text())
    };
    let filter_line = Line::from(vec![
        Span::styled(" 🔍 ", colors.text_primary()),
        search,
        Span::styled(if searching { "▏" } else { "" }, colors.text_primary()),
        Span::styled("   Genre: ", colors.text_muted()),
        Span::styled(
            view.filter.genre.clone().unwrap_or_else(|| "All Genres".to_string()),
            colors.genre_tag(),
        ),
    ]);
    let filter_bar = Paragraph::new(filter_line).block(
        panel(&colors, " Search ", searching).title_top(
            Line::styled(format!(" {} ", view.count_label()), colors.text_secondary()).right_aligned(),
        ),
    );
    frame.render_widget(filter_bar, rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let visible = view.visible();
    if visible.is_empty() {
        let message = if view.books.is_empty() {
            "No books available yet"
        } else {
            "No books match your search"
        };
        let empty = Paragraph::new(vec![Line::from(""), Line::styled(format!("  {message}"), colors.text_muted())])
            .block(panel(&colors, " 📖 Available Books ", true));
        frame.render_widget(empty, rows[1]);
        return;
    }

    let width = cols[0].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = visible.iter().map(|b| book_card(b, &colors, width)).collect();
    let list = List::new(items)
        .block(panel(&colors, " 📖 Available Books ", true))
        .highlight_style(colors.selected())
        .highlight_symbol("▸ ");
    let mut list_state = ListState::default().with_selected(Some(view.selected));
    frame.render_stateful_widget(list, cols[0], &mut list_state);

    if let Some(book) = view.selected_book() {
        render_book_detail(frame, state, book, cols[1]);
    }
}

fn render_book_detail(frame: &mut Frame, state: &AppState, book: &Book, area: Rect) {
    let colors = state.theme.colors();

    let mut lines = vec![
        Line::styled(book.title.clone(), colors.text().add_modifier(Modifier::BOLD)),
        Line::styled(format!("by {}", book.author), colors.text_secondary()),
        Line::from(""),
        Line::from(vec![
            Span::styled("Genre      ", colors.text_muted()),
            Span::styled(book.genre.clone(), colors.genre_tag()),
        ]),
        Line::from(vec![
            Span::styled("Condition  ", colors.text_muted()),
            Span::styled(book.condition.label(), colors.text()),
        ]),
        Line::from(vec![
            Span::styled("Status     ", colors.text_muted()),
            Span::styled(book.status.label(), colors.book_status(book.status)),
        ]),
        Line::from(vec![
            Span::styled("Listed     ", colors.text_muted()),
            Span::styled(book.listed_on(), colors.text()),
        ]),
    ];

    let extras = [
        ("Language   ", book.language.clone()),
        ("Publisher  ", book.publisher.clone()),
        ("Year       ", book.publication_year.map(|y| y.to_string())),
        ("Pages      ", book.page_count.map(|p| p.to_string())),
        ("ISBN       ", book.isbn.clone()),
    ];
    for (label, value) in extras {
        if let Some(value) = value {
            lines.push(Line::from(vec![
                Span::styled(label, colors.text_muted()),
                Span::styled(value, colors.text()),
            ]));
        }
    }

    if let Some(description) = &book.description {
        lines.push(Line::from(""));
        lines.push(Line::styled(description.clone(), colors.text_dim()));
    }

    lines.push(Line::from(""));
    match state.user_id() {
        Some(me) if book.can_be_requested_by(me) => lines.push(Line::from(vec![
            Span::styled("[Enter]", colors.key_hint()),
            Span::styled(" Request Exchange", colors.text()),
        ])),
        Some(me) if book.is_owned_by(me) => {
            lines.push(Line::styled("This is your book", colors.text_muted()));
        }
        _ => {}
    }

    let detail = Paragraph::new(lines)
        .block(panel(&colors, " Details ", false).padding(ratatui::widgets::Padding::horizontal(1)))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn render_my_books(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let title = format!(" 📚 My Books ({}) ", state.my_books.len());
    if state.my_books.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::styled("  You haven't listed any books yet", colors.text_muted()),
            Line::from(vec![
                Span::styled("  Press ", colors.text_dim()),
                Span::styled("n", colors.key_hint()),
                Span::styled(" to add your first book", colors.text_dim()),
            ]),
        ])
        .block(panel(&colors, title, true));
        frame.render_widget(empty, layout[0]);
    } else {
        let width = layout[0].width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = state
            .my_books
            .iter()
            .map(|b| book_card(b, &colors, width))
            .collect();
        let list = List::new(items)
            .block(panel(&colors, title, true))
            .highlight_style(colors.selected())
            .highlight_symbol("▸ ");
        let mut list_state = ListState::default().with_selected(Some(state.selected_my_book));
        frame.render_stateful_widget(list, layout[0], &mut list_state);
    }

    render_action_bar(
        frame,
        &colors,
        layout[1],
        &[("n", "Add book"), ("e", "Edit"), ("d", "Delete"), ("r", "Reload")],
    );
}

/// One-line row of key hints under a view
fn render_action_bar(frame: &mut Frame, colors: &ThemeColors, area: Rect, actions: &[(&str, &str)]) {
    let mut spans = vec![Span::raw(" ")];
    for (key, label) in actions {
        spans.push(Span::styled(format!("[{key}]"), colors.key_hint()));
        spans.push(Span::styled(format!(" {label}  "), colors.text_muted()));
    }
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.bg_secondary));
    frame.render_widget(bar, area);
}

fn render_book_form(frame: &mut Frame, state: &AppState, form: &BookForm) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(60, 70, frame.area());

    let bg_block = Block::default().style(Style::default().bg(colors.bg_secondary));
    frame.render_widget(Clear, popup_area);
    frame.render_widget(bg_block, popup_area);

    let mut lines = vec![Line::from("")];
    for field in BookField::ALL {
        let focused = *field == form.focus;
        let value = match field {
            BookField::Title => form.title.clone(),
            BookField::Author => form.author.clone(),
            BookField::Genre if form.genre.is_empty() => "Select a genre".to_string(),
            BookField::Genre => form.genre.clone(),
            BookField::Condition => form
                .condition
                .map_or_else(|| "Select condition".to_string(), |c| c.label().to_string()),
            BookField::Description => form.description.clone(),
        };
        let required = if *field == BookField::Description { "" } else { " *" };

        let label_style = if focused {
            colors.text_primary().add_modifier(Modifier::BOLD)
        } else {
            colors.text_muted()
        };
        lines.push(Line::styled(format!("  {}{required}", field.label()), label_style));

        let value_line = if field.is_choice() {
            Line::from(vec![
                Span::styled(if focused { "  ◂ " } else { "    " }, colors.key_hint()),
                Span::styled(value, colors.text()),
                Span::styled(if focused { " ▸" } else { "" }, colors.key_hint()),
            ])
        } else {
            Line::from(vec![
                Span::styled(if focused { "  ▸ " } else { "    " }, colors.text_primary()),
                Span::styled(value, colors.text()),
                Span::styled(if focused { "▏" } else { "" }, colors.text_primary()),
            ])
        };
        lines.push(value_line);
        lines.push(Line::from(""));
    }

    let title = if form.is_edit() {
        " ✏️ Edit Book "
    } else {
        " ➕ Add New Book "
    };
    let popup = Paragraph::new(lines)
        .block(
            panel(&colors, title, true)
                .style(Style::default().bg(colors.bg_secondary))
                .title_bottom(
                    Line::from(" Tab next │ ←→ choose │ ↵ save │ Esc cancel ").centered(),
                ),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(popup, popup_area);
}

fn render_confirm_delete(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let Some(book) = state.selected_my_book() else {
        return;
    };
    let popup_area = centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(""),
        Line::styled(format!("Delete \"{}\"?", book.title), colors.text()),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", colors.key_hint()),
            Span::styled(" delete   ", colors.text_muted()),
            Span::styled("n", colors.key_hint()),
            Span::styled(" keep", colors.text_muted()),
        ]),
    ];
    let confirm = Paragraph::new(lines).alignment(Alignment::Center).block(
        panel(&colors, " 🗑 Delete Book ", true)
            .border_style(colors.text_error())
            .style(Style::default().bg(colors.bg_secondary)),
    );
    frame.render_widget(confirm, popup_area);
}

fn render_exchange_modal(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let Some(modal) = &state.exchange else {
        return;
    };
    let popup_area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, popup_area);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg_secondary)),
        popup_area,
    );

    let block = panel(&colors, " 🤝 Request Exchange ", true)
        .style(Style::default().bg(colors.bg_secondary))
        .title_bottom(Line::from(" ↑↓ choose │ type a message │ ↵ send │ Esc cancel ").centered());
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Requested book
            Constraint::Min(3),    // Offers
            Constraint::Length(3), // Message
        ])
        .split(inner);

    let requested = Paragraph::new(vec![
        Line::styled(" You want", colors.text_muted()),
        Line::styled(
            format!(" {}", modal.requested.title_and_author()),
            colors.text().add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(requested, rows[0]);

    if modal.offers.is_empty() {
        let none = Paragraph::new(vec![
            Line::styled(" You have no available books to offer.", colors.text_warning()),
            Line::styled(" List one in My Books first.", colors.text_muted()),
        ])
        .block(panel(&colors, " Offer one of your books ", false));
        frame.render_widget(none, rows[1]);
    } else {
        let items: Vec<ListItem> = modal
            .offers
            .iter()
            .map(|b| {
                ListItem::new(Line::from(vec![
                    Span::styled(b.title_and_author(), colors.text()),
                    Span::styled(format!("  ({})", b.condition), colors.text_dim()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(panel(&colors, " Offer one of your books ", false))
            .highlight_style(colors.selected())
            .highlight_symbol("▸ ");
        let mut list_state = ListState::default().with_selected(modal.selected);
        frame.render_stateful_widget(list, rows[1], &mut list_state);
    }

    let message = if modal.submitting {
        Line::styled(format!(" {} Sending...", spinner(state)), colors.text_primary())
    } else if modal.message.is_empty() {
        Line::from(vec![
            Span::styled(" Add a message (optional)", colors.text_muted()),
            Span::styled("▏", colors.text_primary()),
        ])
    } else {
        Line::from(vec![
            Span::styled(format!(" {}", modal.message), colors.text()),
            Span::styled("▏", colors.text_primary()),
        ])
    };
    frame.render_widget(
        Paragraph::new(message).block(panel(&colors, " Message ", false)),
        rows[2],
    );
}

fn match_item<'a>(details: &ExchangeRequestDetails, state: &AppState, width: usize) -> ListItem<'a> {
    let colors = state.theme.colors();
    let request = &details.request;
    let me = state.user_id();
    let role = me.and_then(|me| Role::of(request, me));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", request.status.emoji(), request.status.as_str().to_uppercase()),
                colors.exchange_status(request.status),
            ),
            Span::styled(
                role.map(|r| format!("  · {}", r.label())).unwrap_or_default(),
                colors.text_muted(),
            ),
            Span::styled(
                format!("  · {}", request.created_at.format("%Y-%m-%d")),
                colors.text_dim(),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Requested  ", colors.text_muted()),
            Span::styled(
                truncate(&details.requested_book.title_and_author(), width.saturating_sub(13)),
                colors.text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Offered    ", colors.text_muted()),
            Span::styled(
                truncate(&details.offered_book.title_and_author(), width.saturating_sub(13)),
                colors.text(),
            ),
        ]),
    ];
    if let Some(message) = &request.message {
        lines.push(Line::styled(
            truncate(&format!("  “{message}”"), width),
            colors.text_dim().add_modifier(Modifier::ITALIC),
        ));
    }
    if me.is_some_and(|me| exchange::can_respond(request, me)) {
        lines.push(Line::from(vec![
            Span::styled("  [a]", colors.key_hint()),
            Span::styled(" Accept  ", colors.text_muted()),
            Span::styled("[x]", colors.key_hint()),
            Span::styled(" Reject", colors.text_muted()),
        ]));
    }
    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn render_matches(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let title = format!(" 🤝 Exchange Requests ({}) ", state.matches.len());

    if state.matches.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::styled("  No exchange requests yet", colors.text_muted()),
            Line::styled(
                "  Browse books and request an exchange to get started",
                colors.text_dim(),
            ),
        ])
        .block(panel(&colors, title, true));
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = state
        .matches
        .iter()
        .map(|m| match_item(m, state, width))
        .collect();
    let list = List::new(items)
        .block(panel(&colors, title, true))
        .highlight_style(colors.selected())
        .highlight_symbol("▸ ");
    let mut list_state = ListState::default().with_selected(Some(state.selected_match));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_profile(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let Some(profile) = &state.user else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Identity
            Constraint::Length(5), // Stats
            Constraint::Min(0),    // Edit form
        ])
        .split(area);

    let avatar = profile
        .avatar_url
        .clone()
        .unwrap_or_else(|| "no avatar".to_string());
    let mut identity = vec![
        Line::from(""),
        Line::styled(
            format!("  👤 {}", profile.username),
            colors.text().add_modifier(Modifier::BOLD),
        ),
        Line::from(vec![
            Span::styled("  Member since ", colors.text_muted()),
            Span::styled(profile.member_since(), colors.text()),
        ]),
        Line::from(vec![
            Span::styled("  Avatar       ", colors.text_muted()),
            Span::styled(avatar, colors.text_dim()),
        ]),
    ];
    if let Some(bio) = &profile.bio {
        identity.push(Line::styled(format!("  {bio}"), colors.text_dim()));
    }
    frame.render_widget(
        Paragraph::new(identity).block(panel(&colors, " Profile ", false)),
        rows[0],
    );

    let stat_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[1]);
    let stats = [
        ("📚 Total Books", state.profile_stats.map(|s| s.total_books)),
        ("✅ Exchanges Completed", state.profile_stats.map(|s| s.exchanges_completed)),
        ("⏳ Pending Requests", state.profile_stats.map(|s| s.pending_requests)),
    ];
    for ((label, value), area) in stats.into_iter().zip(stat_cols.iter()) {
        let value = value.map_or_else(|| spinner(state).to_string(), |v| v.to_string());
        let card = Paragraph::new(vec![
            Line::styled(value, colors.text_primary().add_modifier(Modifier::BOLD)),
            Line::styled(label, colors.text_muted()),
        ])
        .alignment(Alignment::Center)
        .block(panel(&colors, "", false));
        frame.render_widget(card, *area);
    }

    let editing = state.mode == Mode::ProfileEdit;
    let form = &state.profile_form;
    let field = |label: &str, value: &str, focused: bool| -> Vec<Line<'static>> {
        let focused = editing && focused;
        vec![
            Line::styled(
                format!("  {label}"),
                if focused {
                    colors.text_primary()
                } else {
                    colors.text_muted()
                },
            ),
            Line::from(vec![
                Span::styled(if focused { "  ▸ " } else { "    " }, colors.text_primary()),
                Span::styled(value.to_string(), colors.text()),
                Span::styled(if focused { "▏" } else { "" }, colors.text_primary()),
            ]),
            Line::from(""),
        ]
    };
    let mut lines = vec![Line::from("")];
    lines.extend(field("Username *", &form.username, !form.avatar_focused));
    lines.extend(field("Avatar URL", &form.avatar_url, form.avatar_focused));
    lines.push(if editing {
        Line::from(vec![
            Span::styled("  [Enter]", colors.key_hint()),
            Span::styled(" Save  ", colors.text_muted()),
            Span::styled("[Esc]", colors.key_hint()),
            Span::styled(" Cancel", colors.text_muted()),
        ])
    } else {
        Line::from(vec![
            Span::styled("  [e]", colors.key_hint()),
            Span::styled(" Edit profile", colors.text_muted()),
        ])
    });
    frame.render_widget(
        Paragraph::new(lines).block(panel(&colors, " Edit Profile ", editing)),
        rows[2],
    );
}

fn status_style(colors: &ThemeColors, status: &str) -> Style {
    if status.starts_with('✓') {
        colors.text_success()
    } else if status.starts_with('❌') {
        colors.text_error()
    } else {
        colors.text_secondary()
    }
}

fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(34)])
        .split(area);

    let loading_indicator = if state.loading {
        format!("{} ", spinner(state))
    } else {
        String::new()
    };

    let content = if state.status.is_empty() {
        vec![
            Span::styled(" ", Style::default()),
            Span::styled(loading_indicator, colors.text_secondary()),
            Span::styled("Tab", colors.key_hint()),
            Span::styled(": views  ", colors.text_muted()),
            Span::styled("?", colors.key_hint()),
            Span::styled(": help  ", colors.text_muted()),
            Span::styled("t", colors.key_hint()),
            Span::styled(": theme  ", colors.text_muted()),
            Span::styled("q", colors.key_hint()),
            Span::styled(": quit", colors.text_muted()),
        ]
    } else {
        vec![
            Span::styled(" ", Style::default()),
            Span::styled(loading_indicator, colors.text_secondary()),
            Span::styled(state.status.clone(), status_style(&colors, &state.status)),
        ]
    };

    let status =
        Paragraph::new(Line::from(content)).style(Style::default().bg(colors.bg_secondary));
    frame.render_widget(status, cols[0]);

    let footer = Paragraph::new(Line::styled(
        format!("{ICON} BookSwap v{} ", crate::VERSION),
        colors.text_muted(),
    ))
    .alignment(Alignment::Right)
    .style(Style::default().bg(colors.bg_secondary));
    frame.render_widget(footer, cols[1]);
}

fn help_section<'a>(colors: &ThemeColors, title: &'a str, keys: &[(&'a str, &'a str)]) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(vec![Span::styled(
        format!("  {title}"),
        colors.text_primary().add_modifier(Modifier::BOLD),
    )])];
    for (key, action) in keys {
        lines.push(Line::from(vec![
            Span::styled(format!("  {key:<17}"), colors.key_hint()),
            Span::styled(*action, colors.text()),
        ]));
    }
    lines.push(Line::from(""));
    lines
}

fn render_help_popup(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(50, 70, frame.area());

    // First render a solid background block to cover everything underneath
    let bg_block = Block::default().style(Style::default().bg(colors.bg_secondary));
    frame.render_widget(Clear, popup_area);
    frame.render_widget(bg_block, popup_area);

    let mut help_content = vec![Line::from("")];
    help_content.extend(help_section(
        &colors,
        "Navigation",
        &[
            ("Tab / Shift+Tab", "Next / previous view"),
            ("1-4", "Jump to a view"),
            ("j/k or ↑/↓", "Move selection"),
            ("s / S", "Sign in / sign out"),
        ],
    ));
    help_content.extend(help_section(
        &colors,
        "Browse Books",
        &[
            ("/", "Search title or author"),
            ("f / F", "Next / previous genre"),
            ("Esc", "Clear filters"),
            ("Enter", "Request exchange"),
            ("r", "Reload"),
        ],
    ));
    help_content.extend(help_section(
        &colors,
        "My Books",
        &[("n", "Add a book"), ("e", "Edit selected"), ("d", "Delete selected")],
    ));
    help_content.extend(help_section(
        &colors,
        "Matches",
        &[("a", "Accept request"), ("x", "Reject request")],
    ));
    help_content.extend(help_section(
        &colors,
        "Sign In",
        &[("Tab", "Next field"), ("F2", "Switch sign in / sign up"), ("Enter", "Submit")],
    ));
    help_content.extend(help_section(
        &colors,
        "General",
        &[
            ("e", "Edit profile (Profile view)"),
            ("t", "Open theme selector"),
            ("?", "Toggle this help"),
            ("q / Ctrl+c", "Quit application"),
        ],
    ));
    help_content.push(Line::from(vec![
        Span::styled("  Press ", colors.text_muted()),
        Span::styled("Esc", colors.key_hint()),
        Span::styled(" or ", colors.text_muted()),
        Span::styled("?", colors.key_hint()),
        Span::styled(" to close", colors.text_muted()),
    ]));

    let help = Paragraph::new(help_content)
        .block(
            panel(&colors, " ⌨ Keyboard Shortcuts ", true)
                .style(Style::default().bg(colors.bg_secondary)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help, popup_area);
}

fn render_theme_picker(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(50, 70, frame.area());

    let bg_block = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(Clear, popup_area);
    frame.render_widget(bg_block, popup_area);

    let themes = Theme::all();
    let items: Vec<ListItem> = themes
        .iter()
        .enumerate()
        .map(|(i, theme_name)| {
            let palette = theme_name.palette();
            let selected = i == state.theme_picker_index;

            let preview = format!(
                "  {} {} ",
                if selected { "▸" } else { " " },
                theme_name.display_name()
            );

            let style = if selected {
                Style::default()
                    .fg(palette.accent)
                    .bg(palette.selection)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.fg).bg(colors.bg)
            };

            ListItem::new(Line::from(vec![
                Span::styled(preview, style),
                Span::styled("█", Style::default().fg(palette.accent).bg(colors.bg)),
                Span::styled("█", Style::default().fg(palette.secondary).bg(colors.bg)),
                Span::styled("█", Style::default().fg(palette.success).bg(colors.bg)),
                Span::styled("█", Style::default().fg(palette.warning).bg(colors.bg)),
            ]))
        })
        .collect();

    let theme_list = List::new(items)
        .style(Style::default().bg(colors.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.primary))
                .border_type(BorderType::Rounded)
                .style(Style::default().bg(colors.bg))
                .title(format!(
                    " 🎨 Select Theme ({}/{}) ",
                    state.theme_picker_index + 1,
                    themes.len()
                ))
                .title_bottom(Line::from(" ↑↓ navigate │ ↵ apply │ Esc cancel ").centered()),
        );

    let mut list_state = ListState::default().with_selected(Some(state.theme_picker_index));
    frame.render_stateful_widget(theme_list, popup_area, &mut list_state);
}

/// Helper function to create a centered rect
const fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_width = r.width * percent_x / 100;
    let popup_height = r.height * percent_y / 100;
    Rect {
        x: r.x + (r.width.saturating_sub(popup_width)) / 2,
        y: r.y + (r.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{BookCondition, NewBook, Profile};
    use crate::pages::books::BooksView;
    use ratatui::{Terminal, backend::TestBackend};
    use uuid::Uuid;

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(frame, state)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    fn signed_in() -> AppState {
        let mut state = AppState::new(Config::default());
        state.session_loading = false;
        state.signed_in(Profile::new(Uuid::new_v4(), "alice"));
        state
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("The Left Hand of Darkness", 8), "The Lef…");
    }

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(r, Rect::new(25, 10, 50, 20));
    }

    #[test]
    fn test_loading_shows_only_spinner() {
        let state = AppState::new(Config::default());
        let screen = draw(&state);
        assert!(screen.contains("Loading..."));
        assert!(!screen.contains("Exchange Books"));
    }

    #[test]
    fn test_books_view_renders_count_and_cards() {
        let mut state = signed_in();
        let owner = Uuid::new_v4();
        let books = ["Dune", "Emma"]
            .iter()
            .map(|t| NewBook::new(owner, t, "Someone", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4()))
            .collect();
        state.books = BooksView::new(books);

        let screen = draw(&state);
        assert!(screen.contains("2 books available"));
        assert!(screen.contains("Dune"));
        assert!(screen.contains("Request Exchange"));
        assert!(screen.contains("alice"));
    }
}
