//! TUI rendering for retreat-core types.
//!
//! Extension traits that add colored terminal rendering using owo_colors.

use owo_colors::OwoColorize;
use retreat_core::kanban::{Board, Card, Column};
use retreat_core::schedule::{Activity, Day};
use retreat_core::supplies::{DEFAULT_CHECKLIST, Supplies};
use retreat_core::sync::SyncOutcome;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Activity {
    fn render(&self) -> String {
        format!(
            "{}  {} {}",
            self.time.dimmed(),
            self.title,
            format!("({} min, energy {})", self.duration, self.energy).dimmed()
        )
    }
}

impl Render for Day {
    fn render(&self) -> String {
        let mut lines = vec![format!("{} - {}", self.day.bold(), self.title)];
        for activity in &self.activities {
            lines.push(format!("   {}", activity.render()));
        }
        lines.join("\n")
    }
}

impl Render for Card {
    fn render(&self) -> String {
        let mut line = format!("   [{}] {}", self.id.dimmed(), self.title);
        if !self.description.is_empty() {
            line.push_str(&format!("\n        {}", self.description.dimmed()));
        }
        line
    }
}

impl Render for SyncOutcome {
    fn render(&self) -> String {
        match self {
            SyncOutcome::Pulled => "pulled".yellow().to_string(),
            SyncOutcome::Pushed => "pushed".green().to_string(),
            SyncOutcome::Empty => "empty".dimmed().to_string(),
        }
    }
}

pub fn render_board(board: &Board) -> String {
    let mut lines = Vec::new();
    for column in Column::ALL {
        let cards = board.column(column);
        let header = format!("{} ({})", column.title(), cards.len());
        let header = match column {
            Column::Ready => header.green().bold().to_string(),
            _ => header.bold().to_string(),
        };
        lines.push(header);
        if cards.is_empty() {
            lines.push("   (empty)".dimmed().to_string());
        }
        for card in cards {
            lines.push(card.render());
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn render_checklist(supplies: &Supplies) -> String {
    let mut lines = Vec::new();
    let mut total = 0;

    for (cat_index, category) in DEFAULT_CHECKLIST.iter().enumerate() {
        lines.push(category.name.bold().to_string());
        for (item_index, item) in category.items.iter().enumerate() {
            let key = Supplies::default_key(cat_index, item_index);
            lines.push(render_item(supplies, &key, item));
            total += 1;
        }

        // Custom items render under their category.
        for supply in supplies.custom.iter().filter(|s| s.category == category.name) {
            let key = Supplies::custom_key(supply.id);
            lines.push(format!(
                "{} {}",
                render_item(supplies, &key, &supply.item),
                format!("[{}]", supply.id).dimmed()
            ));
            total += 1;
        }
        lines.push(String::new());
    }

    // Custom items in categories of their own.
    let known: Vec<&str> = DEFAULT_CHECKLIST.iter().map(|c| c.name).collect();
    let strays: Vec<_> = supplies
        .custom
        .iter()
        .filter(|s| !known.contains(&s.category.as_str()))
        .collect();
    if !strays.is_empty() {
        for supply in strays {
            let key = Supplies::custom_key(supply.id);
            lines.push(format!(
                "{} {} {}",
                render_item(supplies, &key, &supply.item),
                format!("({})", supply.category).dimmed(),
                format!("[{}]", supply.id).dimmed()
            ));
            total += 1;
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Packed: {}%",
        supplies.progress(total).to_string().green().bold()
    ));
    lines.join("\n")
}

fn render_item(supplies: &Supplies, key: &str, label: &str) -> String {
    if supplies.is_checked(key) {
        format!("   [{}] {}  {}", "x".green(), label.strikethrough(), key.dimmed())
    } else {
        format!("   [ ] {}  {}", label, key.dimmed())
    }
}
