use std::io::Write;

use super::{Pagination, StatusTone, View};
use crate::client::{RepoDetail, RepoSummary, format_count};

/// Plain-text [`View`] writing to stdout
///
/// Cards are numbered from 1 so the interactive CLI can refer to them.
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    pub fn new() -> Self {
        Self
    }

    /// Text block for one result card
    pub fn format_card(index: usize, repo: &RepoSummary) -> String {
        let title = if repo.full_name.is_empty() {
            repo.name.as_str()
        } else {
            repo.full_name.as_str()
        };
        format!(
            "[{}] {}\n    ★ {} · {}\n    {}",
            index,
            title,
            format_count(repo.stargazers_count),
            repo.language_or_default(),
            repo.description_or_default()
        )
    }

    /// Text block for the detail view
    pub fn format_detail(detail: &RepoDetail) -> String {
        let repo = &detail.repo;
        let mut lines = vec![
            format!("== {} ==", detail.title()),
            format!("Owner:    {}", repo.owner.login),
            format!("Language: {}", repo.language_or_default()),
            format!("Stars:    {}", format_count(repo.stargazers_count)),
        ];
        if let Some(avatar) = &repo.owner.avatar_url {
            lines.push(format!("Avatar:   {}", avatar));
        }
        if let Some(url) = &repo.html_url {
            lines.push(format!("URL:      {}", url));
        }
        lines.push(String::new());
        lines.push(repo.description_or_default().to_string());
        if !detail.topics.is_empty() {
            lines.push(String::new());
            lines.push(format!("Topics: {}", detail.topics.join(", ")));
        }
        lines.join("\n")
    }
}

impl View for TerminalView {
    fn set_status(&self, text: &str, tone: StatusTone, _busy: bool) {
        match tone {
            StatusTone::Error => eprintln!("! {}", text),
            StatusTone::Muted => println!("({})", text),
            StatusTone::Neutral => println!("{}", text),
        }
        let _ = std::io::stdout().flush();
    }

    fn clear_cards(&self) {}

    fn render_skeletons(&self, _count: usize) {}

    fn render_cards(&self, repos: &[RepoSummary]) {
        for (i, repo) in repos.iter().enumerate() {
            println!("{}", Self::format_card(i + 1, repo));
        }
    }

    fn update_pagination(&self, pagination: Pagination) {
        let prev = if pagination.prev_enabled { "[:p]rev" } else { "     " };
        let next = if pagination.next_enabled { "[:n]ext" } else { "" };
        println!(
            "{}  Page {} of {}  {}",
            prev, pagination.page, pagination.total_pages, next
        );
    }

    fn open_modal(&self, detail: &RepoDetail) {
        println!("{}", Self::format_detail(detail));
    }
}
