use crate::mirror::MirrorEntry;

/// Which entries the list view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    Active,
    All,
    Completed,
}

impl Filter {
    pub fn matches(self, entry: &MirrorEntry) -> bool {
        match self {
            Filter::Active => !entry.completed,
            Filter::All => true,
            Filter::Completed => entry.completed,
        }
    }
}

/// Visible subset of the mirror plus the open-item counter.
#[derive(Debug)]
pub struct View<'a> {
    pub visible: Vec<&'a MirrorEntry>,
    /// Entries with `completed == false`, regardless of the filter.
    pub active_count: usize,
}

impl View<'_> {
    pub fn items_left_label(&self) -> String {
        format!("{} active item(s) left", self.active_count)
    }
}

pub fn project(entries: &[MirrorEntry], filter: Filter) -> View<'_> {
    View {
        visible: entries.iter().filter(|e| filter.matches(e)).collect(),
        active_count: entries.iter().filter(|e| !e.completed).count(),
    }
}
