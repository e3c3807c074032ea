use crate::constants::{COMMENT_CLASS, NOWRAP_CLASS};
use crate::models::{Field, FieldValue, Link, ReplayRecord};

const DEFAULT_COLUMNS: [Field; 9] = [
    Field::User,
    Field::Game,
    Field::Difficulty,
    Field::Shot,
    Field::Route,
    Field::Score,
    Field::UploadDate,
    Field::Comment,
    Field::Replay,
];

#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Link(Link),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub field: Field,
    pub content: CellContent,
    pub class: Option<&'static str>,
}

impl Cell {
    pub fn text(&self) -> &str {
        match &self.content {
            CellContent::Text(text) => text,
            CellContent::Link(link) => &link.text,
        }
    }
}

/// Which fields become table columns on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPolicy {
    displayed: Vec<Field>,
    show_game_column: bool,
    show_route_column: bool,
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ColumnPolicy {
    pub fn new(show_game_column: bool, show_route_column: bool) -> Self {
        Self {
            displayed: DEFAULT_COLUMNS.to_vec(),
            show_game_column,
            show_route_column,
        }
    }

    pub fn with_displayed(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.displayed = fields.into_iter().collect();
        self
    }

    pub fn show_game_column(&self) -> bool {
        self.show_game_column
    }

    pub fn show_route_column(&self) -> bool {
        self.show_route_column
    }

    pub fn is_visible(&self, field: Field) -> bool {
        if !self.displayed.contains(&field) {
            return false;
        }
        match field {
            Field::Game => self.show_game_column,
            Field::Route => self.show_route_column,
            _ => true,
        }
    }

    /// Visible columns in schema order, regardless of allow-list order.
    pub fn visible_columns(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL
            .into_iter()
            .filter(move |field| self.is_visible(*field))
    }

    pub fn cells(&self, record: &ReplayRecord) -> Vec<Cell> {
        self.visible_columns()
            .map(|field| Cell {
                field,
                content: cell_content(record.get(field)),
                class: cell_class(field),
            })
            .collect()
    }
}

fn cell_content(value: Option<&FieldValue>) -> CellContent {
    match value {
        Some(FieldValue::Link(link)) => CellContent::Link(link.clone()),
        Some(other) => CellContent::Text(other.filter_key().into_owned()),
        None => CellContent::Text(String::new()),
    }
}

fn cell_class(field: Field) -> Option<&'static str> {
    match field {
        Field::Shot | Field::Route | Field::Score => Some(NOWRAP_CLASS),
        Field::Comment => Some(COMMENT_CLASS),
        _ => None,
    }
}
